use std::collections::BTreeSet;

use exonwalk::group::{Grouper, Groups};
use exonwalk::{ExonSet, Reader};

fn exons(table: &str) -> ExonSet {
    Reader::from_reader(std::io::Cursor::new(table.to_string()))
        .unwrap()
        .read_exons()
        .unwrap()
}

fn line(id: &str, patterns: &str) -> String {
    format!("chr1\t100\t200\t+\t{id}\t1\t0\t0\t0\t{patterns}\t*\n")
}

fn partition(groups: &Groups) -> BTreeSet<BTreeSet<String>> {
    groups
        .iter()
        .map(|group| group.names.iter().cloned().collect())
        .collect()
}

#[test]
fn test_cooccurring_names_share_a_group() {
    let table = line("e1", "A[1/2],B[1/3]") + &line("e2", "C[1/1]");
    let groups = Groups::from_exons(&exons(&table));

    let lookup = groups.lookup();
    assert_eq!(lookup.group_of("A"), lookup.group_of("B"));
    assert!(lookup.same_group("B", "A"));
    assert!(!lookup.same_group("A", "C"));
    assert!(!lookup.same_group("A", "unknown"));
}

#[test]
fn test_groups_are_transitively_closed() {
    let table = line("e1", "A[1/2],B[1/2]") + &line("e2", "B[2/2],C[1/1]") + &line("e3", "D[1/1]");
    let groups = Groups::from_exons(&exons(&table));

    assert_eq!(groups.len(), 2);
    assert!(groups.lookup().same_group("A", "C"));
    assert_eq!(groups.as_slice()[0].names, vec!["A", "B", "C"]);
    assert_eq!(groups.as_slice()[1].names, vec!["D"]);
    assert_eq!(groups.pair_count(), 3);
}

#[test]
fn test_every_name_gets_exactly_one_group() {
    let table = line("e1", "A[1/2],B[1/2]")
        + &line("e2", "C[1/2]")
        + &line("e3", "B[2/2],C[2/2],D[1/1]")
        + &line("e4", "E[1/1],F[1/1]");
    let groups = Groups::from_exons(&exons(&table));

    let mut names: Vec<_> = groups.iter().flat_map(|g| g.names.iter()).collect();
    let total = names.len();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), total);
    assert_eq!(total, 6);
    assert_eq!(groups.lookup().len(), 6);
}

#[test]
fn test_regrouping_is_idempotent() {
    let rows = [
        line("e1", "A[1/2],B[1/2]"),
        line("e2", "C[1/1]"),
        line("e3", "B[2/2],D[1/1]"),
        line("e4", "E[1/2]"),
        line("e5", "E[2/2],C[1/1]"),
    ];
    let forward: String = rows.concat();
    let backward: String = rows.iter().rev().cloned().collect();

    let first = Groups::from_exons(&exons(&forward));
    let second = Groups::from_exons(&exons(&forward));
    let reversed = Groups::from_exons(&exons(&backward));

    assert_eq!(first, second);
    assert_eq!(partition(&first), partition(&reversed));
}

#[test]
fn test_single_name_record_is_a_singleton() {
    let groups = Groups::from_exons(&exons(&line("e1", "solo[1/1]")));
    assert_eq!(groups.len(), 1);
    assert_eq!(groups.as_slice()[0].names, vec!["solo"]);
    assert_eq!(groups.pair_count(), 0);
}

#[test]
fn test_records_without_protein_column_do_not_group() {
    let table = "chr1\t100\t200\t+\te1\t1\t0\t0\t0\tA[1/2],B[1/2]\n".to_string() + &line("e2", "C[1/1]");
    let groups = Groups::from_exons(&exons(&table));

    assert_eq!(groups.len(), 1);
    assert_eq!(groups.lookup().group_of("A"), None);
}

#[test]
fn test_names_without_position_still_group() {
    let groups = Groups::from_exons(&exons(&line("e1", "A,B[oops]")));
    assert!(groups.lookup().same_group("A", "B"));
}

#[test]
fn test_visit_callback_sees_each_node_once() {
    let mut grouper = Grouper::new();
    grouper.add_names(&["A", "B"]);
    grouper.add_names(&["C"]);
    grouper.add_names(&["C", "D", "B"]);
    grouper.add_names(&["E"]);

    let mut visits = Vec::new();
    let count = grouper.visit(|node, gid| visits.push((node.name().to_string(), gid)));

    assert_eq!(count, 2);
    assert_eq!(visits.len(), 5);
    assert_eq!(
        visits,
        vec![
            ("A".to_string(), 0),
            ("B".to_string(), 0),
            ("C".to_string(), 0),
            ("D".to_string(), 0),
            ("E".to_string(), 1),
        ]
    );
    assert!(grouper.nodes().iter().all(|n| n.group_id().is_some()));
}
