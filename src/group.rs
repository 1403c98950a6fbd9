//! Connected-component grouping of splice patterns.
//!
//! Two patterns are linked whenever they appear in the pattern list of the
//! same exon. Groups are the connected components of that graph: patterns
//! share a group when they share an exon directly or through a chain of other
//! patterns.

use std::collections::{HashMap, HashSet};

use crate::record::{ExonRecord, ExonSet};

/// A node of the co-occurrence graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplicePattern {
    name: String,
    neighbors: Vec<usize>,
    group_id: Option<usize>,
}

impl SplicePattern {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            neighbors: Vec::new(),
            group_id: None,
        }
    }

    /// Pattern name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node indices of the patterns sharing an exon with this one.
    #[inline]
    pub fn neighbors(&self) -> &[usize] {
        &self.neighbors
    }

    /// Group id, once [`Grouper::visit`] has run.
    #[inline]
    pub fn group_id(&self) -> Option<usize> {
        self.group_id
    }
}

/// Builds the co-occurrence graph and labels its connected components.
///
/// # Example
///
/// ```
/// use exonwalk::group::Grouper;
///
/// let mut grouper = Grouper::new();
/// grouper.add_names(&["A", "B"]);
/// grouper.add_names(&["B", "C"]);
/// grouper.add_names(&["D"]);
///
/// let groups = grouper.into_groups();
/// assert_eq!(groups.len(), 2);
/// assert!(groups.lookup().same_group("A", "C"));
/// assert!(!groups.lookup().same_group("A", "D"));
/// ```
#[derive(Debug, Default)]
pub struct Grouper {
    nodes: Vec<SplicePattern>,
    index: HashMap<String, usize>,
    edges: HashSet<(usize, usize)>,
}

impl Grouper {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph from every record carrying all basic fields.
    pub fn from_exons(exons: &ExonSet) -> Self {
        let mut grouper = Self::new();
        for record in exons {
            grouper.add_record(record);
        }
        grouper
    }

    /// Number of distinct pattern names seen so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no pattern was seen yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in order of first mention.
    pub fn nodes(&self) -> &[SplicePattern] {
        &self.nodes
    }

    /// Links the patterns of one exon record.
    ///
    /// Records missing any basic field do not contribute.
    pub fn add_record(&mut self, record: &ExonRecord) {
        if !record.has_basic_fields() {
            return;
        }

        let names: Vec<&str> = record.names().collect();
        self.add_names(&names);
    }

    /// Links every pair of names that share one exon.
    ///
    /// A single name still creates its node.
    pub fn add_names(&mut self, names: &[&str]) {
        let ids: Vec<usize> = names.iter().map(|name| self.node(name)).collect();

        let len = ids.len();
        for i in 0..len.saturating_sub(1) {
            for j in 0..len {
                self.relate(ids[i], ids[j]);
            }
        }
    }

    /// Returns the node index for `name`, creating the node on first mention.
    fn node(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }

        let idx = self.nodes.len();
        self.nodes.push(SplicePattern::new(name));
        self.index.insert(name.to_string(), idx);
        idx
    }

    /// Adds a symmetric edge between two nodes.
    fn relate(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }

        if self.edges.insert((a, b)) {
            self.nodes[a].neighbors.push(b);
        }
        if self.edges.insert((b, a)) {
            self.nodes[b].neighbors.push(a);
        }
    }

    /// Assigns group ids and calls `f` once per node with its group id.
    ///
    /// Nodes are taken as traversal roots in creation order; each unlabeled
    /// root opens a fresh id, and every node reachable from it receives that
    /// id in depth-first pre-order. Returns the number of groups.
    pub fn visit<F>(&mut self, mut f: F) -> usize
    where
        F: FnMut(&SplicePattern, usize),
    {
        let mut next_id = 0usize;
        let mut stack = Vec::new();

        for root in 0..self.nodes.len() {
            if self.nodes[root].group_id.is_some() {
                continue;
            }

            let gid = next_id;
            next_id += 1;

            stack.push(root);
            while let Some(idx) = stack.pop() {
                if self.nodes[idx].group_id.is_some() {
                    continue;
                }

                self.nodes[idx].group_id = Some(gid);
                f(&self.nodes[idx], gid);

                for &neighbor in self.nodes[idx].neighbors.iter().rev() {
                    if self.nodes[neighbor].group_id.is_none() {
                        stack.push(neighbor);
                    }
                }
            }
        }

        next_id
    }

    /// Labels the graph and collects its groups.
    pub fn into_groups(mut self) -> Groups {
        let mut members: Vec<Vec<String>> = Vec::new();
        let mut ids = HashMap::with_capacity(self.nodes.len());

        self.visit(|node, gid| {
            if members.len() <= gid {
                members.resize_with(gid + 1, Vec::new);
            }
            members[gid].push(node.name.clone());
            ids.insert(node.name.clone(), gid);
        });

        let groups = members
            .into_iter()
            .enumerate()
            .map(|(id, names)| Group { id, names })
            .collect();

        Groups {
            groups,
            lookup: GroupLookup { ids },
        }
    }
}

/// Names sharing one group id, in visit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Group id, 0-based in visit order.
    pub id: usize,
    /// Member names in visit order.
    pub names: Vec<String>,
}

impl Group {
    /// Number of names in the group.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if the group has no names.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of unordered pairs of distinct names in this group.
    pub fn pair_count(&self) -> usize {
        self.names.len() * self.names.len().saturating_sub(1) / 2
    }
}

/// Same-group membership test over unordered name pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupLookup {
    ids: HashMap<String, usize>,
}

impl GroupLookup {
    /// Group id of `name`, if the name was ever seen.
    #[inline]
    pub fn group_of(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    /// Returns `true` if both names are known and share a group.
    ///
    /// Symmetric in its arguments.
    pub fn same_group(&self, a: &str, b: &str) -> bool {
        match (self.group_of(a), self.group_of(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Number of names with a group.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if no name has a group.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Result of grouping: the groups in id order plus their lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Groups {
    groups: Vec<Group>,
    lookup: GroupLookup,
}

impl Groups {
    /// Groups the patterns of every record carrying all basic fields.
    pub fn from_exons(exons: &ExonSet) -> Self {
        Grouper::from_exons(exons).into_groups()
    }

    /// Number of groups.
    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if there are no groups.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterates over the groups in id order.
    pub fn iter(&self) -> std::slice::Iter<'_, Group> {
        self.groups.iter()
    }

    /// Groups in id order.
    pub fn as_slice(&self) -> &[Group] {
        &self.groups
    }

    /// Group with the given id.
    pub fn get(&self, id: usize) -> Option<&Group> {
        self.groups.get(id)
    }

    /// Name to group id lookup.
    #[inline]
    pub fn lookup(&self) -> &GroupLookup {
        &self.lookup
    }

    /// Splits into the group list and the lookup.
    pub fn into_parts(self) -> (Vec<Group>, GroupLookup) {
        (self.groups, self.lookup)
    }

    /// Number of same-group pairs of distinct names, over all groups.
    pub fn pair_count(&self) -> usize {
        self.groups.iter().map(Group::pair_count).sum()
    }
}

impl<'a> IntoIterator for &'a Groups {
    type Item = &'a Group;
    type IntoIter = std::slice::Iter<'a, Group>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relate_is_symmetric_and_deduplicated() {
        let mut grouper = Grouper::new();
        grouper.add_names(&["A", "B"]);
        grouper.add_names(&["B", "A"]);

        let nodes = grouper.nodes();
        assert_eq!(nodes[0].neighbors(), &[1]);
        assert_eq!(nodes[1].neighbors(), &[0]);
    }

    #[test]
    fn visit_labels_in_depth_first_pre_order() {
        let mut grouper = Grouper::new();
        grouper.add_names(&["A", "B", "C"]);
        grouper.add_names(&["B", "D"]);

        let mut order = Vec::new();
        let count = grouper.visit(|node, gid| order.push((node.name().to_string(), gid)));

        assert_eq!(count, 1);
        let names: Vec<_> = order.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D"]);
        assert!(order.iter().all(|(_, gid)| *gid == 0));
    }

    #[test]
    fn visit_labels_each_node_once() {
        let mut grouper = Grouper::new();
        grouper.add_names(&["A", "B", "C"]);
        grouper.add_names(&["C", "A"]);
        grouper.add_names(&["E"]);

        let mut seen = Vec::new();
        grouper.visit(|node, _| seen.push(node.name().to_string()));
        seen.sort();
        assert_eq!(seen, vec!["A", "B", "C", "E"]);

        // labels are final
        let mut again = 0;
        grouper.visit(|_, _| again += 1);
        assert_eq!(again, 0);
    }
}
