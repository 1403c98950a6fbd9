//! Discovery of adjacent splice pattern relations.
//!
//! Starting from every exon where a pattern begins, the walk follows the
//! exons downstream (in transcription direction) until that pattern ends.
//! Every other pattern met on the way, and not already in the same group, is
//! adjacent to the starting pattern.

use std::collections::{HashMap, HashSet};

use crate::group::GroupLookup;
use crate::pattern::canonical_pair;
use crate::record::ExonSet;

/// An unordered pair of pattern names, stored sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relation {
    /// Lexicographically smaller name.
    pub first: String,
    /// Lexicographically larger name.
    pub second: String,
}

impl Relation {
    /// Builds the canonical form of the pair `(a, b)`.
    pub fn new(a: &str, b: &str) -> Self {
        let (first, second) = canonical_pair(a, b);
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }
}

/// Known relations, in order of discovery.
///
/// # Example
///
/// ```
/// use exonwalk::relation::RelationSet;
///
/// let mut rels = RelationSet::new();
/// assert!(rels.insert("b", "a"));
/// assert!(!rels.insert("a", "b"));
/// assert!(rels.contains("a", "b"));
/// assert!(rels.contains("b", "a"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationSet {
    pairs: Vec<Relation>,
    index: HashMap<String, HashSet<String>>,
}

impl RelationSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pair, returning `false` if it was already known.
    pub fn insert(&mut self, a: &str, b: &str) -> bool {
        if self.contains(a, b) {
            return false;
        }

        let relation = Relation::new(a, b);
        self.index
            .entry(relation.first.clone())
            .or_default()
            .insert(relation.second.clone());
        self.pairs.push(relation);
        true
    }

    /// Returns `true` if the unordered pair is known.
    pub fn contains(&self, a: &str, b: &str) -> bool {
        let (first, second) = canonical_pair(a, b);
        self.index
            .get(first)
            .is_some_and(|partners| partners.contains(second))
    }

    /// Number of distinct pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if no pair is known.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates over the pairs in discovery order.
    pub fn iter(&self) -> std::slice::Iter<'_, Relation> {
        self.pairs.iter()
    }

    /// Pairs in discovery order.
    pub fn as_slice(&self) -> &[Relation] {
        &self.pairs
    }
}

impl<'a> IntoIterator for &'a RelationSet {
    type Item = &'a Relation;
    type IntoIter = std::slice::Iter<'a, Relation>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for RelationSet {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (a, b) in iter {
            set.insert(a, b);
        }
        set
    }
}

/// Calls `emit(seed, other)` for every candidate relation, repeats included.
///
/// For each record with a nonzero first-exon count, every pattern starting
/// there is walked in strand direction. Records missing basic fields or lying
/// on the other strand are stepped over, and so is a record without patterns.
/// The walk ends when the seed pattern terminates or the records run out.
pub fn for_each_candidate<F>(exons: &ExonSet, groups: &GroupLookup, mut emit: F)
where
    F: FnMut(&str, &str),
{
    for (k, record) in exons.iter().enumerate() {
        if record.first_count == 0 {
            continue;
        }

        let strand = record.strand;
        let delta = strand.step();

        for name in record.start_names() {
            let mut current = k;
            while let Some(next) = exons.offset(current, delta) {
                current = next;

                let exon = &exons[current];
                if !exon.has_basic_fields() || exon.strand != strand {
                    continue;
                }

                if exon.terminates(name) {
                    break;
                }

                for other in exon.names() {
                    if other != name && !groups.same_group(name, other) {
                        emit(name, other);
                    }
                }
            }
        }
    }
}

/// Collects the distinct adjacent relations of `exons`.
///
/// Pairs already grouped together are never reported.
pub fn extract_relations(exons: &ExonSet, groups: &GroupLookup) -> RelationSet {
    let mut relations = RelationSet::new();
    let mut candidates = 0usize;

    for_each_candidate(exons, groups, |seed, other| {
        candidates += 1;
        relations.insert(seed, other);
    });

    log::debug!(
        "{} relation candidates, {} distinct",
        candidates,
        relations.len()
    );

    relations
}
