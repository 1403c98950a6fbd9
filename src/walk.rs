//! Directional exon walks over a converted annotation set.
//!
//! Every pattern starting at an exon seeds one walk. The walk visits the
//! following exons in transcription direction and records, per exon, what
//! that exon has to do with the seed pattern ([`ExonFlags`]). A second pass
//! ([`report`]) drops the exons already explained by group membership or by a
//! known relation and stops at the first unexplained termination.

use std::collections::HashMap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::group::GroupLookup;
use crate::record::ExonSet;
use crate::relation::RelationSet;
use crate::strand::Strand;

/// Walks stop at exons farther than this from the seed exon, in bases.
pub const MAX_DISTANCE: u64 = 2_800_000;

/// What one visited exon tells about the seed pattern.
///
/// # Example
///
/// ```
/// use exonwalk::walk::ExonFlags;
///
/// let flags = ExonFlags::SELF | ExonFlags::TERM | ExonFlags::SELFTERM;
/// assert_eq!(flags.bits(), 0x19);
/// assert!(flags.contains(ExonFlags::SELF));
/// assert!(!flags.contains(ExonFlags::GROUP));
/// assert_eq!(flags.to_string(), "25");
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ExonFlags(u8);

impl ExonFlags {
    /// No flag set.
    pub const NONE: ExonFlags = ExonFlags(0);
    /// The exon carries the seed pattern itself.
    pub const SELF: ExonFlags = ExonFlags(0x01);
    /// The exon carries a pattern of the seed's group.
    pub const GROUP: ExonFlags = ExonFlags(0x02);
    /// The exon carries a pattern with a known relation to the seed.
    pub const KNOWNSET: ExonFlags = ExonFlags(0x04);
    /// Some pattern ends at this exon.
    pub const TERM: ExonFlags = ExonFlags(0x08);
    /// The seed pattern ends at this exon.
    pub const SELFTERM: ExonFlags = ExonFlags(0x10);

    const NAMES: [(ExonFlags, &'static str); 5] = [
        (ExonFlags::SELF, "SELF"),
        (ExonFlags::GROUP, "GROUP"),
        (ExonFlags::KNOWNSET, "KNOWNSET"),
        (ExonFlags::TERM, "TERM"),
        (ExonFlags::SELFTERM, "SELFTERM"),
    ];

    /// Raw flag bits.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Builds flags from raw bits, ignoring unknown ones.
    #[inline]
    pub const fn from_bits_truncate(bits: u8) -> Self {
        ExonFlags(bits & 0x1f)
    }

    /// Returns `true` if every flag of `other` is set.
    #[inline]
    pub const fn contains(self, other: ExonFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Sets the flags of `other`.
    #[inline]
    pub fn insert(&mut self, other: ExonFlags) {
        self.0 |= other.0;
    }

    /// Returns `true` if no flag is set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the exon needs no report: it is covered by a known
    /// relation, or by the seed's group without carrying the seed itself.
    #[inline]
    pub const fn is_explained(self) -> bool {
        self.contains(ExonFlags::KNOWNSET)
            || (self.contains(ExonFlags::GROUP) && !self.contains(ExonFlags::SELF))
    }

    /// Returns `true` if a reported exon with these flags closes the report:
    /// the seed ends here, or another pattern ends here without the seed.
    #[inline]
    pub const fn ends_report(self) -> bool {
        self.contains(ExonFlags::SELFTERM)
            || (self.contains(ExonFlags::TERM) && !self.contains(ExonFlags::SELF))
    }
}

impl BitOr for ExonFlags {
    type Output = ExonFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        ExonFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ExonFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ExonFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ExonFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }

        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Order in which the flagged exons of a walk are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportOrder {
    /// Ascending record index, whatever the strand. This is the default.
    #[default]
    Index,
    /// The order the exons were walked in (descending index on `-`).
    Walk,
}

/// Tunables of the exon walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    max_distance: u64,
    report_order: ReportOrder,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_distance: MAX_DISTANCE,
            report_order: ReportOrder::default(),
        }
    }
}

impl WalkOptions {
    /// Default options: 2,800,000 bases, index order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum distance between the seed start and a walked exon end.
    pub fn max_distance(mut self, distance: u64) -> Self {
        self.max_distance = distance;
        self
    }

    /// Sets the report order.
    pub fn report_order(mut self, order: ReportOrder) -> Self {
        self.report_order = order;
        self
    }

    /// Maximum seed-to-exon distance, in bases.
    #[inline]
    pub fn distance_limit(&self) -> u64 {
        self.max_distance
    }

    /// Report order.
    #[inline]
    pub fn order(&self) -> ReportOrder {
        self.report_order
    }
}

/// Why a walk stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEnd {
    /// The seed pattern reached its last exon.
    SelfTerminated,
    /// No more records in the walk direction.
    OutOfRange,
    /// The next exon on the same chromosome and strand was too far away.
    DistanceExceeded {
        /// Index of the offending record (not part of the walk).
        index: usize,
        /// Distance from the seed start to that exon's end.
        distance: u64,
    },
}

/// The flagged path of one seed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedWalk {
    seed: String,
    exon_id: String,
    source: usize,
    strand: Strand,
    steps: Vec<(usize, ExonFlags)>,
    end: WalkEnd,
}

impl SeedWalk {
    /// Seed pattern name.
    #[inline]
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Identifier `<pattern>_<exonId>` of the walk.
    pub fn id(&self) -> String {
        format!("{}_{}", self.seed, self.exon_id)
    }

    /// Index of the exon the seed pattern starts at.
    #[inline]
    pub fn source(&self) -> usize {
        self.source
    }

    /// Strand of the seed exon.
    #[inline]
    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// Visited record indices with their flags, in walk order.
    #[inline]
    pub fn steps(&self) -> &[(usize, ExonFlags)] {
        &self.steps
    }

    /// Why the walk stopped.
    #[inline]
    pub fn end(&self) -> WalkEnd {
        self.end
    }

    /// Flags of the visited record `index`, if the walk reached it.
    pub fn flags_at(&self, index: usize) -> Option<ExonFlags> {
        self.steps
            .iter()
            .find(|(idx, _)| *idx == index)
            .map(|(_, flags)| *flags)
    }

    /// Steps in the requested report order.
    pub fn ordered_steps(&self, order: ReportOrder) -> Vec<(usize, ExonFlags)> {
        let mut steps = self.steps.clone();
        if order == ReportOrder::Index {
            steps.sort_unstable_by_key(|(idx, _)| *idx);
        }
        steps
    }
}

/// Walks one seed pattern starting at record `source`.
///
/// Records on another chromosome or strand are stepped over. The walk stops
/// when the records run out, when an exon ends more than the configured
/// distance away from the seed start (that exon is not recorded), or right
/// after the exon where the seed pattern terminates.
pub fn walk_seed(
    exons: &ExonSet,
    source: usize,
    name: &str,
    groups: &GroupLookup,
    relations: &RelationSet,
    options: &WalkOptions,
) -> SeedWalk {
    let seed = &exons[source];
    let delta = seed.strand.step();
    let mut steps = Vec::new();
    let mut current = source;

    let end = loop {
        let Some(next) = exons.offset(current, delta) else {
            let direction = if delta > 0 { "below" } else { "above" };
            log::warn!(
                "no more exons {} {} {} {}",
                direction,
                name,
                seed.exon_id,
                current as isize + delta
            );
            break WalkEnd::OutOfRange;
        };
        current = next;

        let exon = &exons[current];
        if exon.chrom != seed.chrom || exon.strand != seed.strand {
            continue;
        }

        let distance = seed.start.abs_diff(exon.end);
        if distance > options.max_distance {
            log::warn!(
                "exons must be within {} base distance: {} {} {} {}",
                options.max_distance,
                distance,
                name,
                seed.exon_id,
                current
            );
            break WalkEnd::DistanceExceeded {
                index: current,
                distance,
            };
        }

        let mut flags = ExonFlags::NONE;
        for token in exon.patterns.iter().filter(|token| token.is_terminal()) {
            flags |= ExonFlags::TERM;
            if token.name == name {
                flags |= ExonFlags::SELFTERM;
            }
        }

        if exon.contains(name) {
            flags |= ExonFlags::SELF;
            steps.push((current, flags));
            if flags.contains(ExonFlags::SELFTERM) {
                break WalkEnd::SelfTerminated;
            }
            continue;
        }

        for other in exon.names() {
            if groups.same_group(name, other) {
                flags |= ExonFlags::GROUP;
            }
            if relations.contains(name, other) {
                flags |= ExonFlags::KNOWNSET;
            }
        }
        steps.push((current, flags));
    };

    SeedWalk {
        seed: name.to_string(),
        exon_id: seed.exon_id.clone(),
        source,
        strand: seed.strand,
        steps,
        end,
    }
}

/// Every `(record index, pattern name)` seed of `exons`, in file order.
pub fn seeds(exons: &ExonSet) -> Vec<(usize, &str)> {
    exons
        .iter()
        .enumerate()
        .filter(|(_, record)| record.first_count != 0)
        .flat_map(|(idx, record)| record.start_names().map(move |name| (idx, name)))
        .collect()
}

/// Walks every seed of `exons`.
///
/// Walks sharing an id (same pattern, same exon id) collapse to the last one,
/// kept at the position of the first.
pub fn classify(
    exons: &ExonSet,
    groups: &GroupLookup,
    relations: &RelationSet,
    options: &WalkOptions,
) -> Vec<SeedWalk> {
    let seeds = seeds(exons);

    #[cfg(feature = "rayon")]
    let walks: Vec<SeedWalk> = seeds
        .par_iter()
        .map(|(source, name)| walk_seed(exons, *source, name, groups, relations, options))
        .collect();

    #[cfg(not(feature = "rayon"))]
    let walks: Vec<SeedWalk> = seeds
        .iter()
        .map(|(source, name)| walk_seed(exons, *source, name, groups, relations, options))
        .collect();

    let mut positions: HashMap<String, usize> = HashMap::with_capacity(walks.len());
    let mut unique: Vec<SeedWalk> = Vec::with_capacity(walks.len());
    for walk in walks {
        match positions.get(&walk.id()) {
            Some(&pos) => unique[pos] = walk,
            None => {
                positions.insert(walk.id(), unique.len());
                unique.push(walk);
            }
        }
    }

    unique
}

/// One unexplained exon of a seed walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExonReport {
    /// Chromosome name.
    pub chrom: String,
    /// Start coordinate.
    pub start: u64,
    /// End coordinate.
    pub end: u64,
    /// Strand column as written in the input.
    pub strand: String,
    /// Exon identifier.
    pub exon_id: String,
    /// Walk identifier, `<pattern>_<exonId>` of the seed exon.
    pub seed_id: String,
    /// 1-based rank of this exon among the reported exons of the walk.
    pub counter: usize,
    /// Flags the walk recorded for this exon.
    pub flags: ExonFlags,
}

/// Filters a walk down to its unexplained exons.
///
/// Exons with a known relation, or with a group pattern but without the seed,
/// are passed over. The report ends after the first reported exon where the
/// seed terminates or where another pattern terminates without the seed.
pub fn report(walk: &SeedWalk, exons: &ExonSet, order: ReportOrder) -> Vec<ExonReport> {
    let seed_id = walk.id();
    let mut out = Vec::new();

    for (idx, flags) in walk.ordered_steps(order) {
        if flags.is_explained() {
            continue;
        }

        let exon = &exons[idx];
        out.push(ExonReport {
            chrom: exon.chrom.clone(),
            start: exon.start,
            end: exon.end,
            strand: exon.strand_text().to_string(),
            exon_id: exon.exon_id.clone(),
            seed_id: seed_id.clone(),
            counter: out.len() + 1,
            flags,
        });

        if flags.ends_report() {
            break;
        }
    }

    out
}

/// Reports every walk, in walk order.
pub fn report_all(walks: &[SeedWalk], exons: &ExonSet, options: &WalkOptions) -> Vec<ExonReport> {
    walks
        .iter()
        .flat_map(|walk| report(walk, exons, options.order()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_bits_match_report_values() {
        assert_eq!(ExonFlags::SELF.bits(), 1);
        assert_eq!(ExonFlags::GROUP.bits(), 2);
        assert_eq!(ExonFlags::KNOWNSET.bits(), 4);
        assert_eq!(ExonFlags::TERM.bits(), 8);
        assert_eq!(ExonFlags::SELFTERM.bits(), 16);
        assert_eq!(ExonFlags::from_bits_truncate(0xff).bits(), 0x1f);
    }

    #[test]
    fn explained_and_ending_predicates() {
        assert!(ExonFlags::KNOWNSET.is_explained());
        assert!((ExonFlags::KNOWNSET | ExonFlags::SELF).is_explained());
        assert!(ExonFlags::GROUP.is_explained());
        assert!(!(ExonFlags::GROUP | ExonFlags::SELF).is_explained());
        assert!(!ExonFlags::NONE.is_explained());

        assert!(ExonFlags::TERM.ends_report());
        assert!(!(ExonFlags::TERM | ExonFlags::SELF).ends_report());
        assert!((ExonFlags::TERM | ExonFlags::SELF | ExonFlags::SELFTERM).ends_report());
        assert!(!ExonFlags::SELF.ends_report());
    }

    #[test]
    fn debug_lists_flag_names() {
        let flags = ExonFlags::GROUP | ExonFlags::TERM;
        assert_eq!(format!("{flags:?}"), "GROUP|TERM");
        assert_eq!(format!("{:?}", ExonFlags::NONE), "NONE");
    }
}
