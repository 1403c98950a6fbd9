//! Exon records and the ordered record set the walks index into.

use std::ops::Index;

use crate::pattern::{self, PatternToken};
use crate::reader::{ReaderError, ReaderResult};
use crate::strand::Strand;

/// Minimum number of fields for a line to become an [`ExonRecord`].
pub const MIN_FIELDS: usize = 10;
/// Number of basic exon fields (everything up to and including the protein id).
pub const BASIC_FIELDS: usize = 11;
/// Number of fields of a fully annotated structural-variant record.
pub const SV_FIELDS: usize = 18;
/// SV types whose converted fragments are complete and safe to walk.
pub const COMPLETE_SV_TYPES: [&str; 3] = ["ADUP", "ATRA", "*"];

const CHROM_START: &str = "start";
const CHROM_END: &str = "end";
const PATTERN_COUNT: &str = "patternCount";
const LAST_COUNT: &str = "lastExonCount";
const IS_PROTEIN: &str = "isProtein";

/// Locus an exon occupied before structural-variant conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalLocus {
    /// Chromosome name.
    pub chrom: String,
    /// Start coordinate.
    pub start: u64,
    /// End coordinate.
    pub end: u64,
    /// Strand.
    pub strand: Strand,
}

impl OriginalLocus {
    /// Reads `origChrom origStart origEnd origStrand`.
    ///
    /// Placeholders such as `*` in any of the four columns yield `None`.
    fn from_fields(fields: &[&str]) -> Option<Self> {
        let [chrom, start, end, strand] = fields else {
            return None;
        };

        Some(OriginalLocus {
            chrom: chrom.to_string(),
            start: start.parse().ok()?,
            end: end.parse().ok()?,
            strand: Strand::parse(strand, 0).ok()?,
        })
    }
}

/// Structural-variant columns of a converted exon record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvInfo {
    /// Fragment identifier within the converted variant.
    pub fragment_id: String,
    /// Number of fragments produced by the variant.
    pub fragment_total: String,
    /// Variant type (`DUP`, `ADUP`, `ATRA`, ... or `*`).
    pub sv_type: String,
    /// Where the exon was before conversion, when all four columns exist.
    pub original: Option<OriginalLocus>,
}

/// One exon line of an annotation table.
///
/// ```text
/// 0  chrom          6  firstExonCount   12 fragmentTotal
/// 1  start          7  lastExonCount    13 svType
/// 2  end            8  isProtein        14 origChrom
/// 3  strand         9  patternList      15 origStart
/// 4  exonId         10 proteinId | *    16 origEnd
/// 5  patternCount   11 fragmentId       17 origStrand
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExonRecord {
    /// Chromosome name.
    pub chrom: String,
    /// Start coordinate.
    pub start: u64,
    /// End coordinate.
    pub end: u64,
    /// Strand, parsed.
    pub strand: Strand,
    /// Exon identifier.
    pub exon_id: String,
    /// Number of patterns using this exon.
    pub pattern_count: u32,
    /// Number of patterns starting here; empty or non-numeric reads as zero.
    pub first_count: u32,
    /// Number of patterns ending here.
    pub last_count: u32,
    /// Whether the exon is protein coding.
    pub is_protein: bool,
    /// Decoded pattern list.
    pub patterns: Vec<PatternToken>,
    /// Protein id, `None` for `*` or a missing column.
    pub protein_id: Option<String>,
    /// Structural-variant columns, when present.
    pub sv: Option<SvInfo>,
    strand_text: String,
    field_count: usize,
}

impl ExonRecord {
    /// Builds a record from the tab-separated fields of one line.
    ///
    /// `fields` must hold at least [`MIN_FIELDS`] entries; the reader drops
    /// shorter lines before calling this.
    pub(crate) fn from_fields(fields: &[&str], line: usize) -> ReaderResult<Self> {
        if fields.len() < MIN_FIELDS {
            return Err(ReaderError::unexpected_field_count(
                line,
                MIN_FIELDS,
                fields.len(),
            ));
        }

        let protein_id = fields
            .get(10)
            .filter(|value| **value != "*")
            .map(|value| value.to_string());

        let sv = if fields.len() > 13 {
            let original = if fields.len() >= SV_FIELDS {
                OriginalLocus::from_fields(&fields[14..SV_FIELDS])
            } else {
                None
            };

            Some(SvInfo {
                fragment_id: fields[11].to_string(),
                fragment_total: fields[12].to_string(),
                sv_type: fields[13].to_string(),
                original,
            })
        } else {
            None
        };

        Ok(ExonRecord {
            chrom: fields[0].to_string(),
            start: __to_u64(fields[1], line, CHROM_START)?,
            end: __to_u64(fields[2], line, CHROM_END)?,
            strand: Strand::parse(fields[3], line)?,
            exon_id: fields[4].to_string(),
            pattern_count: __to_u32(fields[5], line, PATTERN_COUNT)?,
            first_count: __to_count(fields[6]),
            last_count: __to_u32(fields[7], line, LAST_COUNT)?,
            is_protein: __to_u32(fields[8], line, IS_PROTEIN)? != 0,
            patterns: pattern::decode(fields[9]),
            protein_id,
            sv,
            strand_text: fields[3].to_string(),
            field_count: fields.len(),
        })
    }

    /// Strand column exactly as written in the source line.
    #[inline]
    pub fn strand_text(&self) -> &str {
        &self.strand_text
    }

    /// Number of tab-separated fields the source line carried.
    #[inline]
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    /// Returns `true` if the line carried every basic field (protein id included).
    #[inline]
    pub fn has_basic_fields(&self) -> bool {
        self.field_count >= BASIC_FIELDS
    }

    /// Pattern names in annotation order, position data ignored.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|token| token.name.as_str())
    }

    /// Names of the patterns that start at this exon.
    pub fn start_names(&self) -> impl Iterator<Item = &str> {
        self.patterns
            .iter()
            .filter(|token| token.is_start())
            .map(|token| token.name.as_str())
    }

    /// Returns `true` if `name` occurs in this exon's pattern list.
    pub fn contains(&self, name: &str) -> bool {
        self.patterns.iter().any(|token| token.name == name)
    }

    /// Returns `true` if the pattern `name` ends at this exon.
    pub fn terminates(&self, name: &str) -> bool {
        self.patterns
            .iter()
            .any(|token| token.is_terminal() && token.name == name)
    }

    /// Returns `true` if any pattern ends at this exon.
    pub fn has_terminal(&self) -> bool {
        self.patterns.iter().any(PatternToken::is_terminal)
    }

    /// Returns `false` for partial structural-variant fragments.
    ///
    /// Lines without SV columns always pass; lines with SV columns pass only
    /// when their SV type is one of [`COMPLETE_SV_TYPES`].
    pub fn is_complete_fragment(&self) -> bool {
        if self.field_count <= BASIC_FIELDS {
            return true;
        }

        self.sv
            .as_ref()
            .is_some_and(|sv| COMPLETE_SV_TYPES.contains(&sv.sv_type.as_str()))
    }
}

/// Exon records in file order, addressable by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExonSet {
    records: Vec<ExonRecord>,
}

impl ExonSet {
    /// Wraps records kept in file order.
    pub fn new(records: Vec<ExonRecord>) -> Self {
        Self { records }
    }

    /// Number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if there are no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `index`, if any.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&ExonRecord> {
        self.records.get(index)
    }

    /// Iterates over the records in file order.
    pub fn iter(&self) -> std::slice::Iter<'_, ExonRecord> {
        self.records.iter()
    }

    /// All records in file order.
    pub fn records(&self) -> &[ExonRecord] {
        &self.records
    }

    /// Index reached by moving `delta` records away from `index`, if in range.
    #[inline]
    pub fn offset(&self, index: usize, delta: isize) -> Option<usize> {
        index
            .checked_add_signed(delta)
            .filter(|next| *next < self.records.len())
    }

    /// Keeps only the records the exon-walk classifier accepts: every basic
    /// field present and no partial structural-variant fragments.
    pub fn retain_walkable(&mut self) {
        let before = self.records.len();
        self.records
            .retain(|record| record.has_basic_fields() && record.is_complete_fragment());
        log::debug!(
            "dropped {} incomplete exon records, {} kept",
            before - self.records.len(),
            self.records.len()
        );
    }
}

impl Index<usize> for ExonSet {
    type Output = ExonRecord;

    fn index(&self, index: usize) -> &Self::Output {
        &self.records[index]
    }
}

impl FromIterator<ExonRecord> for ExonSet {
    fn from_iter<T: IntoIterator<Item = ExonRecord>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ExonSet {
    type Item = &'a ExonRecord;
    type IntoIter = std::slice::Iter<'a, ExonRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Parses a field to a u64
fn __to_u64(field: &str, line: usize, label: &'static str) -> ReaderResult<u64> {
    field.parse::<u64>().map_err(|_| {
        ReaderError::invalid_field(
            line,
            label,
            format!("ERROR: expected unsigned integer, got '{field}' in {line}:{label}"),
        )
    })
}

/// Parses a count column, reading empty or non-numeric values as zero.
fn __to_count(field: &str) -> u32 {
    field.parse::<u32>().unwrap_or(0)
}

/// Parses a field to a u32
fn __to_u32(field: &str, line: usize, label: &'static str) -> ReaderResult<u32> {
    field.parse::<u32>().map_err(|_| {
        ReaderError::invalid_field(
            line,
            label,
            format!("ERROR: expected unsigned integer, got '{field}' in {line}:{label}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(line: &str) -> Vec<&str> {
        line.split('\t').collect()
    }

    #[test]
    fn parses_sv_record() {
        let line = "chr1\t19941\t20036\t-\t33\t2\t0\t0\t0\tuc009viy.2[4/9],uc009vjf.2[5/7]\t*\t1\t1\tDUP\tchr1\t18267\t18362\t-";
        let record = ExonRecord::from_fields(&fields(line), 1).unwrap();
        assert_eq!(record.chrom, "chr1");
        assert_eq!(record.strand, Strand::Reverse);
        assert_eq!(record.exon_id, "33");
        assert_eq!(record.pattern_count, 2);
        assert_eq!(record.protein_id, None);
        assert_eq!(record.patterns.len(), 2);
        assert_eq!(record.field_count(), 18);

        let sv = record.sv.as_ref().unwrap();
        assert_eq!(sv.sv_type, "DUP");
        let original = sv.original.as_ref().unwrap();
        assert_eq!(original.start, 18267);
        assert_eq!(original.strand, Strand::Reverse);
        assert!(!record.is_complete_fragment());
    }

    #[test]
    fn ten_field_record_lacks_protein_id() {
        let line = "chr1\t10\t20\t+\te1\t1\t1\t0\t0\tA[1/2]";
        let record = ExonRecord::from_fields(&fields(line), 1).unwrap();
        assert!(!record.has_basic_fields());
        assert_eq!(record.protein_id, None);
        assert!(record.sv.is_none());
        assert_eq!(record.start_names().collect::<Vec<_>>(), vec!["A"]);
    }

    #[test]
    fn twelve_field_record_is_incomplete_fragment() {
        let line = "chr1\t10\t20\t+\te1\t1\t1\t0\t1\tA[1/2]\tP1\t1";
        let record = ExonRecord::from_fields(&fields(line), 1).unwrap();
        assert_eq!(record.protein_id.as_deref(), Some("P1"));
        assert!(record.is_protein);
        assert!(!record.is_complete_fragment());
    }

    #[test]
    fn invalid_coordinate_is_an_error() {
        let line = "chr1\tten\t20\t+\te1\t1\t1\t0\t0\tA[1/2]\t*";
        assert!(ExonRecord::from_fields(&fields(line), 4).is_err());
    }

    #[test]
    fn offset_stays_in_range() {
        let line = "chr1\t10\t20\t+\te1\t1\t1\t0\t0\tA[1/2]\t*";
        let record = ExonRecord::from_fields(&fields(line), 1).unwrap();
        let set = ExonSet::new(vec![record.clone(), record]);
        assert_eq!(set.offset(0, 1), Some(1));
        assert_eq!(set.offset(1, 1), None);
        assert_eq!(set.offset(0, -1), None);
        assert_eq!(set.offset(1, -1), Some(0));
    }
}
