//! Exon strand and walk direction.

use std::fmt;

use crate::reader::{ReaderError, ReaderResult};

/// Represents the strand of an exon record.
///
/// The strand decides the direction of every walk: forward-strand exons are
/// walked towards higher record indices, everything else towards lower ones.
///
/// # Example
///
/// ```
/// use exonwalk::strand::Strand;
///
/// let strand = Strand::Forward;
/// assert_eq!(strand.step(), 1);
/// assert_eq!(Strand::Reverse.step(), -1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    /// Positive strand (`+`).
    Forward,
    /// Negative strand (`-`).
    Reverse,
    /// Unknown strand (`.` or `?`).
    Unknown,
}

impl Strand {
    /// Parses a string into a `Strand`.
    ///
    /// # Errors
    ///
    /// This function returns an error if the string is not a valid strand.
    pub(crate) fn parse(raw: &str, line: usize) -> ReaderResult<Self> {
        match raw {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            "." | "?" => Ok(Strand::Unknown),
            other => Err(ReaderError::invalid_field(
                line,
                "strand",
                format!("ERROR: expected '+', '-', '.', or '?', got '{other}' in {line}:strand"),
            )),
        }
    }

    /// Index delta used when walking from an exon on this strand.
    ///
    /// Only `+` walks forward; `-` and unknown strands walk backwards.
    #[inline]
    pub fn step(self) -> isize {
        match self {
            Strand::Forward => 1,
            Strand::Reverse | Strand::Unknown => -1,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => f.write_str("+"),
            Strand::Reverse => f.write_str("-"),
            Strand::Unknown => f.write_str("."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_known_symbols() {
        assert_eq!(Strand::parse("+", 1).unwrap(), Strand::Forward);
        assert_eq!(Strand::parse("-", 1).unwrap(), Strand::Reverse);
        assert_eq!(Strand::parse("?", 1).unwrap(), Strand::Unknown);
        assert!(Strand::parse("x", 3).is_err());
    }

    #[test]
    fn display_round_trips_symbols() {
        assert_eq!(Strand::Forward.to_string(), "+");
        assert_eq!(Strand::Reverse.to_string(), "-");
        assert_eq!(Strand::Unknown.to_string(), ".");
    }
}
