//! Decoding of splice pattern annotations.
//!
//! Every exon record carries a comma-separated list of tokens such as
//! `uc009viy.2[4/9]`: the isoform (splice pattern) name followed by the
//! position of this exon within the isoform and the isoform's exon total.

use memchr::memchr;

/// Position of an exon within one splice pattern, `position` out of `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternSpan {
    /// 1-based position of the exon inside the pattern.
    pub position: u32,
    /// Number of exons in the pattern.
    pub total: u32,
}

/// One decoded `name[position/total]` token.
///
/// Tokens without a well-formed bracket suffix keep their name but carry no
/// span; they never signal a start or a termination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternToken {
    /// Splice pattern (isoform) name.
    pub name: String,
    /// Position data, if the token had a valid `[position/total]` suffix.
    pub span: Option<PatternSpan>,
}

impl PatternToken {
    /// Decodes a single token.
    ///
    /// # Example
    ///
    /// ```
    /// use exonwalk::pattern::PatternToken;
    ///
    /// let token = PatternToken::parse("uc001aaa.3[2/2]");
    /// assert_eq!(token.name, "uc001aaa.3");
    /// assert!(token.is_terminal());
    /// assert!(!token.is_start());
    /// ```
    pub fn parse(raw: &str) -> Self {
        let bytes = raw.as_bytes();
        match memchr(b'[', bytes) {
            Some(idx) => PatternToken {
                name: raw[..idx].to_string(),
                span: parse_span(&raw[idx + 1..]),
            },
            None => PatternToken {
                name: raw.to_string(),
                span: None,
            },
        }
    }

    /// Returns `true` if this exon is the last one of the pattern.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.span.is_some_and(|span| span.position == span.total)
    }

    /// Returns `true` if this exon is the first one of the pattern.
    #[inline]
    pub fn is_start(&self) -> bool {
        self.span.is_some_and(|span| span.position == 1)
    }
}

/// Parses `position/total]` (the text following the opening bracket).
fn parse_span(rest: &str) -> Option<PatternSpan> {
    let close = memchr(b']', rest.as_bytes())?;
    let (position, total) = rest[..close].split_once('/')?;
    if !is_digits(position) || !is_digits(total) {
        return None;
    }

    Some(PatternSpan {
        position: position.parse().ok()?,
        total: total.parse().ok()?,
    })
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Decodes a full annotation field into its tokens, in order.
///
/// Empty tokens (for example from a trailing comma) are dropped.
///
/// # Example
///
/// ```
/// use exonwalk::pattern::decode;
///
/// let tokens = decode("name1[2/5],name2[5/5]");
/// assert_eq!(tokens.len(), 2);
/// assert_eq!(tokens[1].name, "name2");
/// assert!(tokens[1].is_terminal());
/// ```
pub fn decode(raw: &str) -> Vec<PatternToken> {
    raw.split(',')
        .filter(|token| !token.is_empty())
        .map(PatternToken::parse)
        .collect()
}

/// Canonical (sorted) form of an unordered name pair.
#[inline]
pub fn canonical_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_position_and_total() {
        let token = PatternToken::parse("uc009viy.2[4/9]");
        assert_eq!(token.name, "uc009viy.2");
        assert_eq!(
            token.span,
            Some(PatternSpan {
                position: 4,
                total: 9
            })
        );
        assert!(!token.is_terminal());
        assert!(!token.is_start());
    }

    #[test]
    fn malformed_bracket_degrades_to_name_only() {
        for raw in ["iso[", "iso[1/]", "iso[a/2]", "iso[1/2", "iso[12]"] {
            let token = PatternToken::parse(raw);
            assert_eq!(token.name, "iso", "{raw}");
            assert!(token.span.is_none(), "{raw}");
            assert!(!token.is_start());
            assert!(!token.is_terminal());
        }
    }

    #[test]
    fn single_exon_pattern_is_start_and_terminal() {
        let token = PatternToken::parse("solo[1/1]");
        assert!(token.is_start());
        assert!(token.is_terminal());
    }

    #[test]
    fn decode_skips_empty_tokens() {
        let tokens = decode("a[1/2],,b,");
        let names: Vec<_> = tokens.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(decode("").is_empty());
    }

    #[test]
    fn canonical_pair_sorts() {
        assert_eq!(canonical_pair("b", "a"), ("a", "b"));
        assert_eq!(canonical_pair("a", "b"), ("a", "b"));
    }
}
