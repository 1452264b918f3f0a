//! Loose dotted version strings with a total order.
//!
//! Package release numbers here are not semver: `3.5` is a valid
//! version and `3.5.1` sorts after it. Comparison is segment-wise,
//! numeric segments first, falling back to lexicographic for
//! non-numeric segments, with a shorter version sorting before a
//! longer one that shares its prefix.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::BuildError;

/// One dot-separated version segment.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Num(u64),
    Text(String),
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Segment::Num(a), Segment::Num(b)) => a.cmp(b),
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            // Numeric segments sort before textual ones (1 < "rc1").
            (Segment::Num(_), Segment::Text(_)) => Ordering::Less,
            (Segment::Text(_), Segment::Num(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A parsed dotted release version such as `3.5.1` or `2.1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    segments: Vec<Segment>,
    raw: String,
}

impl Release {
    /// Parse a dotted version string.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Spec`] for an empty string.
    pub fn parse(s: &str) -> Result<Self, BuildError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(BuildError::Spec("empty version string".to_string()));
        }
        let segments = trimmed
            .split('.')
            .map(|seg| match seg.parse::<u64>() {
                Ok(n) => Segment::Num(n),
                Err(_) => Segment::Text(seg.to_string()),
            })
            .collect();
        Ok(Self {
            segments,
            raw: trimmed.to_string(),
        })
    }

    /// Whether this version is at or past the given threshold.
    ///
    /// The boundary is inclusive: `3.5` and `3.5.1` are both at least
    /// `3.5`, while `3.4` is not. An unparseable threshold compares
    /// as "not reached".
    pub fn at_least(&self, threshold: &str) -> bool {
        Release::parse(threshold).map_or(false, |t| *self >= t)
    }

    /// The original version string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The first `n` segments re-joined with dots, e.g. the `2.7` of
    /// Python `2.7.10`.
    pub fn short(&self, n: usize) -> String {
        self.raw.split('.').take(n).collect::<Vec<_>>().join(".")
    }
}

impl Ord for Release {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.segments.iter().zip(other.segments.iter()) {
            match a.cmp(b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        self.segments.len().cmp(&other.segments.len())
    }
}

impl PartialOrd for Release {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Release {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Release::parse(s)
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Release {
        Release::parse(s).unwrap()
    }

    #[test]
    fn test_ordering() {
        assert!(v("3.5") > v("3.4"));
        assert!(v("3.5.1") > v("3.5"));
        assert!(v("3.10") > v("3.9"));
        assert!(v("2.1") > v("2.0.8"));
        assert_eq!(v("3.5"), v("3.5"));
    }

    #[test]
    fn test_threshold_boundary_inclusive() {
        assert!(!v("3.4").at_least("3.5"));
        assert!(v("3.5").at_least("3.5"));
        assert!(v("3.5.1").at_least("3.5"));
        assert!(v("2.1").at_least("2.1"));
        assert!(!v("2.0").at_least("3"));
    }

    #[test]
    fn test_textual_segments() {
        assert!(v("1.0.rc1") > v("1.0"));
        assert!(v("1.0.1") < v("1.0.rc1"));
    }

    #[test]
    fn test_short() {
        assert_eq!(v("2.7.10").short(2), "2.7");
        assert_eq!(v("3").short(2), "3");
    }

    #[test]
    fn test_parse_empty_fails() {
        assert!(Release::parse("").is_err());
        assert!(Release::parse("  ").is_err());
    }
}
