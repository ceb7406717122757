//! Casualty count extraction.
//!
//! Scraped counts come as `"12"`, `"12[a 1]"` (citation marker), `"10-15"`
//! (range) or `"20+"` (approximate). Citation markers are removed and the
//! first numeric token is taken.

use std::sync::LazyLock;

use regex::Regex;

/// Bracketed footnote annotation, e.g. `[a 1]` or `[12]`.
static CITATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("valid regex"));

/// Literal used by sources for counts they do not know.
pub const UNKNOWN: &str = "unknown";

/// Errors from [`extract_count`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CountError {
    /// The source reported the count as `unknown`.
    #[error("Count is unknown")]
    Unknown,

    /// The value is not a non-negative base-10 integer.
    #[error("Invalid count: {0}")]
    Invalid(String),
}

/// Whether `raw` is the `unknown` placeholder.
#[must_use]
pub fn is_unknown(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case(UNKNOWN)
}

/// Removes every bracketed citation marker from `raw`.
#[must_use]
pub fn strip_citations(raw: &str) -> String {
    CITATION_RE.replace_all(raw, "").into_owned()
}

/// Extracts a casualty count, taking the lower bound of ranges and
/// approximate values.
///
/// # Errors
///
/// Returns [`CountError::Unknown`] for the `unknown` placeholder and
/// [`CountError::Invalid`] when no integer can be read.
pub fn extract_count(raw: &str) -> Result<u32, CountError> {
    if is_unknown(raw) {
        return Err(CountError::Unknown);
    }

    let text = strip_citations(raw).replace('\u{2013}', "-");
    let first = text.split(['-', '+']).next().map_or("", str::trim);

    first
        .parse::<u32>()
        .map_err(|_| CountError::Invalid(raw.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_integer() {
        assert_eq!(extract_count("7"), Ok(7));
        assert_eq!(extract_count(" 0 "), Ok(0));
    }

    #[test]
    fn strips_citation_marker() {
        assert_eq!(extract_count("12[a 1]"), Ok(12));
        assert_eq!(extract_count("4[3]"), Ok(4));
    }

    #[test]
    fn strips_multiple_citation_markers() {
        assert_eq!(extract_count("9[a][b 2]"), Ok(9));
    }

    #[test]
    fn takes_lower_bound_of_range() {
        assert_eq!(extract_count("10-15"), Ok(10));
        assert_eq!(extract_count("10\u{2013}15"), Ok(10));
    }

    #[test]
    fn takes_value_before_plus() {
        assert_eq!(extract_count("20+"), Ok(20));
    }

    #[test]
    fn handles_citation_and_range_together() {
        assert_eq!(extract_count("3-5[c 4]"), Ok(3));
    }

    #[test]
    fn every_citation_suffix_is_ignored() {
        for n in [0_u32, 1, 5, 49, 60, 413] {
            for marker in ["[a]", "[a 1]", "[12]", "[note 3]"] {
                assert_eq!(extract_count(&format!("{n}{marker}")), Ok(n));
            }
        }
    }

    #[test]
    fn unknown_is_distinct_from_invalid() {
        assert_eq!(extract_count("unknown"), Err(CountError::Unknown));
        assert_eq!(extract_count(" Unknown "), Err(CountError::Unknown));
        assert!(is_unknown("unknown"));
        assert!(!is_unknown("1"));
    }

    #[test]
    fn rejects_non_numeric() {
        assert_eq!(
            extract_count("several"),
            Err(CountError::Invalid("several".to_string()))
        );
        assert!(matches!(extract_count(""), Err(CountError::Invalid(_))));
        assert!(matches!(extract_count("-3"), Err(CountError::Invalid(_))));
    }
}
