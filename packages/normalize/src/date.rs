//! Incident date normalization.
//!
//! Source tables describe dates in a handful of shapes:
//! - Single date: `"March 3, 2021"`
//! - Same-month range: `"March 3-4, 2021"`
//! - Cross-month range: `"March 30-April 2, 2021"`
//! - Range of two full dates: `"December 29, 2020-January 2, 2021"`
//! - Tabular datasets: `"2021-03-03"` or `"3/3/2021"`
//!
//! Ranges are reduced to their start date. En-dashes are accepted as the
//! range separator.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// Four-digit year token.
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{4}\b").expect("valid regex"));

/// Source values known to be corrupt rather than merely imprecise.
const KNOWN_BAD_VALUES: &[&str] = &["January 1923"];

const LONG_FORMAT: &str = "%B %d, %Y";
const ISO_FORMAT: &str = "%Y-%m-%d";
const US_NUMERIC_FORMAT: &str = "%m/%d/%Y";

/// Errors from [`normalize_date`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    /// The value is on the known-bad list and must not be parsed.
    #[error("Known bad date value: {0}")]
    KnownBadValue(String),

    /// The value was blank.
    #[error("Empty date")]
    Empty,

    /// The value could not be reduced to a single calendar date.
    #[error("Unparseable date: {0}")]
    Unparseable(String),
}

/// Reduces a free-text date expression to the incident's start date.
///
/// # Errors
///
/// Returns [`DateError::KnownBadValue`] for known-corrupt source values,
/// [`DateError::Empty`] for blank input, and [`DateError::Unparseable`]
/// when no accepted shape matches.
pub fn normalize_date(raw: &str) -> Result<NaiveDate, DateError> {
    let text = raw.trim().replace('\u{2013}', "-");

    if text.is_empty() {
        return Err(DateError::Empty);
    }

    if KNOWN_BAD_VALUES.contains(&text.as_str()) {
        return Err(DateError::KnownBadValue(text));
    }

    // Numeric shapes first: ISO dates contain hyphens that are not ranges.
    for format in [ISO_FORMAT, US_NUMERIC_FORMAT] {
        if let Ok(date) = NaiveDate::parse_from_str(&text, format) {
            return Ok(date);
        }
    }

    let start = start_of_range(&text);
    NaiveDate::parse_from_str(&start, LONG_FORMAT).map_err(|_| DateError::Unparseable(text))
}

/// Returns the start-date portion of a (possibly ranged) long-form date.
///
/// When the part before the separator has no year of its own, the last
/// year found after the separator is appended.
fn start_of_range(text: &str) -> String {
    let Some((head, tail)) = text.split_once('-') else {
        return text.to_string();
    };

    let head = head.trim().trim_end_matches(',');

    if YEAR_RE.is_match(head) {
        return head.to_string();
    }

    YEAR_RE.find_iter(tail).last().map_or_else(
        || head.to_string(),
        |year| format!("{head}, {}", year.as_str()),
    )
}
