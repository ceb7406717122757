//! State extraction from free-text locations.

use std::sync::LazyLock;

use regex::Regex;

/// The last word of a location, plus the word before it when only a single
/// space separates them ("North Carolina", but not "Springfield, Illinois").
static STATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w* \w+$").expect("valid regex"));

/// Extracts the state name from the end of a location string.
///
/// Returns `None` for empty or malformed locations. A location without a
/// state only drops out of state-level aggregation.
#[must_use]
pub fn extract_state(location: &str) -> Option<String> {
    STATE_RE
        .find(location.trim())
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Joins the non-blank location parts with `", "`.
#[must_use]
pub fn compose_location(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
