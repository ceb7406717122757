#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Text cleaning and field extraction for scraped shooting incident rows.
//!
//! Each field has one small grammar:
//!
//! - [`date::normalize_date`] reduces a date or date range to its start date.
//! - [`count::extract_count`] strips citation markers and takes the lower
//!   bound of ranges and approximate (`"20+"`) values.
//! - [`location::extract_state`] pulls the trailing state name out of a
//!   `"City, State"` style location.
//!
//! The [`stages`] module applies these rules to whole batches of
//! [`RawRecord`](shooting_map_incident_models::RawRecord)s, dropping rows
//! that fail and tallying why in a [`CleaningReport`].

pub mod count;
pub mod date;
pub mod location;
pub mod stages;

use std::collections::BTreeMap;

use strum_macros::{AsRefStr, Display};

pub use count::{CountError, extract_count};
pub use date::{DateError, normalize_date};
pub use location::extract_state;

/// Why a row was dropped during cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum RejectionReason {
    /// The date matched a known-bad source value.
    KnownBadDate,
    /// The date could not be reduced to a single calendar date.
    UnparseableDate,
    /// The injured count was the literal `unknown`.
    UnknownInjured,
    /// A dead, injured, or total count was not a number.
    UnparseableCount,
    /// The total count was smaller than the dead count.
    InconsistentTotal,
}

/// Tally of rows dropped by the cleaning stages, keyed by reason.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningReport {
    counts: BTreeMap<RejectionReason, u64>,
}

impl CleaningReport {
    /// Records one dropped row.
    pub fn reject(&mut self, reason: RejectionReason, detail: &str) {
        log::debug!("Dropping row ({reason}): {detail}");
        *self.counts.entry(reason).or_insert(0) += 1;
    }

    /// Number of rows dropped for `reason`.
    #[must_use]
    pub fn count(&self, reason: RejectionReason) -> u64 {
        self.counts.get(&reason).copied().unwrap_or(0)
    }

    /// Total number of dropped rows.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Iterates over `(reason, count)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (RejectionReason, u64)> + '_ {
        self.counts.iter().map(|(k, v)| (*k, *v))
    }
}
