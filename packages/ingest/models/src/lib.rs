#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ingestion configuration, progress, and result types.

pub mod progress;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shooting_map_incident_models::RecordSet;
use strum_macros::{Display, EnumIter};

/// Environment variable selecting the default source.
pub const SOURCE_ENV: &str = "SHOOTING_MAP_SOURCE";

/// Source used when neither `--source` nor [`SOURCE_ENV`] is given.
pub const DEFAULT_SOURCE: &str = "wikipedia";

/// Steps of a pipeline run, in execution order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PipelineStage {
    /// Source document downloaded.
    Fetched,
    /// Rows extracted into raw records.
    Parsed,
    /// Dates normalized.
    DateCleaned,
    /// Rows with an unknown injured count dropped.
    FilteredUnknown,
    /// Counts parsed into typed records.
    NumbersCleaned,
    /// Incidents below the victim threshold dropped.
    SeverityFiltered,
    /// Coordinates resolved.
    Geocoded,
    /// Snapshot written.
    Persisted,
}

/// How many records survived a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageCount {
    /// The completed stage.
    pub stage: PipelineStage,
    /// Records remaining after it.
    pub survivors: u64,
}

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    /// Registry id of the source to ingest.
    pub source_id: String,
    /// URL or path replacing the source's configured resource.
    pub resource: Option<String>,
    /// Delete the cache before running.
    pub refresh: bool,
    /// Resolve coordinates for records that lack them.
    pub geocode: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            source_id: DEFAULT_SOURCE.to_string(),
            resource: None,
            refresh: false,
            geocode: true,
        }
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// A snapshot already existed and was loaded as-is.
    Cached {
        /// The stored records.
        records: RecordSet,
    },
    /// The source was fetched, cleaned and persisted.
    Ingested {
        /// The persisted records.
        records: RecordSet,
        /// Survivors after each stage, in order.
        stages: Vec<StageCount>,
        /// Dropped records per rejection reason.
        rejected: BTreeMap<String, u64>,
        /// Records that ended up with coordinates.
        geocoded: u64,
    },
}

impl IngestOutcome {
    /// The resulting records.
    #[must_use]
    pub const fn records(&self) -> &RecordSet {
        match self {
            Self::Cached { records } | Self::Ingested { records, .. } => records,
        }
    }

    /// Consumes the outcome, returning its records.
    #[must_use]
    pub fn into_records(self) -> RecordSet {
        match self {
            Self::Cached { records } | Self::Ingested { records, .. } => records,
        }
    }

    /// Whether the run was served from the cache.
    #[must_use]
    pub const fn is_cached(&self) -> bool {
        matches!(self, Self::Cached { .. })
    }
}

/// Raw add-record form input, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordForm {
    /// Incident date.
    #[serde(default)]
    pub date: String,
    /// Street address.
    #[serde(default)]
    pub address: String,
    /// Number injured.
    #[serde(default)]
    pub injured: String,
    /// Number killed.
    #[serde(default)]
    pub killed: String,
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator as _;

    use super::*;

    #[test]
    fn stages_run_in_declared_order() {
        let stages: Vec<_> = PipelineStage::iter().collect();
        assert_eq!(stages.first(), Some(&PipelineStage::Fetched));
        assert_eq!(stages.last(), Some(&PipelineStage::Persisted));
        assert!(stages.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn stage_names_are_snake_case() {
        assert_eq!(PipelineStage::DateCleaned.to_string(), "date_cleaned");
        assert_eq!(
            serde_json::to_value(PipelineStage::FilteredUnknown).unwrap(),
            "filtered_unknown"
        );
    }

    #[test]
    fn form_fields_default_to_blank() {
        let form: RecordForm = serde_json::from_str(r#"{"date":"2021-05-01"}"#).unwrap();
        assert_eq!(form.date, "2021-05-01");
        assert!(form.address.is_empty());
    }

    #[test]
    fn default_options_geocode_wikipedia() {
        let options = IngestOptions::default();
        assert_eq!(options.source_id, DEFAULT_SOURCE);
        assert!(options.geocode);
        assert!(!options.refresh);
    }
}
