#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shooting incident record types shared across the shooting-map workspace.
//!
//! Every data source produces [`RawRecord`] rows, which the normalization
//! pipeline turns into typed [`NormalizedRecord`] values collected in a
//! [`RecordSet`].

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Incidents with this many total victims or fewer are excluded.
pub const SEVERITY_THRESHOLD: u32 = 2;

/// One incident row exactly as harvested from a source, before cleaning.
///
/// Every field is loosely typed text. Wikipedia tables only populate the
/// five core expressions; tabular datasets also carry their own state and
/// coordinates but no total column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    /// Identifier assigned by the source, when it has one.
    pub source_id: Option<String>,
    /// Free-text date expression (may be a range).
    pub date: String,
    /// Free-text location expression.
    pub location: String,
    /// Dead-count expression (may carry citation markers or a range).
    pub dead: String,
    /// Injured-count expression.
    pub injured: String,
    /// Total-count expression. `None` when the source has no total column.
    pub total: Option<String>,
    /// Source-provided state name.
    pub state: Option<String>,
    /// Source-provided latitude text.
    pub latitude: Option<String>,
    /// Source-provided longitude text.
    pub longitude: Option<String>,
}

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
}

/// A cleaned, typed incident.
///
/// `total` is kept as reported by the source and is not reconciled with
/// `dead + injured`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Start date of the incident.
    pub occurred_on: NaiveDate,
    /// Trimmed human-readable place.
    pub location: String,
    /// State name derived from the location, if recognizable.
    pub state: Option<String>,
    /// Number of people killed.
    pub dead: u32,
    /// Number of people injured.
    pub injured: u32,
    /// Total number of victims.
    pub total: u32,
    /// Latitude, `None` until geocoded (or if geocoding failed).
    pub latitude: Option<f64>,
    /// Longitude, `None` until geocoded (or if geocoding failed).
    pub longitude: Option<f64>,
}

impl NormalizedRecord {
    /// Whether the incident passes the severity filter (`total > 2`).
    #[must_use]
    pub const fn is_severe(&self) -> bool {
        self.total > SEVERITY_THRESHOLD
    }

    /// Returns the coordinate pair when both halves are present.
    #[must_use]
    pub const fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    /// Replaces the coordinates. `None` clears both halves.
    #[must_use]
    pub fn with_coordinates(mut self, coordinates: Option<Coordinates>) -> Self {
        if let Some(c) = coordinates {
            self.latitude = Some(c.latitude);
            self.longitude = Some(c.longitude);
        } else {
            self.latitude = None;
            self.longitude = None;
        }
        self
    }
}

/// An ordered collection of normalized incidents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSet {
    records: Vec<NormalizedRecord>,
}

impl RecordSet {
    /// Wraps an existing list of records, keeping their order.
    #[must_use]
    pub const fn new(records: Vec<NormalizedRecord>) -> Self {
        Self { records }
    }

    /// Returns the records as a slice.
    #[must_use]
    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    /// Consumes the set, returning the underlying records.
    #[must_use]
    pub fn into_records(self) -> Vec<NormalizedRecord> {
        self.records
    }

    /// Number of records in the set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set has no records.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over the records in order.
    pub fn iter(&self) -> std::slice::Iter<'_, NormalizedRecord> {
        self.records.iter()
    }

    /// Appends a record at the end of the set.
    pub fn push(&mut self, record: NormalizedRecord) {
        self.records.push(record);
    }

    /// Keeps only incidents with more than [`SEVERITY_THRESHOLD`] victims.
    ///
    /// Applying the filter twice yields the same set as applying it once.
    #[must_use]
    pub fn apply_severity_filter(self) -> Self {
        self.records
            .into_iter()
            .filter(NormalizedRecord::is_severe)
            .collect()
    }
}

impl FromIterator<NormalizedRecord> for RecordSet {
    fn from_iter<T: IntoIterator<Item = NormalizedRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RecordSet {
    type Item = NormalizedRecord;
    type IntoIter = std::vec::IntoIter<NormalizedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a NormalizedRecord;
    type IntoIter = std::slice::Iter<'a, NormalizedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Static mapping of state name to population count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PopulationTable {
    populations: BTreeMap<String, u64>,
}

impl PopulationTable {
    /// Returns the population of `state`, if known.
    #[must_use]
    pub fn get(&self, state: &str) -> Option<u64> {
        self.populations.get(state).copied()
    }

    /// Number of states in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.populations.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.populations.is_empty()
    }

    /// Iterates over `(state, population)` pairs in state-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.populations.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, u64)> for PopulationTable {
    fn from_iter<T: IntoIterator<Item = (String, u64)>>(iter: T) -> Self {
        Self {
            populations: iter.into_iter().collect(),
        }
    }
}
