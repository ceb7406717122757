#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the shooting map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the cached record types to allow independent evolution of the API
//! contract.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shooting_map_incident_models::NormalizedRecord;

/// A shooting incident as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIncident {
    /// Start date of the incident.
    pub occurred_on: NaiveDate,
    /// Human-readable place.
    pub location: String,
    /// State name.
    pub state: Option<String>,
    /// People killed.
    pub dead: u32,
    /// People injured.
    pub injured: u32,
    /// Total victims.
    pub total: u32,
    /// Latitude.
    pub latitude: Option<f64>,
    /// Longitude.
    pub longitude: Option<f64>,
}

impl From<&NormalizedRecord> for ApiIncident {
    fn from(record: &NormalizedRecord) -> Self {
        Self {
            occurred_on: record.occurred_on,
            location: record.location.clone(),
            state: record.state.clone(),
            dead: record.dead,
            injured: record.injured,
            total: record.total,
            latitude: record.latitude,
            longitude: record.longitude,
        }
    }
}

/// Query parameters for the incidents endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentQueryParams {
    /// Only incidents in this state (exact match).
    pub state: Option<String>,
    /// Earliest incident date, inclusive.
    pub from: Option<NaiveDate>,
    /// Latest incident date, inclusive.
    pub to: Option<NaiveDate>,
    /// Only incidents that have coordinates.
    pub geocoded: Option<bool>,
    /// Maximum results.
    pub limit: Option<usize>,
    /// Pagination offset.
    pub offset: Option<usize>,
}

impl IncidentQueryParams {
    /// Whether `record` passes every filter that is set.
    #[must_use]
    pub fn matches(&self, record: &NormalizedRecord) -> bool {
        if let Some(state) = &self.state
            && record.state.as_deref() != Some(state.as_str())
        {
            return false;
        }
        if self.from.is_some_and(|from| record.occurred_on < from) {
            return false;
        }
        if self.to.is_some_and(|to| record.occurred_on > to) {
            return false;
        }
        if let Some(geocoded) = self.geocoded
            && record.coordinates().is_some() != geocoded
        {
            return false;
        }
        true
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
    /// Number of cached incidents.
    pub incidents: usize,
}

/// Error body for failed requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

impl ApiError {
    /// Wraps any displayable error.
    #[must_use]
    pub fn new(message: impl std::fmt::Display) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: (i32, u32, u32), state: Option<&str>, geocoded: bool) -> NormalizedRecord {
        NormalizedRecord {
            occurred_on: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            location: "Somewhere".to_string(),
            state: state.map(String::from),
            dead: 1,
            injured: 3,
            total: 4,
            latitude: geocoded.then_some(30.0),
            longitude: geocoded.then_some(-97.0),
        }
    }

    #[test]
    fn incident_serializes_camel_case() {
        let json = serde_json::to_value(ApiIncident::from(&record(
            (2021, 5, 1),
            Some("Texas"),
            false,
        )))
        .unwrap();
        assert_eq!(json["occurredOn"], "2021-05-01");
        assert_eq!(json["state"], "Texas");
        assert!(json["latitude"].is_null());
    }

    #[test]
    fn empty_params_match_everything() {
        let params = IncidentQueryParams::default();
        assert!(params.matches(&record((2021, 5, 1), None, false)));
    }

    #[test]
    fn filters_by_state_and_date_range() {
        let params = IncidentQueryParams {
            state: Some("Texas".to_string()),
            from: NaiveDate::from_ymd_opt(2021, 1, 1),
            to: NaiveDate::from_ymd_opt(2021, 12, 31),
            ..IncidentQueryParams::default()
        };
        assert!(params.matches(&record((2021, 5, 1), Some("Texas"), false)));
        assert!(!params.matches(&record((2021, 5, 1), Some("Ohio"), false)));
        assert!(!params.matches(&record((2022, 1, 1), Some("Texas"), false)));
        assert!(!params.matches(&record((2021, 5, 1), None, false)));
    }

    #[test]
    fn filters_by_geocoded() {
        let params = IncidentQueryParams {
            geocoded: Some(true),
            ..IncidentQueryParams::default()
        };
        assert!(params.matches(&record((2021, 5, 1), None, true)));
        assert!(!params.matches(&record((2021, 5, 1), None, false)));
    }

    #[test]
    fn error_body_shape() {
        let json = serde_json::to_string(&ApiError::new("date is required")).unwrap();
        assert_eq!(json, r#"{"error":"date is required"}"#);
    }
}
