#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregate statistic types.
//!
//! These are the rows behind the dashboard charts and the `/api/stats`
//! endpoints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Victims and deaths per million residents for one state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRate {
    /// State name.
    pub state: String,
    /// Number of incidents in the state.
    pub incidents: u64,
    /// Sum of victims.
    pub total: u64,
    /// Sum of deaths.
    pub dead: u64,
    /// Census population.
    pub population: u64,
    /// `total * 1e6 / population`.
    pub victims_per_1m: f64,
    /// `dead * 1e6 / population`.
    pub deaths_per_1m: f64,
}

/// Incident count for one calendar month, across all years.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthCount {
    /// 1 = January.
    pub month_number: u32,
    /// English month name.
    pub month: String,
    /// Number of incidents.
    pub shootings: u64,
}

/// Incident count for one day of the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayCount {
    /// 1 = Monday.
    pub weekday_number: u32,
    /// English day name.
    pub weekday: String,
    /// Number of incidents.
    pub shootings: u64,
}

/// Headline numbers for the whole record set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Number of incidents.
    pub incidents: u64,
    /// Sum of deaths.
    pub dead: u64,
    /// Sum of injuries.
    pub injured: u64,
    /// Sum of victims.
    pub total: u64,
    /// Incidents with coordinates.
    pub geocoded: u64,
    /// Incidents with a recognized state.
    pub with_state: u64,
    /// Earliest incident date.
    pub first_date: Option<NaiveDate>,
    /// Latest incident date.
    pub last_date: Option<NaiveDate>,
}
