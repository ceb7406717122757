//! Batch cleaning stages.
//!
//! The pipeline runs these in a fixed order, each consuming the survivors
//! of the previous one:
//!
//! 1. [`clean_dates`]: parse the date, dropping known-bad and unparseable
//!    values.
//! 2. [`drop_unknown_injured`]: drop rows whose injured count is `unknown`.
//! 3. [`clean_numbers`]: parse counts and build [`NormalizedRecord`]s.
//!
//! A row that fails a stage is removed and tallied in the
//! [`CleaningReport`]; the batch itself never fails.

use chrono::NaiveDate;
use shooting_map_incident_models::{Coordinates, NormalizedRecord, RawRecord};

use crate::count::{self, CountError};
use crate::date::{DateError, normalize_date};
use crate::location::extract_state;
use crate::{CleaningReport, RejectionReason};

/// A raw row whose date has been normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedRecord {
    /// Start date of the incident.
    pub occurred_on: NaiveDate,
    /// The row as harvested.
    pub raw: RawRecord,
}

/// Normalizes the date of every row, dropping rows that fail.
#[must_use]
pub fn clean_dates(records: Vec<RawRecord>, report: &mut CleaningReport) -> Vec<DatedRecord> {
    records
        .into_iter()
        .filter_map(|raw| match normalize_date(&raw.date) {
            Ok(occurred_on) => Some(DatedRecord { occurred_on, raw }),
            Err(DateError::KnownBadValue(value)) => {
                report.reject(RejectionReason::KnownBadDate, &value);
                None
            }
            Err(e) => {
                report.reject(RejectionReason::UnparseableDate, &e.to_string());
                None
            }
        })
        .collect()
}

/// Drops rows whose injured count is the `unknown` placeholder.
#[must_use]
pub fn drop_unknown_injured(
    records: Vec<DatedRecord>,
    report: &mut CleaningReport,
) -> Vec<DatedRecord> {
    records
        .into_iter()
        .filter(|r| {
            if count::is_unknown(&r.raw.injured) {
                report.reject(RejectionReason::UnknownInjured, &r.raw.location);
                false
            } else {
                true
            }
        })
        .collect()
}

/// Parses the counts of every row into a [`NormalizedRecord`], dropping
/// rows that fail.
#[must_use]
pub fn clean_numbers(
    records: Vec<DatedRecord>,
    report: &mut CleaningReport,
) -> Vec<NormalizedRecord> {
    records
        .into_iter()
        .filter_map(|dated| match normalize_record(dated) {
            Ok(record) => Some(record),
            Err((reason, detail)) => {
                report.reject(reason, &detail);
                None
            }
        })
        .collect()
}

/// Builds a [`NormalizedRecord`] from a dated row.
///
/// When the row has no total expression the total is `dead + injured`;
/// otherwise the source total is kept as-is.
///
/// # Errors
///
/// Returns the rejection reason and a short description when a count
/// cannot be parsed or the total is smaller than the dead count.
pub fn normalize_record(dated: DatedRecord) -> Result<NormalizedRecord, (RejectionReason, String)> {
    let DatedRecord { occurred_on, raw } = dated;

    let dead = parse_count("dead", &raw.dead)?;
    let injured = parse_count("injured", &raw.injured)?;
    let total = match raw.total.as_deref() {
        Some(total) => parse_count("total", total)?,
        None => dead.checked_add(injured).ok_or_else(|| {
            (
                RejectionReason::InconsistentTotal,
                format!("dead {dead} + injured {injured} overflows"),
            )
        })?,
    };

    if total < dead {
        return Err((
            RejectionReason::InconsistentTotal,
            format!("total {total} < dead {dead} at '{}'", raw.location),
        ));
    }

    let location = raw.location.trim().to_string();
    let state = raw
        .state
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .or_else(|| extract_state(&location));
    let coordinates = parse_coordinates(raw.latitude.as_deref(), raw.longitude.as_deref());

    Ok(NormalizedRecord {
        occurred_on,
        location,
        state,
        dead,
        injured,
        total,
        latitude: None,
        longitude: None,
    }
    .with_coordinates(coordinates))
}

fn parse_count(field: &str, raw: &str) -> Result<u32, (RejectionReason, String)> {
    count::extract_count(raw).map_err(|e| match e {
        CountError::Unknown => (RejectionReason::UnparseableCount, format!("{field}: unknown")),
        CountError::Invalid(value) => (
            RejectionReason::UnparseableCount,
            format!("{field}: '{value}'"),
        ),
    })
}

/// Parses source-provided coordinates. Returns `None` if either half is
/// missing, unparseable, or zero.
#[must_use]
pub fn parse_coordinates(lat: Option<&str>, lng: Option<&str>) -> Option<Coordinates> {
    let latitude = lat?.trim().parse::<f64>().ok()?;
    let longitude = lng?.trim().parse::<f64>().ok()?;
    if latitude == 0.0 || longitude == 0.0 {
        return None;
    }
    Some(Coordinates {
        latitude,
        longitude,
    })
}
