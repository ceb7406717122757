//! Add-record form handling.
//!
//! Validates user input, resolves the address, and appends the new record
//! to the record set and its snapshot. Either both change or neither does.

use shooting_map_database::DbError;
use shooting_map_database::snapshot::Snapshot;
use shooting_map_geocoder::Geocoder;
use shooting_map_geocoder::orchestrator::{AddressRejection, GeocodingOrchestrator};
use shooting_map_geocoder::throttle::Clock;
use shooting_map_incident_models::{NormalizedRecord, RecordSet, SEVERITY_THRESHOLD};
use shooting_map_ingest_models::RecordForm;
use shooting_map_normalize::{DateError, extract_state, normalize_date};

/// Why a form submission was refused. `Display` is shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// A required field was left blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The date could not be understood.
    #[error("date '{value}' is not a valid date")]
    InvalidDate {
        /// The submitted date.
        value: String,
        /// Parser error.
        #[source]
        source: DateError,
    },

    /// A count was not a non-negative whole number.
    #[error("{field} must be a whole number, got '{value}'")]
    InvalidCount {
        /// Form field name.
        field: &'static str,
        /// The submitted value.
        value: String,
    },

    /// The incident has too few victims to be tracked.
    #[error("only incidents with more than {SEVERITY_THRESHOLD} victims are tracked")]
    BelowThreshold,

    /// The address did not resolve to a US location.
    #[error("{0}")]
    Address(#[from] AddressRejection),

    /// The record could not be saved.
    #[error("could not save record: {0}")]
    Persist(#[from] DbError),
}

/// Validates `form`, appends the resulting record to `records` and
/// re-persists the whole set to `snapshot`.
///
/// The append happens under the snapshot's writer lock. If the snapshot
/// exists it is re-read first, so records another process wrote since
/// `records` was loaded are kept, and `records` is refreshed to match.
///
/// The total is always `killed + injured`. The state comes from the
/// geocoder when it reports one, otherwise from the typed address.
///
/// # Errors
///
/// Returns [`FormError`] describing the first problem found; `records`
/// and the snapshot are left untouched.
pub async fn add_record<G: Geocoder, C: Clock>(
    form: &RecordForm,
    records: &mut RecordSet,
    geocoder: &mut GeocodingOrchestrator<G, C>,
    snapshot: &Snapshot,
) -> Result<NormalizedRecord, FormError> {
    let date = required("date", &form.date)?;
    let address = required("address", &form.address)?;
    let injured = required("injured", &form.injured)?;
    let killed = required("killed", &form.killed)?;

    let occurred_on = normalize_date(date).map_err(|source| FormError::InvalidDate {
        value: date.to_owned(),
        source,
    })?;
    let injured = parse_plain_count("injured", injured)?;
    let dead = parse_plain_count("killed", killed)?;
    let total = dead
        .checked_add(injured)
        .ok_or_else(|| FormError::InvalidCount {
            field: "injured",
            value: injured.to_string(),
        })?;

    if total <= SEVERITY_THRESHOLD {
        return Err(FormError::BelowThreshold);
    }

    let found = geocoder.resolve_us_address(address).await?;

    let state = found
        .state
        .clone()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| extract_state(address));

    let record = NormalizedRecord {
        occurred_on,
        location: address.to_owned(),
        state,
        dead,
        injured,
        total,
        latitude: None,
        longitude: None,
    }
    .with_coordinates(Some(found.coordinates()));

    let _lock = snapshot.lock_async().await?;
    let mut next = if snapshot.exists() {
        snapshot.load()?
    } else {
        records.clone()
    };
    next.push(record.clone());
    snapshot.save(&next)?;
    *records = next;

    log::info!(
        "Added incident on {} at '{}' ({} dead, {} injured)",
        record.occurred_on,
        record.location,
        record.dead,
        record.injured
    );

    Ok(record)
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, FormError> {
    let value = value.trim();
    if value.is_empty() {
        Err(FormError::MissingField(field))
    } else {
        Ok(value)
    }
}

/// Digits only: no sign, no citation markers, no ranges.
fn parse_plain_count(field: &'static str, value: &str) -> Result<u32, FormError> {
    value
        .bytes()
        .all(|b| b.is_ascii_digit())
        .then(|| value.parse::<u32>().ok())
        .flatten()
        .ok_or_else(|| FormError::InvalidCount {
            field,
            value: value.to_owned(),
        })
}
