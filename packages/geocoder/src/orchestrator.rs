//! Rate-limited geocoding with fallback and US validation.
//!
//! [`GeocodingOrchestrator`] is the only path the pipeline and the
//! add-record form use to reach a [`Geocoder`]. Every call, fallback
//! retries included, waits on the same [`Throttle`], so the provider never
//! sees two requests closer together than the configured interval.

use std::time::Duration;

use shooting_map_incident_models::Coordinates;

use crate::service_registry::GeocodingService;
use crate::throttle::{Clock, SystemClock, Throttle};
use crate::{GeocodeError, GeocodedAddress, Geocoder};

/// Country names accepted as the United States (compared
/// case-insensitively).
const US_COUNTRY_NAMES: &[&str] = &["united states", "usa", "u.s.a.", "united states of america"];

/// Why an address typed into the add-record form was refused.
#[derive(Debug, thiserror::Error)]
pub enum AddressRejection {
    /// The geocoder has no match.
    #[error("address could not be found")]
    NotFound,

    /// The match lies outside the United States.
    #[error("address resolves outside the United States ({country})")]
    OutsideUnitedStates {
        /// Country reported for the match.
        country: String,
    },

    /// The geocoder could not be reached.
    #[error("geocoding service unavailable: {0}")]
    Unavailable(#[source] GeocodeError),
}

/// Settings for a [`GeocodingOrchestrator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeocodeOptions {
    /// Minimum spacing between the start of two calls.
    pub min_interval: Duration,
    /// Retry a miss once without the leading address component.
    pub fallback: bool,
}

impl GeocodeOptions {
    /// Options from a registry service entry.
    #[must_use]
    pub const fn from_service(service: &GeocodingService) -> Self {
        Self {
            min_interval: service.min_interval(),
            fallback: service.fallback(),
        }
    }
}

/// Sequential, throttled front for a [`Geocoder`].
#[derive(Debug)]
pub struct GeocodingOrchestrator<G, C: Clock = SystemClock> {
    geocoder: G,
    throttle: Throttle<C>,
    fallback: bool,
    calls: u64,
}

impl<G: Geocoder> GeocodingOrchestrator<G, SystemClock> {
    /// Creates an orchestrator on the wall clock.
    #[must_use]
    pub const fn new(geocoder: G, options: GeocodeOptions) -> Self {
        Self::with_clock(geocoder, options, SystemClock)
    }
}

impl<G: Geocoder, C: Clock> GeocodingOrchestrator<G, C> {
    /// Creates an orchestrator on the given clock.
    #[must_use]
    pub const fn with_clock(geocoder: G, options: GeocodeOptions, clock: C) -> Self {
        Self {
            geocoder,
            throttle: Throttle::with_clock(options.min_interval, clock),
            fallback: options.fallback,
            calls: 0,
        }
    }

    /// Number of provider calls issued so far.
    #[must_use]
    pub const fn calls(&self) -> u64 {
        self.calls
    }

    async fn lookup(&mut self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
        self.throttle.wait().await;
        self.calls += 1;
        self.geocoder.geocode(query).await
    }

    /// Resolves a location to coordinates.
    ///
    /// Misses and provider errors yield `None` rather than an error. With
    /// fallback enabled a miss is retried once with the leading
    /// comma-separated component dropped.
    pub async fn resolve_location(&mut self, address: &str) -> Option<Coordinates> {
        let address = address.trim();
        if address.is_empty() {
            return None;
        }

        if let Some(found) = self.try_resolve(address).await {
            return Some(found);
        }

        if self.fallback
            && let Some(shorter) = fallback_query(address)
        {
            log::debug!("Retrying '{address}' as '{shorter}'");
            return self.try_resolve(shorter).await;
        }

        None
    }

    async fn try_resolve(&mut self, query: &str) -> Option<Coordinates> {
        match self.lookup(query).await {
            Ok(Some(found)) => Some(found.coordinates()),
            Ok(None) => {
                log::debug!("No geocoding match for '{query}'");
                None
            }
            Err(e) => {
                log::warn!("Geocoding '{query}' failed: {e}");
                None
            }
        }
    }

    /// Resolves a user-entered address and checks that it lies in the
    /// United States.
    ///
    /// No fallback is attempted; the address must resolve as typed.
    ///
    /// # Errors
    ///
    /// Returns [`AddressRejection`] if the address has no match, resolves
    /// to another country, or the geocoder is unreachable.
    pub async fn resolve_us_address(
        &mut self,
        address: &str,
    ) -> Result<GeocodedAddress, AddressRejection> {
        let found = self
            .lookup(address.trim())
            .await
            .map_err(AddressRejection::Unavailable)?
            .ok_or(AddressRejection::NotFound)?;

        match found.country.as_deref() {
            Some(country) if is_united_states(country) => Ok(found),
            other => Err(AddressRejection::OutsideUnitedStates {
                country: other.unwrap_or("unknown").to_owned(),
            }),
        }
    }
}

/// Drops the leading comma-separated component. Returns `None` when that
/// would leave nothing.
fn fallback_query(address: &str) -> Option<&str> {
    let (_, rest) = address.split_once(',')?;
    let rest = rest.trim();
    (!rest.is_empty()).then_some(rest)
}

fn is_united_states(country: &str) -> bool {
    let country = country.trim();
    US_COUNTRY_NAMES
        .iter()
        .any(|name| name.eq_ignore_ascii_case(country))
}
