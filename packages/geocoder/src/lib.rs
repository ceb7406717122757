#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding for shooting locations.
//!
//! Converts free-text incident locations to latitude/longitude using
//! Nominatim / `OpenStreetMap`. The provider is configured via TOML files
//! in `services/` and loaded from the [`service_registry`].
//!
//! Calls go through the [`orchestrator`], which spaces them out with a
//! [`throttle::Throttle`] and degrades failures to missing coordinates.
//! The [`Geocoder`] trait is the seam tests use to swap in a fake
//! provider.

pub mod nominatim;
pub mod orchestrator;
pub mod service_registry;
pub mod throttle;

use async_trait::async_trait;
use shooting_map_incident_models::Coordinates;
use thiserror::Error;

/// A geocoding result with coordinates and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// The matched/canonical address returned by the geocoder.
    pub display_name: Option<String>,
    /// State of the match, when the provider reports it.
    pub state: Option<String>,
    /// Country of the match, when the provider reports it.
    pub country: Option<String>,
}

impl GeocodedAddress {
    /// Returns the coordinates of the match.
    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,
}

/// A single-address geocoding provider.
///
/// Implementations do not rate limit themselves; callers go through the
/// [`orchestrator::GeocodingOrchestrator`].
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves a free-form address. Returns `Ok(None)` when the provider
    /// has no match.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request or response parsing fails.
    async fn geocode(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError>;
}

#[async_trait]
impl<G: Geocoder + ?Sized> Geocoder for std::sync::Arc<G> {
    async fn geocode(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
        (**self).geocode(query).await
    }
}
