//! Nominatim / `OpenStreetMap` geocoder client.
//!
//! Nominatim has strict rate limits: **1 request per second** maximum on
//! the public instance, and requests without an identifying User-Agent
//! are refused.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use async_trait::async_trait;

use crate::service_registry::{GeocodingService, ProviderConfig};
use crate::{GeocodeError, GeocodedAddress, Geocoder};

/// Fallback User-Agent when the service config does not set one.
const DEFAULT_USER_AGENT: &str = "shooting-map";

/// Free-form Nominatim search client.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// Creates a client for the given search endpoint.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_owned(),
        }
    }

    /// Builds a client from a service configuration, applying its
    /// User-Agent.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn from_service(service: &GeocodingService) -> Result<Self, GeocodeError> {
        let ProviderConfig::Nominatim {
            base_url,
            user_agent,
            ..
        } = &service.provider;

        let client = reqwest::Client::builder()
            .user_agent(user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self::new(client, base_url))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    /// Geocodes a free-form query.
    ///
    /// The caller is responsible for rate limiting (see `rate_limit_ms` in
    /// the service TOML configuration).
    async fn geocode(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("format", "jsonv2"),
                ("addressdetails", "1"),
                ("limit", "1"),
            ])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        let body: serde_json::Value = resp.error_for_status()?.json().await?;
        parse_response(&body)
    }
}

/// Parses Nominatim JSON response.
fn parse_response(body: &serde_json::Value) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let lat = first["lat"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lat in Nominatim response".to_string(),
        })?;

    let lon = first["lon"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lon in Nominatim response".to_string(),
        })?;

    let display_name = first["display_name"].as_str().map(String::from);
    let state = first["address"]["state"].as_str().map(String::from);
    let country = first["address"]["country"].as_str().map(String::from);

    Ok(Some(GeocodedAddress {
        latitude: lat,
        longitude: lon,
        display_name,
        state,
        country,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nominatim_result() {
        let body = serde_json::json!([{
            "lat": "39.7589",
            "lon": "-84.1916",
            "display_name": "Dayton, Montgomery County, Ohio, United States",
            "address": {
                "city": "Dayton",
                "state": "Ohio",
                "country": "United States",
                "country_code": "us"
            }
        }]);
        let result = parse_response(&body).unwrap().unwrap();
        assert!((result.latitude - 39.7589).abs() < 1e-4);
        assert!((result.longitude - -84.1916).abs() < 1e-4);
        assert_eq!(result.country.as_deref(), Some("United States"));
        assert_eq!(result.state.as_deref(), Some("Ohio"));
        assert_eq!(
            result.display_name.as_deref(),
            Some("Dayton, Montgomery County, Ohio, United States")
        );
    }

    #[test]
    fn parses_result_without_address_details() {
        let body = serde_json::json!([{ "lat": "1.5", "lon": "2.5" }]);
        let result = parse_response(&body).unwrap().unwrap();
        assert!(result.country.is_none());
        assert!(result.state.is_none());
        assert!(result.display_name.is_none());
    }

    #[test]
    fn parses_nominatim_empty() {
        let body = serde_json::json!([]);
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn rejects_non_array_body() {
        let body = serde_json::json!({ "error": "Unable to geocode" });
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn rejects_missing_latitude() {
        let body = serde_json::json!([{ "lon": "2.5" }]);
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Parse { .. })
        ));
    }
}
