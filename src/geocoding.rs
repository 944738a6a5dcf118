//! Reverse geocoding: turning a tapped coordinate into a named place.
//!
//! DESIGN
//! ======
//! Place lookup is best effort and must never fail the event that triggered
//! it. [`PlaceResolver::resolve`] is therefore infallible: it walks a
//! fallback ladder and always produces a [`Place`].
//!
//!   1. If the connectivity gate reports offline, skip the network entirely
//!      and return the placeholder.
//!   2. Ask the geocoder for the feature at the coordinate (building-level
//!      zoom). A hit wins.
//!   3. On a miss, retry at locality zoom so open water or wilderness taps
//!      still get a nearby town name.
//!   4. Anything else, including transport errors, degrades to the
//!      placeholder named "unknown place".
//!
//! A resolved place is then enriched with extended tags in a second request
//! keyed by the geocoder's place id. Tag enrichment failing leaves `tags`
//! as `None`; a place can therefore distinguish "tags never fetched" from
//! "fetched, none present" (`Some` of an empty map).
//!
//! [`HttpGeocoder`] speaks the Nominatim wire format. Response parsing is
//! split into pure functions so it can be tested without a server.

#[cfg(test)]
#[path = "geocoding_test.rs"]
mod geocoding_test;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::connectivity::Connectivity;
use crate::geo::LngLat;

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Zoom for feature-level reverse lookups (buildings, POIs).
const FEATURE_ZOOM: u8 = 18;
/// Zoom for the locality fallback pass (cities, towns).
const LOCALITY_ZOOM: u8 = 10;

/// Address keys checked, in order, when extracting a locality name.
const LOCALITY_KEYS: [&str; 5] = ["city", "town", "village", "municipality", "county"];

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("geocoder request failed: {0}")]
    Request(String),

    /// The geocoder answered with a non-success status.
    #[error("geocoder returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not the JSON shape we expect.
    #[error("could not parse geocoder response: {0}")]
    Parse(String),

    #[error("could not build http client: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// PLACE MODEL
// =============================================================================

/// Where a [`Place`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceSource {
    /// Feature-level reverse lookup hit.
    Geocoded,
    /// Only the locality pass produced a result.
    LocalityFallback,
    /// No lookup succeeded (or none was attempted).
    Placeholder,
}

/// A named place attached to a tapped coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Geocoder-internal id, used for tag enrichment. `None` for
    /// placeholders.
    pub place_id: Option<i64>,
    /// Short name, e.g. "Brandenburg Gate".
    pub name: String,
    /// Full display label, e.g. "Brandenburg Gate, Pariser Platz, Berlin".
    pub label: String,
    /// Enclosing city/town/village, when the geocoder reports one.
    pub locality: Option<String>,
    /// The place's own coordinate when known, otherwise the requested one.
    pub coordinate: LngLat,
    pub source: PlaceSource,
    /// Extended tags from enrichment. `None` means enrichment did not run
    /// or failed; `Some` of an empty map means it ran and found nothing.
    pub tags: Option<HashMap<String, String>>,
}

impl Place {
    /// The stand-in used whenever no lookup succeeds.
    #[must_use]
    pub fn placeholder(coordinate: LngLat) -> Self {
        Self {
            place_id: None,
            name: "unknown place".to_owned(),
            label: "unknown place".to_owned(),
            locality: None,
            coordinate,
            source: PlaceSource::Placeholder,
            tags: None,
        }
    }
}

// =============================================================================
// GEOCODER TRAIT
// =============================================================================

/// The lookups [`PlaceResolver`] needs from a geocoding backend.
#[async_trait]
pub trait ReverseGeocode: Send + Sync {
    /// Feature-level reverse lookup. `Ok(None)` means the geocoder had no
    /// answer for the coordinate.
    ///
    /// # Errors
    ///
    /// Returns an error when the request or response handling fails.
    async fn reverse_feature(&self, coordinate: LngLat) -> Result<Option<Place>, GeocodeError>;

    /// Locality-level reverse lookup, used as the fallback pass.
    ///
    /// # Errors
    ///
    /// Returns an error when the request or response handling fails.
    async fn reverse_locality(&self, coordinate: LngLat) -> Result<Option<Place>, GeocodeError>;

    /// Extended tags for a previously resolved place.
    ///
    /// # Errors
    ///
    /// Returns an error when the request or response handling fails.
    async fn extended_tags(&self, place_id: i64) -> Result<HashMap<String, String>, GeocodeError>;
}

// =============================================================================
// CONFIG
// =============================================================================

/// Geocoder endpoint and HTTP behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocoderConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    /// Value for the `accept-language` query parameter.
    pub accept_language: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            accept_language: DEFAULT_LANGUAGE.to_owned(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl GeocoderConfig {
    /// Read configuration from `MAPBRIDGE_GEOCODER_*` environment variables,
    /// falling back to defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = std::env::var("MAPBRIDGE_GEOCODER_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_owned())
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        let accept_language = std::env::var("MAPBRIDGE_GEOCODER_LANGUAGE")
            .unwrap_or_else(|_| DEFAULT_LANGUAGE.to_owned());
        Self {
            base_url,
            accept_language,
            request_timeout: env_secs(
                "MAPBRIDGE_GEOCODER_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
            connect_timeout: env_secs(
                "MAPBRIDGE_GEOCODER_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            ),
        }
    }
}

fn env_secs(key: &str, default_secs: u64) -> Duration {
    let secs = std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default_secs);
    Duration::from_secs(secs)
}

// =============================================================================
// HTTP GEOCODER
// =============================================================================

/// Nominatim-compatible HTTP geocoder.
pub struct HttpGeocoder {
    http: reqwest::Client,
    config: GeocoderConfig,
}

impl HttpGeocoder {
    /// # Errors
    ///
    /// Returns [`GeocodeError::HttpClientBuild`] when the HTTP client cannot
    /// be constructed.
    pub fn new(config: GeocoderConfig) -> Result<Self, GeocodeError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mapbridge/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|err| GeocodeError::HttpClientBuild(err.to_string()))?;
        Ok(Self { http, config })
    }

    async fn reverse(&self, coordinate: LngLat, zoom: u8) -> Result<String, GeocodeError> {
        let url = format!("{}/reverse", self.config.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_owned()),
                ("lat", coordinate.lat.to_string()),
                ("lon", coordinate.lng.to_string()),
                ("zoom", zoom.to_string()),
                ("accept-language", self.config.accept_language.clone()),
            ])
            .send()
            .await
            .map_err(|err| GeocodeError::Request(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| GeocodeError::Request(err.to_string()))?;
        if !status.is_success() {
            return Err(GeocodeError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl ReverseGeocode for HttpGeocoder {
    async fn reverse_feature(&self, coordinate: LngLat) -> Result<Option<Place>, GeocodeError> {
        let body = self.reverse(coordinate, FEATURE_ZOOM).await?;
        parse_reverse_response(&body, coordinate, PlaceSource::Geocoded)
    }

    async fn reverse_locality(&self, coordinate: LngLat) -> Result<Option<Place>, GeocodeError> {
        let body = self.reverse(coordinate, LOCALITY_ZOOM).await?;
        parse_reverse_response(&body, coordinate, PlaceSource::LocalityFallback)
    }

    async fn extended_tags(&self, place_id: i64) -> Result<HashMap<String, String>, GeocodeError> {
        let url = format!("{}/details", self.config.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("format", "json".to_owned()),
                ("place_id", place_id.to_string()),
            ])
            .send()
            .await
            .map_err(|err| GeocodeError::Request(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| GeocodeError::Request(err.to_string()))?;
        if !status.is_success() {
            return Err(GeocodeError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_details_response(&body)
    }
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

/// Parse a `/reverse` response into a [`Place`].
///
/// `Ok(None)` covers the geocoder's "nothing here" answer, which arrives as
/// a `200` with an `error` key, and responses carrying no usable name. The
/// response coordinate falls back to `requested` when missing or malformed.
///
/// # Errors
///
/// Returns [`GeocodeError::Parse`] when the body is not a JSON object.
pub(crate) fn parse_reverse_response(
    body: &str,
    requested: LngLat,
    source: PlaceSource,
) -> Result<Option<Place>, GeocodeError> {
    let value: Value =
        serde_json::from_str(body).map_err(|err| GeocodeError::Parse(err.to_string()))?;
    let Some(object) = value.as_object() else {
        return Err(GeocodeError::Parse("response is not an object".to_owned()));
    };
    if object.contains_key("error") {
        return Ok(None);
    }

    let label = object
        .get("display_name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let name = match object.get("name").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ => label.split(',').next().unwrap_or_default().trim().to_owned(),
    };
    if name.is_empty() && label.is_empty() {
        return Ok(None);
    }

    let locality = object.get("address").and_then(Value::as_object).and_then(|address| {
        LOCALITY_KEYS.iter().find_map(|key| {
            address
                .get(*key)
                .and_then(Value::as_str)
                .map(ToOwned::to_owned)
        })
    });

    Ok(Some(Place {
        place_id: object.get("place_id").and_then(Value::as_i64),
        name,
        label,
        locality,
        coordinate: LngLat::new(
            coordinate_field(object.get("lon"), requested.lng),
            coordinate_field(object.get("lat"), requested.lat),
        ),
        source,
        tags: None,
    }))
}

/// Nominatim sends coordinates as strings; fall back to the requested value
/// on anything else.
fn coordinate_field(value: Option<&Value>, fallback: f64) -> f64 {
    value
        .and_then(Value::as_str)
        .and_then(|text| text.parse().ok())
        .unwrap_or(fallback)
}

/// Parse a `/details` response into an extended tag map. A missing or null
/// `extratags` object means the place has no tags.
///
/// # Errors
///
/// Returns [`GeocodeError::Parse`] when the body is not a JSON object.
pub(crate) fn parse_details_response(body: &str) -> Result<HashMap<String, String>, GeocodeError> {
    let value: Value =
        serde_json::from_str(body).map_err(|err| GeocodeError::Parse(err.to_string()))?;
    let Some(object) = value.as_object() else {
        return Err(GeocodeError::Parse("response is not an object".to_owned()));
    };

    let tags = object
        .get("extratags")
        .and_then(Value::as_object)
        .map(|extratags| {
            extratags
                .iter()
                .filter_map(|(key, value)| {
                    value.as_str().map(|text| (key.clone(), text.to_owned()))
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(tags)
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Infallible place lookup used by the controller's tap handling.
#[derive(Clone)]
pub struct PlaceResolver {
    geocoder: Arc<dyn ReverseGeocode>,
    connectivity: Arc<dyn Connectivity>,
}

impl PlaceResolver {
    #[must_use]
    pub fn new(geocoder: Arc<dyn ReverseGeocode>, connectivity: Arc<dyn Connectivity>) -> Self {
        Self {
            geocoder,
            connectivity,
        }
    }

    /// Resolve `coordinate` to a place, degrading to the placeholder on any
    /// failure. Never errors, never panics.
    pub async fn resolve(&self, coordinate: LngLat) -> Place {
        if !self.connectivity.is_online() {
            tracing::debug!(
                lng = coordinate.lng,
                lat = coordinate.lat,
                "offline, skipping place lookup"
            );
            return Place::placeholder(coordinate);
        }

        let mut place = match self.geocoder.reverse_feature(coordinate).await {
            Ok(Some(place)) => place,
            Ok(None) => match self.geocoder.reverse_locality(coordinate).await {
                Ok(Some(place)) => place,
                Ok(None) => return Place::placeholder(coordinate),
                Err(err) => {
                    tracing::warn!(error = %err, "locality lookup failed");
                    return Place::placeholder(coordinate);
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "reverse geocode failed");
                return Place::placeholder(coordinate);
            }
        };

        if let Some(place_id) = place.place_id {
            match self.geocoder.extended_tags(place_id).await {
                Ok(tags) => place.tags = Some(tags),
                Err(err) => {
                    tracing::warn!(error = %err, place_id, "extended tag lookup failed");
                }
            }
        }
        place
    }
}

impl std::fmt::Debug for PlaceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaceResolver").finish_non_exhaustive()
    }
}
