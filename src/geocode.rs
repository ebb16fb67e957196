//! Geocoding client: address to coordinates with a confidence score.
//!
//! `GeocodeClient` normalizes the gateway's geocoding responses into
//! `GeocodeResult` and never lets provider field names leak past this
//! module. The HTTP calls sit behind the `GeocodeTransport` seam so the
//! bulk strategy and normalization are testable with injected transports.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Batches up to this size fan out as individual parallel calls; larger
/// batches go through the single bulk endpoint. Trades latency (many small
/// calls) against blast radius (one big call failing all).
pub const BULK_FANOUT_MAX: usize = 5;

/// Reliability below this fraction emits a non-fatal warning.
pub const LOW_RELIABILITY_THRESHOLD: f64 = 0.7;

const GEOCODE_TIMEOUT_SECS: u64 = 8;

/// Request options forwarded to the geocoding endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub autocomplete: bool,
    pub fuzzy_match: bool,
    pub limit: u32,
}

impl Default for GeocodeOptions {
    fn default() -> Self {
        Self {
            language: None,
            country: None,
            autocomplete: false,
            fuzzy_match: true,
            limit: 5,
        }
    }
}

/// Coarse confidence bucket for display purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyLevel {
    Unknown,
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl AccuracyLevel {
    /// Monotonic bucketing of a [0, 1] confidence score. The level never
    /// claims more confidence than the score supports.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            AccuracyLevel::VeryHigh
        } else if score >= 0.75 {
            AccuracyLevel::High
        } else if score >= 0.5 {
            AccuracyLevel::Medium
        } else if score >= 0.3 {
            AccuracyLevel::Low
        } else if score > 0.0 {
            AccuracyLevel::VeryLow
        } else {
            AccuracyLevel::Unknown
        }
    }
}

/// A normalized geocoding result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResult {
    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: String,
    pub place_type: String,
    pub accuracy_score: f64,
    pub accuracy_level: AccuracyLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f64>,
    pub provider: String,
    pub from_cache: bool,
}

/// Caller-visible request metadata, including non-fatal warnings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GeocodeMeta {
    pub query: String,
    pub reliability: f64,
    pub warnings: Vec<String>,
}

/// A geocode result with its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Geocoded {
    pub result: GeocodeResult,
    pub meta: GeocodeMeta,
}

/// One entry of a bulk geocode, paired with its source address. A failed
/// address never fails the batch.
#[derive(Debug)]
pub struct BulkGeocodeEntry {
    pub address: String,
    pub outcome: Result<Geocoded, GeocodeError>,
}

/// Geocoding failure for a single query.
#[derive(Debug)]
pub struct GeocodeError {
    pub message: String,
    pub details: Vec<String>,
    pub query: String,
}

impl GeocodeError {
    pub fn new(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: Vec::new(),
            query: query.into(),
        }
    }

    pub fn transport(query: impl Into<String>, err: reqwest::Error) -> Self {
        Self {
            message: format!("geocoding request failed: {}", err),
            details: Vec::new(),
            query: query.into(),
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }
}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "geocode '{}': {}", self.query, self.message)
    }
}

impl Error for GeocodeError {}

/// Raw gateway envelope, private to this module's normalization.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGeocodeEnvelope {
    #[serde(default = "default_true")]
    pub success: bool,
    pub result: Option<RawGeocodeResult>,
    pub meta: Option<RawGeocodeMeta>,
    #[serde(default)]
    pub all_results: Option<serde_json::Value>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGeocodeResult {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub formatted_address: String,
    #[serde(default)]
    pub place_type: String,
    #[serde(default)]
    pub accuracy: RawAccuracy,
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAccuracy {
    pub score: Option<f64>,
    pub level: Option<String>,
    pub confidence: Option<f64>,
    pub relevance: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGeocodeMeta {
    pub query: Option<String>,
    pub reliability: Option<f64>,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub cache_status: Option<String>,
}

/// Transport seam over the geocoding endpoints.
pub trait GeocodeTransport: Sync {
    fn geocode(
        &self,
        address: &str,
        options: &GeocodeOptions,
    ) -> Result<RawGeocodeEnvelope, GeocodeError>;

    fn reverse_geocode(
        &self,
        longitude: f64,
        latitude: f64,
        options: &GeocodeOptions,
    ) -> Result<serde_json::Value, GeocodeError>;

    fn geocode_bulk(
        &self,
        addresses: &[String],
        options: &GeocodeOptions,
    ) -> Result<Vec<RawGeocodeEnvelope>, GeocodeError>;
}

/// HTTP transport against the gateway's geocoding endpoints.
#[derive(Debug, Clone)]
pub struct HttpGeocodeTransport {
    base_url: String,
    token: Option<String>,
    client: reqwest::blocking::Client,
}

impl HttpGeocodeTransport {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(GEOCODE_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            token,
            client,
        })
    }

    fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
        query: &str,
    ) -> Result<reqwest::blocking::Response, GeocodeError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.post(url).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
            .send()
            .and_then(|resp| resp.error_for_status())
            .map_err(|err| GeocodeError::transport(query, err))
    }
}

impl GeocodeTransport for HttpGeocodeTransport {
    fn geocode(
        &self,
        address: &str,
        options: &GeocodeOptions,
    ) -> Result<RawGeocodeEnvelope, GeocodeError> {
        let body = json!({ "address": address, "options": options });
        self.post("/api/map/geocode", &body, address)?
            .json::<RawGeocodeEnvelope>()
            .map_err(|err| GeocodeError::transport(address, err))
    }

    fn reverse_geocode(
        &self,
        longitude: f64,
        latitude: f64,
        options: &GeocodeOptions,
    ) -> Result<serde_json::Value, GeocodeError> {
        let query = format!("{},{}", longitude, latitude);
        let body = json!({
            "longitude": longitude,
            "latitude": latitude,
            "options": options,
        });
        self.post("/api/map/reverse-geocode", &body, &query)?
            .json::<serde_json::Value>()
            .map_err(|err| GeocodeError::transport(&query, err))
    }

    fn geocode_bulk(
        &self,
        addresses: &[String],
        options: &GeocodeOptions,
    ) -> Result<Vec<RawGeocodeEnvelope>, GeocodeError> {
        let query = format!("bulk({})", addresses.len());
        let body = json!({ "addresses": addresses, "options": options });
        self.post("/api/map/geocode/bulk", &body, &query)?
            .json::<Vec<RawGeocodeEnvelope>>()
            .map_err(|err| GeocodeError::transport(&query, err))
    }
}

/// Geocoding client over a transport.
#[derive(Debug, Clone)]
pub struct GeocodeClient<T: GeocodeTransport> {
    transport: T,
}

impl GeocodeClient<HttpGeocodeTransport> {
    /// Client against the gateway's geocoding endpoints.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::with_transport(HttpGeocodeTransport::new(
            base_url, token,
        )?))
    }
}

impl<T: GeocodeTransport> GeocodeClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// Resolves a free-text address to a location with a confidence score.
    ///
    /// Low-reliability results (< 70%) succeed with a warning attached to
    /// `meta.warnings`; the caller decides whether to prompt the user.
    pub fn geocode_address(
        &self,
        address: &str,
        options: &GeocodeOptions,
    ) -> Result<Geocoded, GeocodeError> {
        let envelope = self.transport.geocode(address, options)?;
        normalize(address, envelope)
    }

    /// Resolves coordinates to an address. The payload shape is
    /// provider-defined and passed through untouched.
    pub fn reverse_geocode(
        &self,
        longitude: f64,
        latitude: f64,
        options: &GeocodeOptions,
    ) -> Result<serde_json::Value, GeocodeError> {
        self.transport.reverse_geocode(longitude, latitude, options)
    }

    /// Geocodes a batch, pairing each outcome with its source address.
    ///
    /// Up to `BULK_FANOUT_MAX` addresses fan out as parallel individual
    /// calls with all-settle semantics; larger batches delegate to the bulk
    /// endpoint. In both paths one bad address never fails the batch.
    pub fn bulk_geocode(
        &self,
        addresses: &[String],
        options: &GeocodeOptions,
    ) -> Result<Vec<BulkGeocodeEntry>, GeocodeError> {
        if addresses.len() <= BULK_FANOUT_MAX {
            let entries = addresses
                .par_iter()
                .map(|address| BulkGeocodeEntry {
                    address: address.clone(),
                    outcome: self
                        .transport
                        .geocode(address, options)
                        .and_then(|envelope| normalize(address, envelope)),
                })
                .collect();
            return Ok(entries);
        }

        let envelopes = self.transport.geocode_bulk(addresses, options)?;
        let entries = addresses
            .iter()
            .enumerate()
            .map(|(index, address)| {
                let outcome = match envelopes.get(index) {
                    Some(envelope) => normalize(address, envelope.clone()),
                    None => Err(GeocodeError::new(
                        address,
                        "bulk response missing entry for address",
                    )),
                };
                BulkGeocodeEntry {
                    address: address.clone(),
                    outcome,
                }
            })
            .collect();
        Ok(entries)
    }
}

/// Normalizes a raw envelope into the unified result shape.
fn normalize(query: &str, envelope: RawGeocodeEnvelope) -> Result<Geocoded, GeocodeError> {
    let raw_meta = envelope.meta.unwrap_or_default();

    let raw = match envelope.result {
        Some(raw) if envelope.success => raw,
        _ => {
            return Err(GeocodeError::new(query, "no geocoding result")
                .with_details(raw_meta.warnings));
        }
    };

    let score = raw
        .accuracy
        .score
        .or(raw.accuracy.relevance)
        .or(raw.accuracy.confidence)
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);

    let reliability = raw_meta.reliability.unwrap_or(score);
    let mut warnings = raw_meta.warnings;
    if reliability < LOW_RELIABILITY_THRESHOLD {
        warnings.push(format!(
            "low geocoding reliability ({:.0}%) for '{}'",
            reliability * 100.0,
            query
        ));
        tracing::debug!(query, reliability, "low-reliability geocode");
    }

    let result = GeocodeResult {
        latitude: raw.latitude,
        longitude: raw.longitude,
        formatted_address: raw.formatted_address,
        place_type: raw.place_type,
        accuracy_score: score,
        accuracy_level: AccuracyLevel::from_score(score),
        confidence: raw.accuracy.confidence,
        relevance: raw.accuracy.relevance,
        provider: raw.provider.unwrap_or_else(|| "primary".to_string()),
        from_cache: raw_meta.cache_status.as_deref() == Some("hit"),
    };

    Ok(Geocoded {
        result,
        meta: GeocodeMeta {
            query: raw_meta.query.unwrap_or_else(|| query.to_string()),
            reliability,
            warnings,
        },
    })
}
