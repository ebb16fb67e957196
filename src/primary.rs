//! Hosted routing API adapter (first provider in the chain).

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::polyline::{self, Polyline};
use crate::segments::{self, LegMeta, OverlapParams};
use crate::traits::{RouteError, RouteProvider};
use crate::types::{ProviderKind, RouteRequest, RouteResult};

const PRIMARY_TIMEOUT_SECS: u64 = 8;

#[derive(Debug, Clone)]
pub struct PrimaryConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub enabled: bool,
    pub timeout_secs: u64,
}

impl Default for PrimaryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            token: None,
            enabled: true,
            timeout_secs: PRIMARY_TIMEOUT_SECS,
        }
    }
}

/// Client for `POST {base}/api/map/route`.
#[derive(Debug, Clone)]
pub struct PrimaryRouteClient {
    config: PrimaryConfig,
    client: reqwest::blocking::Client,
    overlap: OverlapParams,
}

impl PrimaryRouteClient {
    pub fn new(config: PrimaryConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            config,
            client,
            overlap: OverlapParams::default(),
        })
    }

    fn request_body(&self, request: &RouteRequest) -> serde_json::Value {
        let mut body = json!({
            "waypoints": &request.waypoints,
            "serviceTimes": request.service_times(),
            "optimize": request.optimize,
        });
        if let Some((lat, lng)) = request.start_location {
            body["startPoint"] = json!({ "latitude": lat, "longitude": lng });
        }
        body
    }
}

impl RouteProvider for PrimaryRouteClient {
    fn name(&self) -> &'static str {
        "primary"
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn plan(&self, request: &RouteRequest) -> Result<RouteResult, RouteError> {
        let url = format!("{}/api/map/route", self.config.base_url);
        let mut http = self.client.post(url).json(&self.request_body(request));
        if let Some(token) = &self.config.token {
            http = http.bearer_auth(token);
        }

        let response = http
            .send()?
            .error_for_status()?
            .json::<PrimaryRouteResponse>()?;

        // A 200 with no usable geometry is a logical failure; the chain
        // treats it exactly like a transport failure.
        if response.coordinates.len() < 2 {
            return Err(RouteError::provider(
                self.name(),
                "response contained no usable route",
            ));
        }

        let legs: Option<Vec<LegMeta>> = response.legs.map(|legs| {
            legs.into_iter()
                .map(|leg| LegMeta {
                    distance_km: leg.distance_km,
                    duration_minutes: leg.duration_minutes,
                    points: leg.geometry.map(|encoded| {
                        Polyline::decode(&encoded, polyline::DEFAULT_PRECISION).into_points()
                    }),
                })
                .collect()
        });

        let segments = segments::build_segments(
            &request.waypoints,
            &response.coordinates,
            legs.as_deref(),
            response.distance_km,
            response.duration_minutes,
            &self.overlap,
        );

        Ok(RouteResult::assemble(
            request.waypoints.clone(),
            response.coordinates,
            response.distance_km,
            response.duration_minutes,
            segments,
            ProviderKind::Primary,
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrimaryRouteResponse {
    #[serde(default)]
    coordinates: Vec<(f64, f64)>,
    #[serde(default)]
    distance_km: f64,
    #[serde(default)]
    duration_minutes: u32,
    legs: Option<Vec<PrimaryLeg>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrimaryLeg {
    #[serde(default)]
    distance_km: f64,
    #[serde(default)]
    duration_minutes: f64,
    /// Encoded per-leg polyline, when the provider reports one.
    geometry: Option<String>,
}
