//! OSRM route adapter (self-hosted backup provider).

use std::time::Duration;

use serde::Deserialize;

use crate::polyline::{self, Polyline};
use crate::segments::{self, LegMeta, OverlapParams};
use crate::traits::{RouteError, RouteProvider};
use crate::types::{ProviderKind, RouteRequest, RouteResult};

const OSRM_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub enabled: bool,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "driving".to_string(),
            enabled: true,
            timeout_secs: OSRM_TIMEOUT_SECS,
        }
    }
}

/// Client for `GET {base}/route/v1/{profile}/{coords}`.
#[derive(Debug, Clone)]
pub struct OsrmRouteClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
    overlap: OverlapParams,
}

impl OsrmRouteClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            config,
            client,
            overlap: OverlapParams::default(),
        })
    }

    /// OSRM coordinate string: `lng,lat;lng,lat;...`, start location first
    /// when present.
    fn coordinate_string(request: &RouteRequest) -> String {
        let mut parts = Vec::with_capacity(request.waypoints.len() + 1);
        if let Some((lat, lng)) = request.start_location {
            parts.push(format!("{:.6},{:.6}", lng, lat));
        }
        for waypoint in &request.waypoints {
            parts.push(format!("{:.6},{:.6}", waypoint.longitude, waypoint.latitude));
        }
        parts.join(";")
    }
}

impl RouteProvider for OsrmRouteClient {
    fn name(&self) -> &'static str {
        "osrm"
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn plan(&self, request: &RouteRequest) -> Result<RouteResult, RouteError> {
        let url = format!(
            "{}/route/v1/{}/{}?overview=full&steps=true&annotations=true",
            self.config.base_url,
            self.config.profile,
            Self::coordinate_string(request)
        );

        let response = self
            .client
            .get(url)
            .send()?
            .error_for_status()?
            .json::<OsrmRouteResponse>()?;

        if response.code != "Ok" {
            return Err(RouteError::provider(
                self.name(),
                format!("OSRM returned code {}", response.code),
            ));
        }
        let Some(route) = response.routes.into_iter().next() else {
            return Err(RouteError::provider(self.name(), "OSRM returned no routes"));
        };

        let coordinates =
            Polyline::decode(&route.geometry, polyline::DEFAULT_PRECISION).into_points();
        if coordinates.len() < 2 {
            return Err(RouteError::provider(
                self.name(),
                "OSRM route geometry was empty",
            ));
        }

        let distance_km = route.distance / 1000.0;
        let duration_minutes = (route.duration / 60.0).round() as u32;

        // With a prepended start location OSRM reports one extra leading leg
        // (start -> first waypoint); segments only cover waypoint pairs.
        let skip = usize::from(request.start_location.is_some());
        let legs: Vec<LegMeta> = route
            .legs
            .into_iter()
            .skip(skip)
            .map(|leg| LegMeta {
                distance_km: leg.distance / 1000.0,
                duration_minutes: leg.duration / 60.0,
                points: leg_points(&leg.steps),
            })
            .collect();

        let segments = segments::build_segments(
            &request.waypoints,
            &coordinates,
            Some(&legs),
            distance_km,
            duration_minutes,
            &self.overlap,
        );

        Ok(RouteResult::assemble(
            request.waypoints.clone(),
            coordinates,
            distance_km,
            duration_minutes,
            segments,
            ProviderKind::Osrm,
        ))
    }
}

/// Concatenates a leg's step geometries into one decoded point sequence.
fn leg_points(steps: &[OsrmStep]) -> Option<Vec<(f64, f64)>> {
    if steps.is_empty() {
        return None;
    }
    let mut points: Vec<(f64, f64)> = Vec::new();
    for step in steps {
        let decoded =
            Polyline::decode(&step.geometry, polyline::DEFAULT_PRECISION).into_points();
        // Adjacent steps share their joint point; skip the duplicate.
        let duplicate_joint = points.last().is_some() && points.last() == decoded.first();
        if duplicate_joint {
            points.extend(decoded.into_iter().skip(1));
        } else {
            points.extend(decoded);
        }
    }
    (points.len() >= 2).then_some(points)
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    #[serde(default)]
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    /// Encoded polyline (precision 5 with `overview=full`).
    geometry: String,
    /// Meters.
    distance: f64,
    /// Seconds.
    duration: f64,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    distance: f64,
    duration: f64,
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    #[serde(default)]
    geometry: String,
}
