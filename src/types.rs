//! Core route domain types.
//!
//! These are the shapes exchanged with callers (e.g. the map renderer).
//! Provider-specific wire formats live inside the provider adapters and are
//! normalized into these types at the boundary.

use serde::{Deserialize, Serialize};

/// Number of distinct segment colors the renderer cycles through.
pub const SEGMENT_PALETTE_SIZE: usize = 7;

/// A stop the route must visit.
///
/// Identity is `id`; input order is the caller's preferred visiting order
/// unless the request asks the provider to optimize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub is_customer_location: bool,
    /// On-site service duration at this stop, in minutes.
    #[serde(default)]
    pub service_time_minutes: u32,
}

impl Waypoint {
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
            is_customer_location: false,
            service_time_minutes: 0,
        }
    }

    pub fn with_service_time(mut self, minutes: u32) -> Self {
        self.service_time_minutes = minutes;
        self
    }

    pub fn location(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// A route planning request as handed to the provider chain.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub waypoints: Vec<Waypoint>,
    /// Pass-through hint to the provider; only the local mock reorders.
    pub optimize: bool,
    /// Optional departure point (e.g. the technician's current location),
    /// prepended to the driven path but not counted as a waypoint.
    pub start_location: Option<(f64, f64)>,
}

impl RouteRequest {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self {
            waypoints,
            optimize: false,
            start_location: None,
        }
    }

    pub fn optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn starting_at(mut self, location: (f64, f64)) -> Self {
        self.start_location = Some(location);
        self
    }

    /// Per-stop service durations in waypoint order, in minutes.
    pub fn service_times(&self) -> Vec<u32> {
        self.waypoints
            .iter()
            .map(|w| w.service_time_minutes)
            .collect()
    }

    pub fn service_time_total_minutes(&self) -> u32 {
        self.waypoints.iter().map(|w| w.service_time_minutes).sum()
    }
}

/// Which provider produced a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Primary,
    Osrm,
    Mock,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Primary => "primary",
            ProviderKind::Osrm => "osrm",
            ProviderKind::Mock => "mock",
        }
    }
}

/// One leg of a route between two consecutive waypoints, ready to render.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSegment {
    pub index: usize,
    pub coordinates: Vec<(f64, f64)>,
    pub distance_km: f64,
    pub duration_minutes: u32,
    pub start_waypoint: Waypoint,
    pub end_waypoint: Waypoint,
    /// True when this leg retraces an earlier leg's path (backtracking).
    pub is_return_segment: bool,
    /// `index mod 7`; purely a rendering hint, stable for a given index.
    pub suggested_color_index: usize,
}

impl RouteSegment {
    pub fn new(
        index: usize,
        coordinates: Vec<(f64, f64)>,
        distance_km: f64,
        duration_minutes: u32,
        start_waypoint: Waypoint,
        end_waypoint: Waypoint,
    ) -> Self {
        Self {
            index,
            coordinates,
            distance_km,
            duration_minutes,
            start_waypoint,
            end_waypoint,
            is_return_segment: false,
            suggested_color_index: index % SEGMENT_PALETTE_SIZE,
        }
    }
}

/// A planned route, normalized across providers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    /// Waypoints in visiting order; index is positional.
    pub waypoints: Vec<Waypoint>,
    pub coordinates: Vec<(f64, f64)>,
    pub distance_km: f64,
    /// Travel time only, in minutes.
    pub duration_minutes: u32,
    pub segments: Vec<RouteSegment>,
    pub service_time_total_minutes: u32,
    /// Always `duration_minutes + service_time_total_minutes`.
    pub total_time_minutes: u32,
    pub provider: ProviderKind,
    /// Set by the chain when a degraded (mock) result was served.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl RouteResult {
    /// Assembles a result, computing the time totals. The totals are never
    /// set independently.
    pub fn assemble(
        waypoints: Vec<Waypoint>,
        coordinates: Vec<(f64, f64)>,
        distance_km: f64,
        duration_minutes: u32,
        segments: Vec<RouteSegment>,
        provider: ProviderKind,
    ) -> Self {
        let service_time_total_minutes =
            waypoints.iter().map(|w| w.service_time_minutes).sum::<u32>();
        Self {
            waypoints,
            coordinates,
            distance_km,
            duration_minutes,
            segments,
            service_time_total_minutes,
            total_time_minutes: duration_minutes + service_time_total_minutes,
            provider,
            warning: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_index_cycles_over_palette() {
        let a = Waypoint::new("a", 0.0, 0.0);
        let b = Waypoint::new("b", 1.0, 1.0);
        for index in 0..20 {
            let segment =
                RouteSegment::new(index, vec![], 0.0, 0, a.clone(), b.clone());
            assert_eq!(segment.suggested_color_index, index % SEGMENT_PALETTE_SIZE);
        }
    }

    #[test]
    fn assemble_computes_time_totals() {
        let waypoints = vec![
            Waypoint::new("a", 0.0, 0.0).with_service_time(15),
            Waypoint::new("b", 1.0, 1.0).with_service_time(30),
        ];
        let result = RouteResult::assemble(
            waypoints,
            vec![(0.0, 0.0), (1.0, 1.0)],
            10.0,
            20,
            Vec::new(),
            ProviderKind::Primary,
        );
        assert_eq!(result.service_time_total_minutes, 45);
        assert_eq!(result.total_time_minutes, 65);
    }

    #[test]
    fn waypoint_wire_format_is_camel_case() {
        let waypoint = Waypoint::new("a", 3.15, 101.70).with_service_time(10);
        let json = serde_json::to_value(&waypoint).unwrap();
        assert!(json.get("serviceTimeMinutes").is_some());
        assert!(json.get("isCustomerLocation").is_some());
    }

    #[test]
    fn request_collects_service_times_in_order() {
        let request = RouteRequest::new(vec![
            Waypoint::new("a", 0.0, 0.0).with_service_time(5),
            Waypoint::new("b", 1.0, 1.0),
            Waypoint::new("c", 2.0, 2.0).with_service_time(25),
        ]);
        assert_eq!(request.service_times(), vec![5, 0, 25]);
        assert_eq!(request.service_time_total_minutes(), 30);
    }
}
