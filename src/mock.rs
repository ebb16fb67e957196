//! Local simulated route generator (last provider in the chain).
//!
//! Always succeeds, so the map view can render something even when every
//! network provider is down. The geometry is a straight-line interpolation
//! and the return-segment flags are random visual variety; callers must
//! present these results as degraded.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geometry::haversine_km;
use crate::types::{ProviderKind, RouteRequest, RouteResult, RouteSegment, Waypoint};
use crate::traits::{RouteError, RouteProvider};

/// Interpolated points inserted between consecutive waypoints.
const POINTS_PER_HOP: usize = 3;

/// Estimated driving pace for the simulated route, minutes per km.
const MINUTES_PER_KM: f64 = 2.0;

/// Fraction of non-first segments randomly flagged as return segments.
const RETURN_SEGMENT_RATE: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct MockRouteGenerator {
    enabled: bool,
    /// Fixed seed makes generated routes reproducible in tests.
    seed: Option<u64>,
}

impl Default for MockRouteGenerator {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: None,
        }
    }
}

impl MockRouteGenerator {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            seed: None,
        }
    }

    pub fn seeded(enabled: bool, seed: u64) -> Self {
        Self {
            enabled,
            seed: Some(seed),
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Greedy nearest-order: repeatedly visit the closest unvisited stop.
    /// This is a placeholder, not a TSP solution.
    fn nearest_order(waypoints: &[Waypoint], start: Option<(f64, f64)>) -> Vec<Waypoint> {
        let mut remaining: Vec<Waypoint> = waypoints.to_vec();
        let mut ordered = Vec::with_capacity(remaining.len());
        let mut current = match start {
            Some(location) => location,
            None if !remaining.is_empty() => {
                let first = remaining.remove(0);
                let location = first.location();
                ordered.push(first);
                location
            }
            None => return ordered,
        };

        while !remaining.is_empty() {
            let (next_index, _) = remaining
                .iter()
                .enumerate()
                .map(|(i, w)| (i, haversine_km(current, w.location())))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .unwrap_or((0, 0.0));
            let next = remaining.remove(next_index);
            current = next.location();
            ordered.push(next);
        }

        ordered
    }
}

/// Linear interpolation between two points; not geodesically correct,
/// acceptable for a placeholder path.
fn lerp_hop(from: (f64, f64), to: (f64, f64)) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(POINTS_PER_HOP + 2);
    points.push(from);
    for step in 1..=POINTS_PER_HOP {
        let t = step as f64 / (POINTS_PER_HOP + 1) as f64;
        points.push((from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t));
    }
    points.push(to);
    points
}

impl RouteProvider for MockRouteGenerator {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn plan(&self, request: &RouteRequest) -> Result<RouteResult, RouteError> {
        let waypoints = if request.optimize {
            Self::nearest_order(&request.waypoints, request.start_location)
        } else {
            request.waypoints.clone()
        };

        let mut rng = self.rng();
        let mut coordinates: Vec<(f64, f64)> = Vec::new();
        let mut segments: Vec<RouteSegment> = Vec::new();
        let mut distance_km = 0.0;

        // Leading hop from the start location, not counted as a segment.
        if let (Some(start), Some(first)) = (request.start_location, waypoints.first()) {
            coordinates.extend(lerp_hop(start, first.location()));
            distance_km += haversine_km(start, first.location());
        }

        for index in 0..waypoints.len().saturating_sub(1) {
            let from = waypoints[index].location();
            let to = waypoints[index + 1].location();
            let hop = lerp_hop(from, to);

            let skip_joint = usize::from(!coordinates.is_empty());
            coordinates.extend(hop.iter().copied().skip(skip_joint));

            let leg_km = haversine_km(from, to);
            distance_km += leg_km;

            let mut segment = RouteSegment::new(
                index,
                hop,
                leg_km,
                (leg_km * MINUTES_PER_KM).round() as u32,
                waypoints[index].clone(),
                waypoints[index + 1].clone(),
            );
            if index > 0 {
                segment.is_return_segment = rng.gen_bool(RETURN_SEGMENT_RATE);
            }
            segments.push(segment);
        }

        if coordinates.is_empty() {
            if let Some(only) = waypoints.first() {
                coordinates.push(only.location());
            }
        }

        let duration_minutes = (distance_km * MINUTES_PER_KM).round() as u32;
        Ok(RouteResult::assemble(
            waypoints,
            coordinates,
            distance_km,
            duration_minutes,
            segments,
            ProviderKind::Mock,
        ))
    }
}
