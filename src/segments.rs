//! Per-leg segment derivation and overlap (return-segment) detection.
//!
//! Given a route's full coordinate sequence and its waypoints, splits the
//! path into one renderable segment per consecutive waypoint pair. When the
//! provider reported per-leg geometry, each leg's own points are used (the
//! precise path); otherwise the full sequence is sliced at each waypoint's
//! closest sample index.

use crate::geometry::{closest_index, path_length_km};
use crate::types::{RouteSegment, Waypoint};

/// Per-leg metadata as reported by a provider, already decoded.
#[derive(Debug, Clone)]
pub struct LegMeta {
    pub distance_km: f64,
    pub duration_minutes: f64,
    /// Leg geometry when the provider reports one per leg.
    pub points: Option<Vec<(f64, f64)>>,
}

/// Tunable constants for the sampled overlap heuristic.
///
/// The defaults come straight from the original map view and have no
/// geodetic derivation; their only contract is visual plausibility.
#[derive(Debug, Clone)]
pub struct OverlapParams {
    /// Match distance in degrees (~10 m at the default).
    pub tolerance_deg: f64,
    /// Sampling stride is `max(1, len / sample_divisor)`.
    pub sample_divisor: usize,
    /// Required matching samples is `min(max_required_hits, shorter_len / hit_divisor)`,
    /// clamped to at least one. Derived from the shorter of the two paths
    /// so the test stays symmetric for unequal lengths.
    pub max_required_hits: usize,
    pub hit_divisor: usize,
}

impl Default for OverlapParams {
    fn default() -> Self {
        Self {
            tolerance_deg: 1e-4,
            sample_divisor: 20,
            max_required_hits: 5,
            hit_divisor: 10,
        }
    }
}

/// Builds one segment per consecutive waypoint pair and flags return
/// segments. Returns an empty vector for fewer than two waypoints.
///
/// `total_distance_km`/`total_duration_minutes` are only used to apportion
/// legs when the provider reported no per-leg metadata.
pub fn build_segments(
    waypoints: &[Waypoint],
    coordinates: &[(f64, f64)],
    legs: Option<&[LegMeta]>,
    total_distance_km: f64,
    total_duration_minutes: u32,
    params: &OverlapParams,
) -> Vec<RouteSegment> {
    if waypoints.len() < 2 {
        return Vec::new();
    }

    let mut segments = match legs {
        Some(legs) if legs.len() == waypoints.len() - 1 => {
            from_leg_meta(waypoints, coordinates, legs)
        }
        _ => from_full_path(
            waypoints,
            coordinates,
            total_distance_km,
            total_duration_minutes,
        ),
    };

    mark_return_segments(&mut segments, params);
    segments
}

/// Precise path: each leg carries its own geometry and measurements.
fn from_leg_meta(
    waypoints: &[Waypoint],
    coordinates: &[(f64, f64)],
    legs: &[LegMeta],
) -> Vec<RouteSegment> {
    legs.iter()
        .enumerate()
        .map(|(index, leg)| {
            let points = match &leg.points {
                Some(points) if !points.is_empty() => points.clone(),
                // Leg without geometry: fall back to slicing the full path.
                _ => slice_between(coordinates, &waypoints[index], &waypoints[index + 1]),
            };
            RouteSegment::new(
                index,
                points,
                leg.distance_km,
                leg.duration_minutes.round() as u32,
                waypoints[index].clone(),
                waypoints[index + 1].clone(),
            )
        })
        .collect()
}

/// Approximate path: slice the full sequence between each waypoint's closest
/// sample, apportioning duration by each slice's share of distance.
fn from_full_path(
    waypoints: &[Waypoint],
    coordinates: &[(f64, f64)],
    total_distance_km: f64,
    total_duration_minutes: u32,
) -> Vec<RouteSegment> {
    let mut segments = Vec::with_capacity(waypoints.len() - 1);
    for index in 0..waypoints.len() - 1 {
        let points = slice_between(coordinates, &waypoints[index], &waypoints[index + 1]);
        let distance_km = path_length_km(&points);
        let duration_minutes = if total_distance_km > 0.0 {
            (total_duration_minutes as f64 * distance_km / total_distance_km).round() as u32
        } else {
            0
        };
        segments.push(RouteSegment::new(
            index,
            points,
            distance_km,
            duration_minutes,
            waypoints[index].clone(),
            waypoints[index + 1].clone(),
        ));
    }
    segments
}

fn slice_between(
    coordinates: &[(f64, f64)],
    start: &Waypoint,
    end: &Waypoint,
) -> Vec<(f64, f64)> {
    if coordinates.is_empty() {
        return vec![start.location(), end.location()];
    }
    let from = closest_index(coordinates, start.location());
    let to = closest_index(coordinates, end.location());
    let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
    let slice = &coordinates[lo..=hi];
    if slice.len() < 2 {
        // Waypoints snapped to the same sample; keep the straight hop so the
        // segment still renders.
        vec![start.location(), end.location()]
    } else {
        slice.to_vec()
    }
}

/// Flags each segment that significantly overlaps any strictly-earlier
/// segment. Detection is causal: a segment is only compared against legs
/// already driven, never against later ones.
pub fn mark_return_segments(segments: &mut [RouteSegment], params: &OverlapParams) {
    for current in 1..segments.len() {
        let is_return = (0..current).any(|earlier| {
            has_significant_overlap(
                &segments[current].coordinates,
                &segments[earlier].coordinates,
                params,
            )
        });
        segments[current].is_return_segment = is_return;
    }
}

/// Sampled spatial-overlap test between two paths.
///
/// Both paths are sampled at stride `max(1, len / sample_divisor)`; the test
/// passes when enough sampled points of one path fall within
/// `tolerance_deg` of some sampled point of the other. The hit requirement
/// comes from the shorter path and the scan runs in both directions, so the
/// result never depends on argument order. Approximate by construction,
/// not a polygon intersection.
pub fn has_significant_overlap(
    a: &[(f64, f64)],
    b: &[(f64, f64)],
    params: &OverlapParams,
) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }

    let samples_a = sample(a, params.sample_divisor);
    let samples_b = sample(b, params.sample_divisor);

    let required = (a.len().min(b.len()) / params.hit_divisor)
        .min(params.max_required_hits)
        .max(1);

    enough_hits(&samples_a, &samples_b, required, params.tolerance_deg)
        || enough_hits(&samples_b, &samples_a, required, params.tolerance_deg)
}

fn enough_hits(
    from: &[(f64, f64)],
    onto: &[(f64, f64)],
    required: usize,
    tolerance_deg: f64,
) -> bool {
    let mut hits = 0;
    for &point in from {
        let matched = onto.iter().any(|&other| {
            (point.0 - other.0).abs() <= tolerance_deg
                && (point.1 - other.1).abs() <= tolerance_deg
        });
        if matched {
            hits += 1;
            if hits >= required {
                return true;
            }
        }
    }
    false
}

fn sample(points: &[(f64, f64)], divisor: usize) -> Vec<(f64, f64)> {
    let stride = (points.len() / divisor.max(1)).max(1);
    points.iter().copied().step_by(stride).collect()
}
