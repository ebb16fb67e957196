//! Geometry primitives shared by the routing providers.
//!
//! Pure functions, no I/O. Distances are great-circle; the nearest-index
//! lookup deliberately works in raw degree-space because it only aligns a
//! waypoint to a nearby path sample.

/// Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two (latitude, longitude) points, in km.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Total length of a coordinate sequence, in km.
pub fn path_length_km(points: &[(f64, f64)]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_km(pair[0], pair[1]))
        .sum()
}

/// Index of the coordinate closest to `point`, minimizing squared distance
/// in degree-space. Returns 0 for an empty slice.
///
/// Not geodesic: only valid for snapping a point to a path that already
/// passes near it.
pub fn closest_index(coords: &[(f64, f64)], point: (f64, f64)) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, &(lat, lng)) in coords.iter().enumerate() {
        let d_lat = lat - point.0;
        let d_lng = lng - point.1;
        let dist = d_lat * d_lat + d_lng * d_lng;
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best
}
