//! Polyline codec for route geometries.
//!
//! Implements the standard signed-varint delta encoding used by routing
//! providers (5-bit groups, continuation bit in the top bit, zig-zag deltas
//! scaled by 10^precision). Decoding happens at the provider boundary; the
//! rest of the crate works with decoded coordinate sequences.

use serde::{Deserialize, Serialize};

/// Default coordinate precision (5 decimal places, ~1 m).
pub const DEFAULT_PRECISION: u32 = 5;

/// A route geometry as decoded (latitude, longitude) points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Decodes an encoded polyline string at the given precision.
    pub fn decode(encoded: &str, precision: u32) -> Self {
        Self::new(decode(encoded, precision))
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }
}

/// Decodes an encoded polyline into (latitude, longitude) points.
///
/// Bounds-checked: a truncated trailing varint (or a lone latitude delta
/// with no longitude) is dropped rather than read past the end. There is no
/// other error signal for malformed input; feed provider-emitted strings.
pub fn decode(encoded: &str, precision: u32) -> Vec<(f64, f64)> {
    let bytes = encoded.as_bytes();
    let factor = 10f64.powi(precision as i32);

    let mut points = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        let Some(d_lat) = next_delta(bytes, &mut index) else {
            break;
        };
        let Some(d_lng) = next_delta(bytes, &mut index) else {
            break;
        };
        lat += d_lat;
        lng += d_lng;
        points.push((lat as f64 / factor, lng as f64 / factor));
    }

    points
}

/// Encodes (latitude, longitude) points at the given precision.
pub fn encode(points: &[(f64, f64)], precision: u32) -> String {
    let factor = 10f64.powi(precision as i32);

    let mut encoded = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for &(lat, lng) in points {
        let lat_scaled = (lat * factor).round() as i64;
        let lng_scaled = (lng * factor).round() as i64;
        push_delta(lat_scaled - prev_lat, &mut encoded);
        push_delta(lng_scaled - prev_lng, &mut encoded);
        prev_lat = lat_scaled;
        prev_lng = lng_scaled;
    }

    encoded
}

/// Reads one zig-zag varint delta, advancing `index`. Returns `None` when
/// the input ends mid-varint.
fn next_delta(bytes: &[u8], index: &mut usize) -> Option<i64> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        if *index >= bytes.len() {
            return None;
        }
        let chunk = bytes[*index] as i64 - 63;
        *index += 1;
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    if result & 1 != 0 {
        Some(!(result >> 1))
    } else {
        Some(result >> 1)
    }
}

fn push_delta(delta: i64, out: &mut String) {
    let mut value = if delta < 0 { !(delta << 1) } else { delta << 1 };
    while value >= 0x20 {
        out.push(((0x20 | (value & 0x1f)) + 63) as u8 as char);
        value >>= 5;
    }
    out.push((value + 63) as u8 as char);
}
