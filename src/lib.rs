//! route-relay core
//!
//! Route planning and geocoding for the appointment map, orchestrated
//! across a chain of providers of decreasing fidelity: the hosted routing
//! API, a self-hosted OSRM instance, and a local simulated fallback. The
//! chain degrades gracefully so the map view never hard-fails while the
//! fallback is enabled.

pub mod chain;
pub mod config;
pub mod geocode;
pub mod geometry;
pub mod mock;
pub mod osrm;
pub mod osrm_data;
pub mod polyline;
pub mod primary;
pub mod segments;
pub mod traits;
pub mod types;
