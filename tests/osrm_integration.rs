//! End-to-end OSRM route test against a real `osrm-routed` container.
//!
//! Requires Docker and network access for the first run (Geofabrik
//! download + OSRM preprocessing); later runs reuse the container.

use std::env;

use testcontainers::core::{IntoContainerPort, Mount};
use testcontainers::runners::SyncRunner;
use testcontainers::{Container, GenericImage, ImageExt, ReuseDirective, TestcontainersError};

use route_relay::osrm::{OsrmConfig, OsrmRouteClient};
use route_relay::osrm_data::OsrmTestData;
use route_relay::traits::RouteProvider;
use route_relay::types::{ProviderKind, RouteRequest, Waypoint};

fn osrm_container() -> Result<(Container<GenericImage>, String), TestcontainersError> {
    let data_root = env::var("OSRM_DATA_DIR").unwrap_or_else(|_| "osrm-data".to_string());
    let dataset = OsrmTestData::prepare("north-america/us/nevada", data_root)
        .map_err(|err| TestcontainersError::other(format!("OSRM prep failed: {:?}", err)))?;

    let mtime = std::fs::metadata(dataset.osrm_base.with_extension("osrm.partition"))
        .ok()
        .and_then(|meta| meta.modified().ok())
        .and_then(|time| time.duration_since(std::time::SystemTime::UNIX_EPOCH).ok())
        .map(|duration| duration.as_secs())
        .unwrap_or(0);

    let image = GenericImage::new("osrm/osrm-backend", "latest")
        .with_exposed_port(5000.tcp())
        .with_mount(Mount::bind_mount(
            dataset.data_dir.to_string_lossy().to_string(),
            "/data",
        ))
        .with_cmd(vec![
            "osrm-routed",
            "--algorithm",
            "mld",
            "/data/nevada-latest.osrm",
        ])
        .with_container_name(format!("osrm-route-nevada-{}", mtime))
        .with_startup_timeout(std::time::Duration::from_secs(30))
        .with_reuse(ReuseDirective::Always);

    let container = image.start()?;
    let port = container.get_host_port_ipv4(5000.tcp())?;
    let base_url = format!("http://127.0.0.1:{}", port);

    Ok((container, base_url))
}

#[test]
fn osrm_route_decodes_into_segments() {
    let (container, base_url) = osrm_container().expect("start OSRM container");

    let client = OsrmRouteClient::new(OsrmConfig {
        base_url,
        ..OsrmConfig::default()
    })
    .expect("build OSRM client");

    // Three stops around Las Vegas.
    let request = RouteRequest::new(vec![
        Waypoint::new("strip", 36.1147, -115.1728).with_service_time(20),
        Waypoint::new("downtown", 36.1727, -115.1580).with_service_time(15),
        Waypoint::new("arts", 36.1215, -115.1739),
    ]);

    // The routed instance can take a moment after container start.
    let result = {
        let started = std::time::Instant::now();
        let mut last = client.plan(&request);
        while last.is_err() && started.elapsed() < std::time::Duration::from_secs(15) {
            std::thread::sleep(std::time::Duration::from_millis(500));
            last = client.plan(&request);
        }
        last
    };

    let route = result.expect("OSRM route");
    assert_eq!(route.provider, ProviderKind::Osrm);
    assert_eq!(route.segments.len(), request.waypoints.len() - 1);
    assert!(route.coordinates.len() >= 2, "decoded geometry too short");
    assert!(route.distance_km > 0.0);
    assert!(route.duration_minutes > 0);
    assert_eq!(route.service_time_total_minutes, 35);
    assert_eq!(
        route.total_time_minutes,
        route.duration_minutes + route.service_time_total_minutes
    );

    // Segment geometry must stay near the overview path.
    for segment in &route.segments {
        assert!(segment.coordinates.len() >= 2);
        assert!(segment.distance_km > 0.0);
    }

    drop(container);
}

#[test]
fn osrm_prepends_start_location_without_extra_segment() {
    let (container, base_url) = osrm_container().expect("start OSRM container");

    let client = OsrmRouteClient::new(OsrmConfig {
        base_url,
        ..OsrmConfig::default()
    })
    .expect("build OSRM client");

    let request = RouteRequest::new(vec![
        Waypoint::new("downtown", 36.1727, -115.1580),
        Waypoint::new("arts", 36.1215, -115.1739),
    ])
    .starting_at((36.1147, -115.1728));

    let result = {
        let started = std::time::Instant::now();
        let mut last = client.plan(&request);
        while last.is_err() && started.elapsed() < std::time::Duration::from_secs(15) {
            std::thread::sleep(std::time::Duration::from_millis(500));
            last = client.plan(&request);
        }
        last
    };

    let route = result.expect("OSRM route");
    // Start location adds driven path but never a waypoint segment.
    assert_eq!(route.segments.len(), 1);
    assert_eq!(route.waypoints.len(), 2);

    drop(container);
}
