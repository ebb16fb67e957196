//! Bulk geocoding strategy against an injected transport: threshold-based
//! fan-out vs. single bulk call, and partial-failure tolerance.

use std::sync::atomic::{AtomicUsize, Ordering};

use route_relay::geocode::{
    BulkGeocodeEntry, GeocodeClient, GeocodeError, GeocodeOptions, GeocodeTransport,
    RawGeocodeEnvelope, BULK_FANOUT_MAX,
};

/// Transport that fails any address containing "bad" and counts which
/// endpoint was used.
struct StubTransport {
    single_calls: AtomicUsize,
    bulk_calls: AtomicUsize,
}

impl StubTransport {
    fn new() -> Self {
        Self {
            single_calls: AtomicUsize::new(0),
            bulk_calls: AtomicUsize::new(0),
        }
    }

    fn envelope_for(address: &str) -> RawGeocodeEnvelope {
        let payload = if address.contains("bad") {
            r#"{"success":false}"#.to_string()
        } else {
            format!(
                r#"{{"success":true,
                    "result":{{"latitude":3.15,"longitude":101.70,
                               "formattedAddress":"{}","placeType":"address",
                               "accuracy":{{"score":0.88}}}},
                    "meta":{{"reliability":0.88,"warnings":[],"cacheStatus":"miss"}}}}"#,
                address
            )
        };
        serde_json::from_str(&payload).expect("stub envelope")
    }
}

impl GeocodeTransport for &StubTransport {
    fn geocode(
        &self,
        address: &str,
        _options: &GeocodeOptions,
    ) -> Result<RawGeocodeEnvelope, GeocodeError> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        Ok(StubTransport::envelope_for(address))
    }

    fn reverse_geocode(
        &self,
        longitude: f64,
        latitude: f64,
        _options: &GeocodeOptions,
    ) -> Result<serde_json::Value, GeocodeError> {
        Ok(serde_json::json!({
            "formattedAddress": format!("near {},{}", latitude, longitude)
        }))
    }

    fn geocode_bulk(
        &self,
        addresses: &[String],
        _options: &GeocodeOptions,
    ) -> Result<Vec<RawGeocodeEnvelope>, GeocodeError> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        Ok(addresses.iter().map(|a| StubTransport::envelope_for(a)).collect())
    }
}

fn addresses(n: usize, bad_index: Option<usize>) -> Vec<String> {
    (0..n)
        .map(|i| {
            if Some(i) == bad_index {
                format!("bad address {}", i)
            } else {
                format!("{} Jalan Ampang, Kuala Lumpur", i + 1)
            }
        })
        .collect()
}

fn failures(entries: &[BulkGeocodeEntry]) -> Vec<&str> {
    entries
        .iter()
        .filter(|e| e.outcome.is_err())
        .map(|e| e.address.as_str())
        .collect()
}

#[test]
fn large_batches_use_the_bulk_endpoint() {
    let transport = StubTransport::new();
    let client = GeocodeClient::with_transport(&transport);

    let input = addresses(6, Some(2));
    let entries = client
        .bulk_geocode(&input, &GeocodeOptions::default())
        .expect("bulk call");

    assert_eq!(entries.len(), 6);
    assert_eq!(failures(&entries), vec![input[2].as_str()]);
    assert_eq!(transport.bulk_calls.load(Ordering::SeqCst), 1);
    assert_eq!(transport.single_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn partial_failure_never_fails_the_batch() {
    let transport = StubTransport::new();
    let client = GeocodeClient::with_transport(&transport);

    let entries = client
        .bulk_geocode(&addresses(6, Some(2)), &GeocodeOptions::default())
        .expect("bulk call");

    let failed: Vec<_> = entries.iter().filter(|e| e.outcome.is_err()).collect();
    assert_eq!(failed.len(), 1);
    for entry in &entries {
        if let Ok(geocoded) = &entry.outcome {
            assert_eq!(geocoded.result.latitude, 3.15);
        }
    }
}

#[test]
fn small_batches_fan_out_individually() {
    let transport = StubTransport::new();
    let client = GeocodeClient::with_transport(&transport);
    let input = addresses(BULK_FANOUT_MAX, Some(1));

    let entries = client
        .bulk_geocode(&input, &GeocodeOptions::default())
        .expect("fan-out call");

    assert_eq!(entries.len(), BULK_FANOUT_MAX);
    // One rejection does not cancel its siblings.
    assert_eq!(failures(&entries).len(), 1);
    // Results stay paired with their input addresses regardless of
    // completion order.
    for (entry, address) in entries.iter().zip(&input) {
        assert_eq!(&entry.address, address);
    }
    assert_eq!(transport.single_calls.load(Ordering::SeqCst), BULK_FANOUT_MAX);
    assert_eq!(transport.bulk_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn single_address_geocode_normalizes() {
    let transport = StubTransport::new();
    let client = GeocodeClient::with_transport(&transport);

    let geocoded = client
        .geocode_address("12 Jalan Ampang, Kuala Lumpur", &GeocodeOptions::default())
        .expect("geocode");
    assert_eq!(geocoded.result.longitude, 101.70);
    assert!(geocoded.meta.warnings.is_empty());
}

#[test]
fn reverse_geocode_passes_the_payload_through() {
    let transport = StubTransport::new();
    let client = GeocodeClient::with_transport(&transport);

    let payload = client
        .reverse_geocode(101.70, 3.15, &GeocodeOptions::default())
        .expect("reverse geocode");
    assert!(payload["formattedAddress"]
        .as_str()
        .unwrap()
        .contains("3.15"));
}
