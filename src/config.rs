//! Provider configuration and startup resolution.
//!
//! `ProviderConfig` is an immutable value passed by reference into the chain
//! and the geocode client; there is no process-wide mutable state. The
//! resolver fetches remote configuration once at startup and keeps static
//! defaults when the fetch fails. There is deliberately no retry loop, so a
//! flaky config endpoint never blocks route requests. Callers wanting fresh
//! config resolve again explicitly.

use std::time::Duration;

use serde::Deserialize;

const CONFIG_FETCH_TIMEOUT_SECS: u64 = 3;

/// Process configuration for the provider chain and geocoding.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub primary_enabled: bool,
    /// Base URL of the hosted routing/geocoding gateway.
    pub primary_base_url: String,
    pub primary_token: Option<String>,
    pub osrm_enabled: bool,
    pub osrm_base_url: String,
    /// When false, exhausting primary and OSRM propagates the last error
    /// instead of serving a simulated route.
    pub use_mock_on_failure: bool,
    pub log_performance: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            primary_enabled: true,
            primary_base_url: "http://localhost:8080".to_string(),
            primary_token: None,
            osrm_enabled: true,
            osrm_base_url: "http://localhost:5000".to_string(),
            use_mock_on_failure: true,
            log_performance: false,
        }
    }
}

/// Fetches remote provider configuration from `GET {base}/map/config`.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl ConfigResolver {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(CONFIG_FETCH_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    /// Resolves the provider configuration.
    ///
    /// Returns the config and whether the remote fetch succeeded. On any
    /// failure the static defaults (with this resolver's base URL) are
    /// returned unchanged.
    pub fn resolve(&self) -> (ProviderConfig, bool) {
        let mut config = ProviderConfig {
            primary_base_url: self.base_url.clone(),
            ..ProviderConfig::default()
        };

        match self.fetch_remote() {
            Ok(remote) => {
                if let Some(mapbox) = remote.mapbox {
                    config.primary_token = mapbox.access_token;
                }
                if let Some(osrm) = remote.osrm {
                    config.osrm_enabled = osrm.enabled;
                }
                tracing::debug!(
                    osrm_enabled = config.osrm_enabled,
                    has_token = config.primary_token.is_some(),
                    "remote map config loaded"
                );
                (config, true)
            }
            Err(err) => {
                tracing::warn!(error = %err, "map config fetch failed, keeping defaults");
                (config, false)
            }
        }
    }

    fn fetch_remote(&self) -> Result<RemoteMapConfig, reqwest::Error> {
        let url = format!("{}/map/config", self.base_url);
        self.client
            .get(url)
            .send()?
            .error_for_status()?
            .json::<RemoteMapConfig>()
    }
}

#[derive(Debug, Deserialize)]
struct RemoteMapConfig {
    mapbox: Option<RemoteMapboxSection>,
    osrm: Option<RemoteOsrmSection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteMapboxSection {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoteOsrmSection {
    enabled: bool,
}
