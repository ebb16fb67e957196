//! Route provider chain: primary, OSRM, then the local mock.
//!
//! The chain is an ordered list of providers evaluated strictly
//! sequentially with early return on first success. Each downstream attempt
//! only runs once the previous one has definitively failed; racing the
//! providers would spend quota for no latency win after the primary has
//! already failed. Individual failures are logged, never surfaced; only
//! the final outcome reaches the caller.

use std::time::Instant;

use crate::config::ProviderConfig;
use crate::mock::MockRouteGenerator;
use crate::osrm::{OsrmConfig, OsrmRouteClient};
use crate::primary::{PrimaryConfig, PrimaryRouteClient};
use crate::traits::{RouteError, RouteProvider};
use crate::types::{ProviderKind, RouteRequest, RouteResult};

/// Warning attached to the envelope whenever the mock provider served the
/// route.
pub const DEGRADED_ROUTE_WARNING: &str =
    "route was simulated locally; distances and timings are estimates";

pub struct RouteProviderChain {
    providers: Vec<Box<dyn RouteProvider>>,
    log_performance: bool,
}

impl RouteProviderChain {
    /// Chain over an explicit provider list, in attempt order.
    pub fn new(providers: Vec<Box<dyn RouteProvider>>) -> Self {
        Self {
            providers,
            log_performance: false,
        }
    }

    pub fn log_performance(mut self, enabled: bool) -> Self {
        self.log_performance = enabled;
        self
    }

    /// Standard chain (primary, OSRM, mock) wired from a resolved config.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, reqwest::Error> {
        let primary = PrimaryRouteClient::new(PrimaryConfig {
            base_url: config.primary_base_url.clone(),
            token: config.primary_token.clone(),
            enabled: config.primary_enabled,
            ..PrimaryConfig::default()
        })?;
        let osrm = OsrmRouteClient::new(OsrmConfig {
            base_url: config.osrm_base_url.clone(),
            enabled: config.osrm_enabled,
            ..OsrmConfig::default()
        })?;
        let mock = MockRouteGenerator::new(config.use_mock_on_failure);

        Ok(Self {
            providers: vec![Box::new(primary), Box::new(osrm), Box::new(mock)],
            log_performance: config.log_performance,
        })
    }

    /// Plans a route, attempting each enabled provider in order.
    ///
    /// Returns the first success; a mock result carries the degraded-route
    /// warning. When every enabled provider fails, the last provider's
    /// error is propagated. Disabled providers are skipped and never count
    /// as failures.
    pub fn plan_route(&self, request: &RouteRequest) -> Result<RouteResult, RouteError> {
        let mut last_error: Option<RouteError> = None;

        for provider in &self.providers {
            if !provider.enabled() {
                tracing::debug!(provider = provider.name(), "provider disabled, skipping");
                continue;
            }

            let started = Instant::now();
            match provider.plan(request) {
                Ok(mut result) => {
                    if self.log_performance {
                        tracing::info!(
                            provider = provider.name(),
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            waypoints = request.waypoints.len(),
                            "route planned"
                        );
                    }
                    if result.provider == ProviderKind::Mock {
                        result.warning = Some(DEGRADED_ROUTE_WARNING.to_string());
                    }
                    return Ok(result);
                }
                Err(err) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %err,
                        "route provider failed, falling back"
                    );
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            RouteError::provider("chain", "no route providers are enabled")
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::types::Waypoint;

    struct StubProvider {
        name: &'static str,
        enabled: bool,
        fail_with: Option<&'static str>,
        kind: ProviderKind,
        calls: Arc<AtomicUsize>,
    }

    impl StubProvider {
        fn succeeding(name: &'static str, kind: ProviderKind) -> Self {
            Self {
                name,
                enabled: true,
                fail_with: None,
                kind,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing(name: &'static str, kind: ProviderKind, message: &'static str) -> Self {
            Self {
                fail_with: Some(message),
                ..Self::succeeding(name, kind)
            }
        }

        fn disabled(name: &'static str, kind: ProviderKind) -> Self {
            Self {
                enabled: false,
                ..Self::succeeding(name, kind)
            }
        }

        fn call_counter(&self) -> Arc<AtomicUsize> {
            self.calls.clone()
        }
    }

    impl RouteProvider for StubProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        fn enabled(&self) -> bool {
            self.enabled
        }

        fn plan(&self, request: &RouteRequest) -> Result<RouteResult, RouteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = self.fail_with {
                return Err(RouteError::provider(self.name, message));
            }
            Ok(RouteResult::assemble(
                request.waypoints.clone(),
                request.waypoints.iter().map(|w| w.location()).collect(),
                1.0,
                2,
                Vec::new(),
                self.kind,
            ))
        }
    }

    fn request() -> RouteRequest {
        RouteRequest::new(vec![
            Waypoint::new("a", 3.15, 101.70),
            Waypoint::new("b", 3.10, 101.65),
        ])
    }

    #[test]
    fn first_success_wins_and_later_providers_are_not_attempted() {
        let mock = StubProvider::succeeding("mock", ProviderKind::Mock);
        let mock_calls = mock.call_counter();

        let chain = RouteProviderChain::new(vec![
            Box::new(StubProvider::failing(
                "primary",
                ProviderKind::Primary,
                "gateway down",
            )),
            Box::new(StubProvider::succeeding("osrm", ProviderKind::Osrm)),
            Box::new(mock),
        ]);

        let result = chain.plan_route(&request()).unwrap();
        assert_eq!(result.provider, ProviderKind::Osrm);
        assert!(result.warning.is_none());
        assert_eq!(
            mock_calls.load(Ordering::SeqCst),
            0,
            "mock must never be attempted once a prior stage succeeds"
        );
    }

    #[test]
    fn exhausted_chain_propagates_last_error() {
        let osrm = StubProvider::disabled("osrm", ProviderKind::Osrm);
        let mock = StubProvider::disabled("mock", ProviderKind::Mock);
        let osrm_calls = osrm.call_counter();
        let mock_calls = mock.call_counter();

        let chain = RouteProviderChain::new(vec![
            Box::new(StubProvider::failing(
                "primary",
                ProviderKind::Primary,
                "gateway down",
            )),
            Box::new(osrm),
            Box::new(mock),
        ]);

        let err = chain.plan_route(&request()).unwrap_err();
        assert!(err.to_string().contains("gateway down"));
        assert!(err.to_string().contains("primary"));
        assert_eq!(osrm_calls.load(Ordering::SeqCst), 0);
        assert_eq!(mock_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_or_fully_disabled_chain_reports_no_providers() {
        let chain = RouteProviderChain::new(vec![Box::new(StubProvider::disabled(
            "primary",
            ProviderKind::Primary,
        ))]);
        let err = chain.plan_route(&request()).unwrap_err();
        assert!(err.to_string().contains("no route providers"));
    }

    #[test]
    fn mock_results_carry_the_degraded_warning() {
        let chain = RouteProviderChain::new(vec![Box::new(StubProvider::succeeding(
            "mock",
            ProviderKind::Mock,
        ))]);
        let result = chain.plan_route(&request()).unwrap();
        assert_eq!(result.warning.as_deref(), Some(DEGRADED_ROUTE_WARNING));
    }
}
