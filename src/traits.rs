//! Provider seams for route planning.
//!
//! The chain's policy (priority order, enabled flags, early return) is data
//! held by `RouteProviderChain`; each provider only knows how to attempt a
//! single route request.

use std::error::Error;
use std::fmt;

use crate::types::{RouteRequest, RouteResult};

/// A single route provider the chain can attempt.
pub trait RouteProvider {
    /// Provider identity used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Disabled providers are skipped without counting as a failure.
    fn enabled(&self) -> bool {
        true
    }

    fn plan(&self, request: &RouteRequest) -> Result<RouteResult, RouteError>;
}

/// Route planning failure.
///
/// Transport failures and logical failures (a 200 response with no usable
/// route) are treated identically by the chain: both trigger fallback.
#[derive(Debug)]
pub enum RouteError {
    /// Network or HTTP-level failure.
    Http(reqwest::Error),
    /// Provider responded but produced no usable route.
    Provider {
        provider: &'static str,
        message: String,
    },
}

impl RouteError {
    pub fn provider(provider: &'static str, message: impl Into<String>) -> Self {
        RouteError::Provider {
            provider,
            message: message.into(),
        }
    }
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::Http(err) => write!(f, "route request failed: {}", err),
            RouteError::Provider { provider, message } => {
                write!(f, "{}: {}", provider, message)
            }
        }
    }
}

impl Error for RouteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RouteError::Http(err) => Some(err),
            RouteError::Provider { .. } => None,
        }
    }
}

impl From<reqwest::Error> for RouteError {
    fn from(err: reqwest::Error) -> Self {
        RouteError::Http(err)
    }
}
