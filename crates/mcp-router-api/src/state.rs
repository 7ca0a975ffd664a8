//! Application state for the router API

use std::sync::Arc;

use mcp_router_gateway::FailoverGateway;

use crate::auth::AuthConfig;
use crate::metrics::Metrics;
use crate::rate_limit::{RateLimitConfig, RateLimiter};

/// Settings for the HTTP surface
#[derive(Debug, Clone, Default)]
pub struct ApiConfig {
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    gateway: Arc<FailoverGateway>,
    metrics: Arc<Metrics>,
    rate_limiter: Arc<RateLimiter>,
    auth: Arc<AuthConfig>,
}

impl AppState {
    /// Create a new AppState with a fresh metrics registry
    pub fn new(gateway: Arc<FailoverGateway>, config: ApiConfig) -> Self {
        Self::with_metrics(gateway, config, Arc::new(Metrics::new()))
    }

    /// Create a new AppState sharing an existing metrics registry
    pub fn with_metrics(
        gateway: Arc<FailoverGateway>,
        config: ApiConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        let mut auth = config.auth;
        // An empty key is the same as none
        auth.api_key = auth.api_key.filter(|k| !k.is_empty());

        Self {
            gateway,
            metrics,
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limit)),
            auth: Arc::new(auth),
        }
    }

    pub fn gateway(&self) -> &FailoverGateway {
        &self.gateway
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }
}
