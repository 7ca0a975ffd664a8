//! Failover Gateway - routes each call to a primary backend and retries
//! once on the alternate backend when the primary fails.

use std::sync::Arc;
use std::time::Instant;

use mcp_router_core::routing;
use mcp_router_core::{
    BackendId, CallOutcome, CatalogHandle, ClientResult, FailoverInfo, RouteDecision,
    RouteTarget, ToolBackend,
};
use tracing::{debug, info, warn};

use crate::error::{BackendFailure, FailoverError};

/// Gateway over the two fixed backends.
///
/// Owns both backend clients and the catalog snapshot handle. Backends are
/// shared between concurrent requests; the catalog is only ever replaced
/// wholesale by the refresh loop.
pub struct FailoverGateway {
    official: Arc<dyn ToolBackend>,
    custom: Arc<dyn ToolBackend>,
    catalog: CatalogHandle,
}

impl FailoverGateway {
    /// Create a gateway with an empty catalog
    pub fn new(official: Arc<dyn ToolBackend>, custom: Arc<dyn ToolBackend>) -> Self {
        Self::with_catalog(official, custom, CatalogHandle::default())
    }

    /// Create a gateway publishing into an existing catalog handle
    pub fn with_catalog(
        official: Arc<dyn ToolBackend>,
        custom: Arc<dyn ToolBackend>,
        catalog: CatalogHandle,
    ) -> Self {
        info!("Creating failover gateway over official and custom backends");
        Self {
            official,
            custom,
            catalog,
        }
    }

    /// Get a backend by identity
    pub fn backend(&self, id: BackendId) -> &Arc<dyn ToolBackend> {
        match id {
            BackendId::Official => &self.official,
            BackendId::Custom => &self.custom,
        }
    }

    /// Catalog snapshot handle
    pub fn catalog(&self) -> &CatalogHandle {
        &self.catalog
    }

    /// Decide the primary backend for `tool_name` against the current snapshot
    pub fn route(&self, target: RouteTarget, tool_name: &str) -> RouteDecision {
        let snapshot = self.catalog.snapshot();
        routing::resolve(target, tool_name, &snapshot)
    }

    /// Call the decided backend, falling back to the other one exactly once
    pub async fn call(
        &self,
        decision: RouteDecision,
        tool_name: &str,
        arguments: serde_json::Value,
    ) -> Result<CallOutcome, FailoverError> {
        let started = Instant::now();
        let primary = decision.backend;

        debug!(
            tool = %tool_name,
            backend = %primary,
            explicit = decision.explicit,
            "Calling primary backend"
        );

        let primary_error = match self.attempt(primary, tool_name, arguments.clone()).await {
            Ok(payload) => {
                return Ok(CallOutcome {
                    backend: primary,
                    duration_ms: elapsed_ms(started),
                    failover_occurred: false,
                    failover: None,
                    payload,
                });
            }
            Err(e) => e,
        };

        let fallback = primary.other();
        warn!(
            tool = %tool_name,
            from = %primary,
            to = %fallback,
            error = %primary_error,
            "Primary backend failed, failing over"
        );

        match self.attempt(fallback, tool_name, arguments).await {
            Ok(payload) => {
                info!(tool = %tool_name, backend = %fallback, "Failover succeeded");
                Ok(CallOutcome {
                    backend: fallback,
                    duration_ms: elapsed_ms(started),
                    failover_occurred: true,
                    failover: Some(FailoverInfo {
                        from: primary,
                        reason: primary_error.to_string(),
                    }),
                    payload,
                })
            }
            Err(fallback_error) => {
                warn!(
                    tool = %tool_name,
                    primary = %primary,
                    fallback = %fallback,
                    primary_error = %primary_error,
                    fallback_error = %fallback_error,
                    "Both backends failed"
                );
                Err(FailoverError {
                    primary: BackendFailure {
                        backend: primary,
                        error: primary_error,
                    },
                    fallback: BackendFailure {
                        backend: fallback,
                        error: fallback_error,
                    },
                })
            }
        }
    }

    /// Route and call in one step
    pub async fn route_and_call(
        &self,
        target: RouteTarget,
        tool_name: &str,
        arguments: serde_json::Value,
    ) -> Result<CallOutcome, FailoverError> {
        let decision = self.route(target, tool_name);
        self.call(decision, tool_name, arguments).await
    }

    async fn attempt(
        &self,
        backend: BackendId,
        tool_name: &str,
        arguments: serde_json::Value,
    ) -> ClientResult<serde_json::Value> {
        self.backend(backend).call_tool(tool_name, arguments).await
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
