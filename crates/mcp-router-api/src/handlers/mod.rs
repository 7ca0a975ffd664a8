//! HTTP request handlers for the router API
//!
//! Routed calls go through the [`FailoverGateway`](mcp_router_gateway::FailoverGateway)
//! held in [`AppState`](crate::AppState); nothing here talks to a backend directly.

pub mod catalog;
pub mod health;
pub mod metrics;
pub mod pages;
pub mod tools;

use mcp_router_core::{CallOutcome, RouteTarget};

use crate::error::ApiResult;
use crate::state::AppState;

/// Route and call a tool, recording call metrics either way
pub(crate) async fn routed_call(
    state: &AppState,
    target: RouteTarget,
    tool_name: &str,
    arguments: serde_json::Value,
) -> ApiResult<CallOutcome> {
    let catalog = state.gateway().catalog().snapshot();
    state.metrics().record_tool_call(tool_name, &catalog);

    match state
        .gateway()
        .route_and_call(target, tool_name, arguments)
        .await
    {
        Ok(outcome) => {
            state.metrics().record_outcome(&outcome);
            tracing::info!(
                tool = %tool_name,
                backend = %outcome.backend,
                failover = outcome.failover_occurred,
                duration_ms = outcome.duration_ms,
                "Tool call completed"
            );
            Ok(outcome)
        }
        Err(err) => {
            state.metrics().record_failure(&err);
            Err(err.into())
        }
    }
}
