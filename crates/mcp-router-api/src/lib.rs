//! mcp-router-api - REST API layer for the MCP tool-call router
//!
//! This crate provides the HTTP surface in front of a
//! [`FailoverGateway`](mcp_router_gateway::FailoverGateway): tool-call
//! passthrough, page creation, bearer auth, per-caller rate limiting and
//! Prometheus metrics.
//!
//! # Usage
//!
//! ```ignore
//! use mcp_router_api::{create_router, ApiConfig, AppState};
//!
//! let gateway = Arc::new(FailoverGateway::new(official, custom));
//! let state = AppState::new(gateway, ApiConfig::default());
//! let router = create_router(state);
//! ```

pub mod auth;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod pages;
pub mod rate_limit;
pub mod state;

pub use auth::AuthConfig;
pub use error::{ApiError, ApiResult};
pub use metrics::Metrics;
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use state::{ApiConfig, AppState};

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// Maximum accepted request body
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Create the router API with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Routed calls are rate limited; probes and operator views are not
    let routed = Router::new()
        .route("/mcp/tools.call", post(handlers::tools::call_tool))
        .route("/notion/pages.create", post(handlers::pages::create_page))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/metrics", get(handlers::metrics::metrics))
        .route("/catalog", get(handlers::catalog::get_catalog))
        .merge(routed)
        // Middleware
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            metrics::track_http,
        ))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}
