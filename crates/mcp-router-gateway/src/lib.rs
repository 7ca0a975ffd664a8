//! mcp-router-gateway - Failover across two MCP backends
//!
//! This crate provides the [`FailoverGateway`] that owns the two backend
//! clients and the catalog snapshot, picks a primary backend per call and
//! retries once on the alternate backend when the primary fails.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       FailoverGateway                        │
//! │                                                              │
//! │   route(target, tool) ──► CatalogHandle (ArcSwap snapshot)   │
//! │            │                         ▲                       │
//! │            ▼                         │ publish               │
//! │   call(decision) ─┐        refresh loop (every 60s)          │
//! │                   │                  │                       │
//! │        ┌──────────┴─────────┬────────┴─────────┐             │
//! │        ▼                    ▼                  ▼             │
//! │  ┌───────────┐        ┌───────────┐                          │
//! │  │ official  │◄─once─►│  custom   │   (alternate on failure) │
//! │  └───────────┘        └───────────┘                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use mcp_router_gateway::{spawn_catalog_refresh, FailoverGateway};
//!
//! let gateway = Arc::new(FailoverGateway::new(official, custom));
//! let refresh = spawn_catalog_refresh(Arc::clone(&gateway), CATALOG_REFRESH_INTERVAL, |_, _| {});
//!
//! let outcome = gateway
//!     .route_and_call(RouteTarget::Auto, "notion_search", json!({"query": "x"}))
//!     .await?;
//! ```

mod error;
mod gateway;
mod refresh;

pub use error::{BackendFailure, FailoverError};
pub use gateway::FailoverGateway;
pub use refresh::{spawn_catalog_refresh, RefreshReport, CATALOG_REFRESH_INTERVAL};

// Re-export core types for convenience
pub use mcp_router_core::{
    BackendId, CallOutcome, Catalog, CatalogHandle, ClientError, RouteDecision, RouteTarget,
    ToolBackend,
};
