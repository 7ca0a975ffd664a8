//! mcp-router-core - Core traits and types for the MCP tool-call router
//!
//! This crate provides the abstractions shared by the protocol client,
//! the failover gateway and the HTTP surface: the two fixed backend
//! identities, tool definitions, the immutable catalog snapshot, the
//! routing decision engine and the [`ToolBackend`] trait.

pub mod backend;
pub mod catalog;
pub mod error;
pub mod models;
pub mod routing;

pub use backend::ToolBackend;
pub use catalog::{Catalog, CatalogHandle};
pub use error::{ClientError, ClientResult};
pub use models::*;
