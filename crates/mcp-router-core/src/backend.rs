//! Backend trait seam
//!
//! The failover gateway and catalog refresh only need these two calls from
//! a backend, which lets tests substitute in-memory backends for the real
//! protocol client.

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::models::ToolMap;

/// A service that can list and invoke tools
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Fetch the backend's current tool listing, keyed by name
    async fn list_tools(&self) -> ClientResult<ToolMap>;

    /// Invoke `name` with `arguments` and return the JSON-RPC `result` member
    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> ClientResult<serde_json::Value>;
}
