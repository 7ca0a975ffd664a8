//! MCP Client Library
//!
//! Speaks the MCP streamable-HTTP protocol to one backend: performs the
//! `initialize` handshake, keeps the resulting session id, and exchanges
//! JSON-RPC messages framed as a single server-sent event per response.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use mcp_router_client::{McpClient, McpClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = McpClient::new(McpClientConfig {
//!         name: "official".into(),
//!         base_url: "http://localhost:3030/mcp".into(),
//!         auth_token: "secret".into(),
//!         request_timeout: Duration::from_secs(30),
//!     })?;
//!
//!     // The handshake happens on first use
//!     let tools = client.list_tools().await?;
//!     let result = client
//!         .call_tool("notion_search", serde_json::json!({"query": "roadmap"}))
//!         .await?;
//!     println!("{} tools, result: {}", tools.len(), result);
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! The `testing` module provides an in-process mock backend:
//!
//! ```rust,ignore
//! use mcp_router_client::testing::MockMcpServer;
//!
//! let server = MockMcpServer::builder().tool("notion_search").start().await?;
//! let client = server.client()?;
//! let tools = client.list_tools().await?;
//! ```

mod client;
mod jsonrpc;
mod session;
pub mod sse;
pub mod testing;

pub use client::{McpClient, McpClientConfig, PROTOCOL_VERSION, SESSION_HEADER};
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use session::SessionPhase;

// Re-export core types for convenience
pub use mcp_router_core::{ClientError, ClientResult, ToolBackend, ToolDefinition, ToolMap};
