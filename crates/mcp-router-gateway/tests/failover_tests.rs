//! Failover and refresh tests over real HTTP
//!
//! Each backend is an in-process mock MCP server, so routing, failover and
//! catalog refresh run through the real client and SSE framing.

use std::sync::Arc;
use std::time::Duration;

use mcp_router_client::testing::MockMcpServer;
use mcp_router_client::{McpClient, McpClientConfig};
use mcp_router_gateway::{BackendId, ClientError, FailoverGateway, RouteTarget, ToolBackend};
use pretty_assertions::assert_eq;
use serde_json::json;

fn dead_backend(name: &str) -> Arc<dyn ToolBackend> {
    // Bind and drop to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = McpClientConfig::new(name, format!("http://{}/mcp", addr));
    config.request_timeout = Duration::from_secs(2);
    Arc::new(McpClient::new(config).unwrap())
}

fn backend(server: &MockMcpServer, name: &str) -> Arc<dyn ToolBackend> {
    Arc::new(McpClient::new(server.client_config(name)).unwrap())
}

#[tokio::test]
async fn test_read_routes_to_official_after_refresh() {
    let official = MockMcpServer::builder()
        .tool_result("notion_search", json!({"results": [1, 2]}))
        .start()
        .await
        .unwrap();
    let custom = MockMcpServer::builder().tool("notion_create_page").start().await.unwrap();
    let gateway = FailoverGateway::new(backend(&official, "official"), backend(&custom, "custom"));

    let (report, _) = gateway.refresh_catalog().await;
    assert_eq!(report.official, Ok(1));
    assert_eq!(report.custom, Ok(1));

    let outcome = gateway
        .route_and_call(RouteTarget::Auto, "notion_search", json!({"query": "roadmap"}))
        .await
        .unwrap();

    assert_eq!(outcome.backend, BackendId::Official);
    assert!(!outcome.failover_occurred);
    assert_eq!(outcome.payload, json!({"results": [1, 2]}));
    assert_eq!(official.tool_calls(), 1);
    assert_eq!(custom.tool_calls(), 0);
}

#[tokio::test]
async fn test_unreachable_primary_fails_over_to_official() {
    let official = MockMcpServer::builder().tool("notion_create_page").start().await.unwrap();
    let gateway = FailoverGateway::new(backend(&official, "official"), dead_backend("custom"));

    // Unknown to the empty catalog, so the primary is custom
    let outcome = gateway
        .route_and_call(RouteTarget::Auto, "notion_create_page", json!({"title": "x"}))
        .await
        .unwrap();

    assert_eq!(outcome.backend, BackendId::Official);
    assert!(outcome.failover_occurred);
    let failover = outcome.failover.unwrap();
    assert_eq!(failover.from, BackendId::Custom);
    assert!(failover.reason.starts_with("Transport error"));
    assert_eq!(official.tool_calls(), 1);
    assert_eq!(official.last_arguments(), Some(json!({"title": "x"})));
}

#[tokio::test]
async fn test_upstream_error_fails_over() {
    let official = MockMcpServer::builder()
        .tool("notion_search")
        .fail_calls("rate limited upstream")
        .start()
        .await
        .unwrap();
    let custom = MockMcpServer::builder().tool("notion_search").start().await.unwrap();
    let gateway = FailoverGateway::new(backend(&official, "official"), backend(&custom, "custom"));
    gateway.refresh_catalog().await;

    let outcome = gateway
        .route_and_call(RouteTarget::Auto, "notion_search", json!({}))
        .await
        .unwrap();

    assert_eq!(outcome.backend, BackendId::Custom);
    assert!(outcome.failover.unwrap().reason.contains("rate limited upstream"));
    assert_eq!(official.tool_calls(), 1);
    assert_eq!(custom.tool_calls(), 1);
}

#[tokio::test]
async fn test_both_backends_failing_reports_both() {
    let custom = MockMcpServer::builder().http_error_on_calls().start().await.unwrap();
    let gateway = FailoverGateway::new(dead_backend("official"), backend(&custom, "custom"));

    let err = gateway
        .route_and_call(RouteTarget::Explicit(BackendId::Custom), "notion_search", json!({}))
        .await
        .unwrap_err();

    assert_eq!(err.primary.backend, BackendId::Custom);
    assert!(matches!(err.primary.error, ClientError::Transport { .. }));
    assert_eq!(err.fallback.backend, BackendId::Official);
    assert_eq!(err.fallback.error.kind(), "transport");
    assert_eq!(custom.tool_calls(), 1);
}

#[tokio::test]
async fn test_refresh_tolerates_one_backend_down() {
    let official = MockMcpServer::builder().tool("notion_search").start().await.unwrap();
    let custom = MockMcpServer::builder()
        .tool("API-post-page")
        .fail_listing()
        .start()
        .await
        .unwrap();
    let gateway = FailoverGateway::new(backend(&official, "official"), backend(&custom, "custom"));

    let (report, snapshot) = gateway.refresh_catalog().await;

    assert_eq!(report.official, Ok(1));
    assert!(report.custom.is_err());
    assert!(!report.both_failed());
    assert_eq!(snapshot.tool_names(BackendId::Official), vec!["notion_search"]);
    assert!(snapshot.tools(BackendId::Custom).is_empty());
}
