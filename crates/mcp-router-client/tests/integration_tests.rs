//! Integration tests for mcp-router-client
//!
//! These tests run the client against the in-process mock backend from the
//! `testing` module, so the real HTTP and SSE framing paths are exercised.

use std::sync::Arc;
use std::time::Duration;

use mcp_router_client::testing::MockMcpServer;
use mcp_router_client::{ClientError, McpClient, McpClientConfig, SessionPhase, ToolBackend};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

// =============================================================================
// Handshake
// =============================================================================

#[tokio::test]
async fn test_initialize_establishes_session() {
    let server = MockMcpServer::builder().tool("notion_search").start().await.unwrap();
    let client = server.client().unwrap();

    let session_id = client.initialize().await.unwrap();

    assert!(!session_id.is_empty());
    assert_eq!(client.phase(), SessionPhase::Ready);
    assert_eq!(client.session_id(), Some(session_id));
    assert_eq!(server.handshakes(), 1);
}

#[tokio::test]
async fn test_initialize_is_a_noop_when_ready() {
    let server = MockMcpServer::builder().start().await.unwrap();
    let client = server.client().unwrap();

    let first = client.initialize().await.unwrap();
    let second = client.initialize().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(server.handshakes(), 1);
}

#[tokio::test]
async fn test_concurrent_initialize_sends_one_handshake() {
    let server = MockMcpServer::builder()
        .handshake_delay(Duration::from_millis(100))
        .start()
        .await
        .unwrap();
    let client = Arc::new(server.client().unwrap());

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let client = Arc::clone(&client);
        tasks.push(tokio::spawn(async move { client.initialize().await }));
    }

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().unwrap());
    }

    assert_eq!(server.handshakes(), 1);
    assert!(ids.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn test_missing_session_header_is_protocol_error() {
    let server = MockMcpServer::builder()
        .without_session_header()
        .start()
        .await
        .unwrap();
    let client = server.client().unwrap();

    let err = client.initialize().await.unwrap_err();

    assert!(matches!(err, ClientError::Protocol(ref m) if m.contains("mcp-session-id")));
    assert_eq!(client.phase(), SessionPhase::Initializing);
}

#[tokio::test]
async fn test_missing_frame_is_protocol_error() {
    let server = MockMcpServer::builder().without_frames().start().await.unwrap();
    let client = server.client().unwrap();

    let err = client.initialize().await.unwrap_err();

    assert_eq!(err, ClientError::Protocol("No SSE data frame".to_string()));
}

#[tokio::test]
async fn test_failed_handshake_is_retried_on_next_call() {
    let server = MockMcpServer::builder()
        .without_session_header()
        .start()
        .await
        .unwrap();
    let client = server.client().unwrap();

    assert_err!(client.initialize().await);
    assert_err!(client.initialize().await);

    assert_eq!(server.handshakes(), 2);
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    // Bind and drop to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = McpClient::new(McpClientConfig {
        name: "dead".into(),
        base_url: format!("http://{}/mcp", addr),
        auth_token: String::new(),
        request_timeout: Duration::from_secs(2),
    })
    .unwrap();

    let err = client.list_tools().await.unwrap_err();
    assert_eq!(err.kind(), "transport");
}

// =============================================================================
// Tool listing and calls
// =============================================================================

#[tokio::test]
async fn test_list_tools_keys_by_name() {
    let server = MockMcpServer::builder()
        .tool("notion_search")
        .tool("API-post-page")
        .start()
        .await
        .unwrap();
    let client = server.client().unwrap();

    let tools = client.list_tools().await.unwrap();

    assert_eq!(tools.len(), 2);
    assert!(tools.contains_key("notion_search"));
    assert_eq!(
        tools["API-post-page"].description.as_deref(),
        Some("Mock tool API-post-page")
    );
    assert_eq!(server.handshakes(), 1);
}

#[tokio::test]
async fn test_call_tool_returns_result() {
    let server = MockMcpServer::builder()
        .tool("notion_search")
        .tool_result("notion_search", json!({"results": [1, 2, 3]}))
        .start()
        .await
        .unwrap();
    let client = server.client().unwrap();

    let result = client
        .call_tool("notion_search", json!({"query": "roadmap"}))
        .await
        .unwrap();

    assert_eq!(result, json!({"results": [1, 2, 3]}));
    assert_eq!(server.last_arguments(), Some(json!({"query": "roadmap"})));
}

#[tokio::test]
async fn test_session_is_reused_across_calls() {
    let server = MockMcpServer::builder().tool("echo").start().await.unwrap();
    let client = server.client().unwrap();

    for i in 0..5 {
        assert_ok!(client.call_tool("echo", json!({"i": i})).await);
    }
    assert_ok!(client.list_tools().await);

    assert_eq!(server.handshakes(), 1);
    assert_eq!(server.tool_calls(), 5);
    assert_eq!(server.list_calls(), 1);
}

#[tokio::test]
async fn test_upstream_error_message_is_preserved() {
    let server = MockMcpServer::builder()
        .tool("notion_search")
        .fail_calls("Notion API rate limited")
        .start()
        .await
        .unwrap();
    let client = server.client().unwrap();

    let err = client.call_tool("notion_search", json!({})).await.unwrap_err();

    assert_eq!(
        err,
        ClientError::Upstream {
            code: Some(-32000),
            message: "Notion API rate limited".to_string()
        }
    );
}

#[tokio::test]
async fn test_unknown_tool_surfaces_upstream_error() {
    let server = MockMcpServer::builder().start().await.unwrap();
    let client = server.client().unwrap();

    let err = client.call_tool("nope", json!({})).await.unwrap_err();

    assert!(matches!(err, ClientError::Upstream { ref message, .. } if message == "Unknown tool: nope"));
}

#[tokio::test]
async fn test_http_error_status_is_transport_error() {
    let server = MockMcpServer::builder()
        .tool("x")
        .http_error_on_calls()
        .start()
        .await
        .unwrap();
    let client = server.client().unwrap();

    let err = client.call_tool("x", json!({})).await.unwrap_err();

    assert!(matches!(err, ClientError::Transport { ref message, timed_out: false } if message.contains("HTTP 500")));
}

#[tokio::test]
async fn test_call_timeout_is_transport_error_with_marker() {
    let server = MockMcpServer::builder()
        .tool("slow")
        .call_delay(Duration::from_secs(2))
        .start()
        .await
        .unwrap();
    let mut config = server.client_config("slow");
    config.request_timeout = Duration::from_millis(200);
    let client = McpClient::new(config).unwrap();

    let err = client.call_tool("slow", json!({})).await.unwrap_err();

    assert!(err.is_timeout());
    // The session survives a timed-out call
    assert_eq!(client.phase(), SessionPhase::Ready);
}

#[tokio::test]
async fn test_timed_out_call_leaves_concurrent_calls_alone() {
    let server = MockMcpServer::builder()
        .tool("slow")
        .tool("fast")
        .tool_result("fast", json!({"ok": true}))
        .tool_delay("slow", Duration::from_secs(2))
        .start()
        .await
        .unwrap();
    let mut config = server.client_config("mixed");
    config.request_timeout = Duration::from_millis(300);
    let client = McpClient::new(config).unwrap();

    let (slow, fast) = tokio::join!(
        client.call_tool("slow", json!({})),
        client.call_tool("fast", json!({}))
    );

    assert!(slow.unwrap_err().is_timeout());
    assert_eq!(fast.unwrap(), json!({"ok": true}));

    // The same session keeps serving after the timeout
    let after = assert_ok!(client.call_tool("fast", json!({})).await);
    assert_eq!(after, json!({"ok": true}));
    assert_eq!(client.phase(), SessionPhase::Ready);
    assert_eq!(server.handshakes(), 1);
}

#[tokio::test]
async fn test_concurrent_calls_share_one_session() {
    let server = MockMcpServer::builder()
        .tool("echo")
        .tool_result("echo", json!({"ok": true}))
        .start()
        .await
        .unwrap();
    let client = Arc::new(server.client().unwrap());

    let results = futures::future::join_all((0..4).map(|i| {
        let client = Arc::clone(&client);
        async move { client.call_tool("echo", json!({"i": i})).await }
    }))
    .await;

    assert!(results.iter().all(|r| r.as_ref().is_ok_and(|v| v["ok"] == true)));
    assert_eq!(server.handshakes(), 1);
}

#[tokio::test]
async fn test_client_implements_tool_backend() {
    let server = MockMcpServer::builder().tool("a").start().await.unwrap();
    let backend: Arc<dyn ToolBackend> = Arc::new(server.client().unwrap());

    let tools = backend.list_tools().await.unwrap();

    assert!(tools.contains_key("a"));
}
