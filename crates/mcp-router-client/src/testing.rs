//! Test utilities for mcp-router-client
//!
//! [`MockMcpServer`] is an in-process MCP backend speaking the same wire
//! format as a real server: `initialize` returns an `mcp-session-id` header,
//! every response is a single `event: message` SSE frame, and later calls
//! must carry the issued session id.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use tokio::net::TcpListener;

use crate::client::{McpClient, McpClientConfig, PROTOCOL_VERSION, SESSION_HEADER};
use crate::{ClientResult, ToolDefinition};

/// Path the mock serves the protocol on
pub const MCP_PATH: &str = "/mcp";

/// How the mock answers `tools/call`
#[derive(Debug, Clone)]
enum CallBehavior {
    /// Echo the tool name and arguments as text content
    Echo,
    /// Answer with a JSON-RPC error carrying this message
    Error(String),
    /// Answer with HTTP 500
    HttpError,
}

#[derive(Debug)]
struct MockState {
    tools: Vec<ToolDefinition>,
    results: HashMap<String, serde_json::Value>,
    call_behavior: CallBehavior,
    list_fails: bool,
    send_session_header: bool,
    send_frame: bool,
    handshake_delay: Duration,
    call_delay: Duration,
    tool_delays: HashMap<String, Duration>,
    sessions: Mutex<Vec<String>>,
    handshakes: AtomicUsize,
    tool_calls: AtomicUsize,
    list_calls: AtomicUsize,
    last_arguments: Mutex<Option<serde_json::Value>>,
}

/// Builder for [`MockMcpServer`]
#[derive(Debug)]
pub struct MockMcpServerBuilder {
    state: MockState,
}

impl MockMcpServerBuilder {
    /// Advertise a tool with this name
    pub fn tool(mut self, name: &str) -> Self {
        self.state.tools.push(
            ToolDefinition::named(name).with_description(format!("Mock tool {}", name)),
        );
        self
    }

    /// Return a fixed `result` for calls to `name`
    pub fn tool_result(mut self, name: &str, result: serde_json::Value) -> Self {
        self.state.results.insert(name.to_string(), result);
        self
    }

    /// Every `tools/call` answers with a JSON-RPC error
    pub fn fail_calls(mut self, message: &str) -> Self {
        self.state.call_behavior = CallBehavior::Error(message.to_string());
        self
    }

    /// Every `tools/call` answers with HTTP 500
    pub fn http_error_on_calls(mut self) -> Self {
        self.state.call_behavior = CallBehavior::HttpError;
        self
    }

    /// Every `tools/list` answers with a JSON-RPC error
    pub fn fail_listing(mut self) -> Self {
        self.state.list_fails = true;
        self
    }

    /// Omit the session header from the handshake response
    pub fn without_session_header(mut self) -> Self {
        self.state.send_session_header = false;
        self
    }

    /// Send an event stream with no data frame
    pub fn without_frames(mut self) -> Self {
        self.state.send_frame = false;
        self
    }

    /// Delay the handshake response
    pub fn handshake_delay(mut self, delay: Duration) -> Self {
        self.state.handshake_delay = delay;
        self
    }

    /// Delay `tools/call` responses
    pub fn call_delay(mut self, delay: Duration) -> Self {
        self.state.call_delay = delay;
        self
    }

    /// Delay `tools/call` responses for `name` only, overriding [`call_delay`](Self::call_delay)
    pub fn tool_delay(mut self, name: &str, delay: Duration) -> Self {
        self.state.tool_delays.insert(name.to_string(), delay);
        self
    }

    /// Bind to an ephemeral port and start serving
    pub async fn start(self) -> ClientResult<MockMcpServer> {
        let state = Arc::new(self.state);
        let router = Router::new()
            .route(MCP_PATH, post(handle_rpc))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| crate::ClientError::transport(e.to_string()))?;
        let addr = listener
            .local_addr()
            .map_err(|e| crate::ClientError::transport(e.to_string()))?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Ok(MockMcpServer {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }
}

/// A mock MCP backend that shuts down when dropped
pub struct MockMcpServer {
    /// Bound address
    pub addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl MockMcpServer {
    /// Start configuring a mock server
    pub fn builder() -> MockMcpServerBuilder {
        MockMcpServerBuilder {
            state: MockState {
                tools: Vec::new(),
                results: HashMap::new(),
                call_behavior: CallBehavior::Echo,
                list_fails: false,
                send_session_header: true,
                send_frame: true,
                handshake_delay: Duration::ZERO,
                call_delay: Duration::ZERO,
                tool_delays: HashMap::new(),
                sessions: Mutex::new(Vec::new()),
                handshakes: AtomicUsize::new(0),
                tool_calls: AtomicUsize::new(0),
                list_calls: AtomicUsize::new(0),
                last_arguments: Mutex::new(None),
            },
        }
    }

    /// Protocol endpoint URL
    pub fn url(&self) -> String {
        format!("http://{}{}", self.addr, MCP_PATH)
    }

    /// Client config pointing at this server
    pub fn client_config(&self, name: &str) -> McpClientConfig {
        McpClientConfig {
            name: name.to_string(),
            base_url: self.url(),
            auth_token: "test-token".to_string(),
            request_timeout: Duration::from_secs(5),
        }
    }

    /// A fresh client pointing at this server
    pub fn client(&self) -> ClientResult<McpClient> {
        McpClient::new(self.client_config("mock"))
    }

    /// Number of `initialize` requests received
    pub fn handshakes(&self) -> usize {
        self.state.handshakes.load(Ordering::SeqCst)
    }

    /// Number of `tools/call` requests received
    pub fn tool_calls(&self) -> usize {
        self.state.tool_calls.load(Ordering::SeqCst)
    }

    /// Number of `tools/list` requests received
    pub fn list_calls(&self) -> usize {
        self.state.list_calls.load(Ordering::SeqCst)
    }

    /// Arguments of the most recent `tools/call`
    pub fn last_arguments(&self) -> Option<serde_json::Value> {
        self.state.last_arguments.lock().clone()
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for MockMcpServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn handle_rpc(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(request): Json<serde_json::Value>,
) -> Response {
    let id = request.get("id").cloned().unwrap_or(serde_json::Value::Null);
    let method = request
        .get("method")
        .and_then(|m| m.as_str())
        .unwrap_or_default()
        .to_string();
    let params = request
        .get("params")
        .cloned()
        .unwrap_or(serde_json::Value::Null);

    if method == "initialize" {
        state.handshakes.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(state.handshake_delay).await;
        let session_id = uuid::Uuid::new_v4().to_string();
        state.sessions.lock().push(session_id.clone());
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": {
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {"tools": {}},
                "serverInfo": {"name": "mock-mcp", "version": "0.0.0"}
            }
        });
        let session = state.send_session_header.then_some(session_id);
        return sse_response(&state, session, &body);
    }

    let known_session = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|s| state.sessions.lock().iter().any(|known| known == s));
    if !known_session {
        return (StatusCode::BAD_REQUEST, "Bad Request: No valid session ID provided")
            .into_response();
    }

    let body = match method.as_str() {
        "tools/list" => {
            state.list_calls.fetch_add(1, Ordering::SeqCst);
            if state.list_fails {
                rpc_error(&id, -32603, "listing unavailable")
            } else {
                serde_json::json!({"jsonrpc": "2.0", "id": id, "result": {"tools": state.tools}})
            }
        }
        "tools/call" => {
            state.tool_calls.fetch_add(1, Ordering::SeqCst);
            let name = params
                .get("name")
                .and_then(|n| n.as_str())
                .unwrap_or_default()
                .to_string();
            let delay = state
                .tool_delays
                .get(&name)
                .copied()
                .unwrap_or(state.call_delay);
            tokio::time::sleep(delay).await;
            let arguments = params
                .get("arguments")
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            *state.last_arguments.lock() = Some(arguments.clone());

            match &state.call_behavior {
                CallBehavior::HttpError => {
                    return (StatusCode::INTERNAL_SERVER_ERROR, "backend exploded").into_response();
                }
                CallBehavior::Error(message) => rpc_error(&id, -32000, message),
                CallBehavior::Echo => {
                    if let Some(result) = state.results.get(&name) {
                        serde_json::json!({"jsonrpc": "2.0", "id": id, "result": result})
                    } else if state.tools.iter().any(|t| t.name == name) {
                        let text = serde_json::json!({"tool": name, "arguments": arguments});
                        serde_json::json!({
                            "jsonrpc": "2.0",
                            "id": id,
                            "result": {"content": [{"type": "text", "text": text.to_string()}]}
                        })
                    } else {
                        rpc_error(&id, -32602, &format!("Unknown tool: {}", name))
                    }
                }
            }
        }
        other => rpc_error(&id, -32601, &format!("Method not found: {}", other)),
    };

    sse_response(&state, None, &body)
}

fn rpc_error(id: &serde_json::Value, code: i64, message: &str) -> serde_json::Value {
    serde_json::json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}})
}

fn sse_response(state: &MockState, session_id: Option<String>, body: &serde_json::Value) -> Response {
    let payload = if state.send_frame {
        format!("event: message\ndata: {}\n\n", body)
    } else {
        ": no frames here\n\n".to_string()
    };

    let mut response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/event-stream")],
        payload,
    )
        .into_response();

    if let Some(id) = session_id.and_then(|id| HeaderValue::from_str(&id).ok()) {
        response.headers_mut().insert(SESSION_HEADER, id);
    }
    response
}
