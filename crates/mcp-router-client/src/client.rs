//! MCP streamable-HTTP client implementation

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::FutureExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

use mcp_router_core::{ClientError, ClientResult, ToolBackend, ToolDefinition, ToolMap};

use crate::jsonrpc::{JsonRpcRequest, JsonRpcResponse};
use crate::session::{Session, SessionPhase};
use crate::sse::SseParser;

/// Protocol version requested during the handshake
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Response header carrying the session id, echoed on every later request
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Legacy session header some servers read instead of [`SESSION_HEADER`]
const LEGACY_SESSION_HEADER: &str = "mcp-session";

/// Accept both plain JSON and event streams, as the transport requires
const ACCEPT_VALUE: &str = "application/json, text/event-stream";

/// Hard cap on a single response body
const MAX_RESPONSE_BYTES: usize = 8 * 1024 * 1024;

/// How much of a non-2xx body is read for the error message
const ERROR_BODY_BYTES: usize = 4 * 1024;

/// Default per-call timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for one backend client
#[derive(Debug, Clone)]
pub struct McpClientConfig {
    /// Label used in logs (e.g. "official")
    pub name: String,
    /// Full endpoint URL (e.g. "http://notion_mcp:3030/mcp")
    pub base_url: String,
    /// Bearer credential; empty disables the `Authorization` header
    pub auth_token: String,
    /// Per-call timeout, covering send and reading the first frame
    pub request_timeout: Duration,
}

impl McpClientConfig {
    /// Config with the default timeout and no credential
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            auth_token: String::new(),
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Everything needed to perform one HTTP exchange. Cheap to clone, so the
/// shared handshake future can own a copy.
#[derive(Debug, Clone)]
struct Transport {
    http: Client,
    endpoint: Url,
    auth_token: String,
    timeout: Duration,
}

/// A decoded exchange: the session header (if any) and the JSON-RPC message
struct Exchange {
    session_id: Option<String>,
    message: JsonRpcResponse,
}

impl Transport {
    fn headers(&self, session_id: Option<&str>) -> ClientResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        if !self.auth_token.is_empty() {
            let value = HeaderValue::from_str(&format!("Bearer {}", self.auth_token))
                .map_err(|e| ClientError::InvalidConfig(format!("Invalid auth token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }
        if let Some(id) = session_id {
            let value = HeaderValue::from_str(id)
                .map_err(|e| ClientError::Protocol(format!("Invalid session id: {}", e)))?;
            headers.insert(SESSION_HEADER, value.clone());
            headers.insert(LEGACY_SESSION_HEADER, value);
        }
        Ok(headers)
    }

    /// POST one request and decode the first SSE frame, bounded by the timeout
    async fn exchange(
        &self,
        request: &JsonRpcRequest<'_>,
        session_id: Option<&str>,
    ) -> ClientResult<Exchange> {
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        match tokio::time::timeout(self.timeout, self.exchange_inner(request, session_id)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::timeout(timeout_ms)),
        }
    }

    async fn exchange_inner(
        &self,
        request: &JsonRpcRequest<'_>,
        session_id: Option<&str>,
    ) -> ClientResult<Exchange> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .headers(self.headers(session_id)?)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(response).await;
            return Err(ClientError::transport(format!(
                "HTTP {}: {}",
                status.as_u16(),
                preview(&body)
            )));
        }

        let session_id = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let is_event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("text/event-stream"));
        if !is_event_stream {
            return Err(ClientError::Protocol(
                "response is not an event stream".to_string(),
            ));
        }

        let message = read_first_frame(response).await?;
        Ok(Exchange {
            session_id,
            message,
        })
    }

    /// Perform the `initialize` handshake and return the session id
    async fn handshake(self, client_name: String) -> ClientResult<String> {
        let request = JsonRpcRequest::new(
            0,
            "initialize",
            serde_json::json!({
                "clientInfo": {"name": "mcp-router", "version": env!("CARGO_PKG_VERSION")},
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
            }),
        );

        let exchange = self.exchange(&request, None).await?;
        let session_id = exchange.session_id.ok_or_else(|| {
            ClientError::Protocol(format!("No {} returned by server", SESSION_HEADER))
        })?;

        let result = into_result(exchange.message)?;
        let version = result
            .get("protocolVersion")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ClientError::Protocol("initialize result has no protocolVersion".to_string())
            })?;

        info!(backend = %client_name, protocol_version = %version, "MCP session initialized");
        Ok(session_id)
    }
}

/// MCP client for one backend.
///
/// Cheap to share behind an `Arc`; concurrent calls reuse one session.
pub struct McpClient {
    name: String,
    transport: Transport,
    session: Session,
    next_id: AtomicU64,
}

impl McpClient {
    /// Create a new client. No network traffic happens until first use.
    pub fn new(config: McpClientConfig) -> ClientResult<Self> {
        let endpoint = Url::parse(&config.base_url).map_err(|e| {
            ClientError::InvalidConfig(format!("Invalid URL '{}': {}", config.base_url, e))
        })?;

        let http = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(config.request_timeout))
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            name: config.name,
            transport: Transport {
                http,
                endpoint,
                auth_token: config.auth_token,
                timeout: config.request_timeout,
            },
            session: Session::new(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Wrap in an `Arc` for sharing between tasks
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Log label
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current session phase
    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    /// Session id, once the handshake has completed
    pub fn session_id(&self) -> Option<String> {
        self.session.session_id()
    }

    /// Establish the session if needed and return its id.
    ///
    /// Concurrent callers share a single in-flight handshake.
    #[instrument(skip(self), fields(backend = %self.name))]
    pub async fn initialize(&self) -> ClientResult<String> {
        let transport = self.transport.clone();
        let name = self.name.clone();
        self.session
            .ensure(move || {
                debug!(backend = %name, "Starting MCP handshake");
                transport.handshake(name).boxed()
            })
            .await
    }

    /// Issue a JSON-RPC call and return its `result` member
    #[instrument(skip(self, params), fields(backend = %self.name))]
    pub async fn rpc(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> ClientResult<serde_json::Value> {
        let session_id = self.initialize().await?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);

        let exchange = self.transport.exchange(&request, Some(&session_id)).await;
        if let Err(ref e) = exchange {
            warn!(backend = %self.name, method, error = %e, "MCP call failed");
        }
        into_result(exchange?.message)
    }

    /// List the backend's tools, keyed by name
    pub async fn list_tools(&self) -> ClientResult<ToolMap> {
        let result = self.rpc("tools/list", serde_json::json!({})).await?;
        let tools = match result.get("tools") {
            Some(raw) => serde_json::from_value::<Vec<ToolDefinition>>(raw.clone())
                .map_err(|e| ClientError::Protocol(format!("Invalid tools/list result: {}", e)))?,
            None => Vec::new(),
        };
        debug!(backend = %self.name, count = tools.len(), "Listed tools");
        Ok(mcp_router_core::tool_map(tools))
    }

    /// Invoke a tool and return the `result` member
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> ClientResult<serde_json::Value> {
        self.rpc(
            "tools/call",
            serde_json::json!({"name": name, "arguments": arguments}),
        )
        .await
    }
}

#[async_trait]
impl ToolBackend for McpClient {
    async fn list_tools(&self) -> ClientResult<ToolMap> {
        McpClient::list_tools(self).await
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> ClientResult<serde_json::Value> {
        McpClient::call_tool(self, name, arguments).await
    }
}

/// Read chunks until the first SSE data frame is complete, then decode it
async fn read_first_frame(mut response: reqwest::Response) -> ClientResult<JsonRpcResponse> {
    let mut parser = SseParser::new();
    let mut total = 0usize;

    let frame = loop {
        match response.chunk().await.map_err(map_reqwest_error)? {
            Some(chunk) => {
                total += chunk.len();
                if total > MAX_RESPONSE_BYTES {
                    return Err(ClientError::Protocol(format!(
                        "response exceeded {} bytes before the first frame",
                        MAX_RESPONSE_BYTES
                    )));
                }
                if let Some(frame) = parser.feed(&chunk) {
                    break Some(frame);
                }
            }
            None => break parser.finish(),
        }
    };

    let frame = frame.ok_or_else(|| missing_frame_error(&parser))?;
    serde_json::from_str(&frame.data).map_err(|e| {
        ClientError::Protocol(format!(
            "Invalid JSON-RPC payload: {} (data: {})",
            e,
            preview(&frame.data)
        ))
    })
}

fn missing_frame_error(parser: &SseParser) -> ClientError {
    if parser.saw_invalid_utf8() {
        ClientError::Protocol("invalid UTF-8 in SSE frame".to_string())
    } else {
        ClientError::Protocol("No SSE data frame".to_string())
    }
}

/// Read at most [`ERROR_BODY_BYTES`] of an error body; read failures end it early
async fn read_error_body(mut response: reqwest::Response) -> String {
    let mut body = Vec::new();
    while body.len() < ERROR_BODY_BYTES {
        match response.chunk().await {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            _ => break,
        }
    }
    body.truncate(ERROR_BODY_BYTES);
    String::from_utf8_lossy(&body).into_owned()
}

/// Split a JSON-RPC message into its result or an upstream error
fn into_result(message: JsonRpcResponse) -> ClientResult<serde_json::Value> {
    if let Some(error) = message.error {
        let message = if error.message.is_empty() {
            "unknown error".to_string()
        } else {
            error.message
        };
        return Err(ClientError::Upstream {
            code: error.code,
            message,
        });
    }
    message
        .result
        .ok_or_else(|| ClientError::Protocol("JSON-RPC response has no result".to_string()))
}

/// Map a reqwest failure to a transport error
fn map_reqwest_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Transport {
            message: e.to_string(),
            timed_out: true,
        }
    } else {
        ClientError::transport(e.to_string())
    }
}

/// First 200 chars of a body, for error messages
fn preview(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(200) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
