//! JSON-RPC 2.0 envelope types

use serde::{Deserialize, Serialize};

/// Outgoing JSON-RPC request
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<'a> {
    /// Always "2.0"
    pub jsonrpc: &'static str,
    /// Request id, unique per client
    pub id: u64,
    /// Method name (`initialize`, `tools/list`, `tools/call`)
    pub method: &'a str,
    /// Method parameters
    pub params: serde_json::Value,
}

impl<'a> JsonRpcRequest<'a> {
    /// Build a request envelope
    pub fn new(id: u64, method: &'a str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// Incoming JSON-RPC response, decoded from the first SSE data frame
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    /// Echoed request id
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    /// Success payload
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Failure payload
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error object
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    #[serde(default)]
    pub code: Option<i64>,
    /// Error message
    #[serde(default)]
    pub message: String,
    /// Optional extra data
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_with_version() {
        let req = JsonRpcRequest::new(7, "tools/list", serde_json::json!({}));
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"jsonrpc": "2.0", "id": 7, "method": "tools/list", "params": {}})
        );
    }

    #[test]
    fn response_with_error_decodes() {
        let resp: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found"}}"#,
        )
        .unwrap();
        assert!(resp.result.is_none());
        let err = resp.error.unwrap();
        assert_eq!(err.code, Some(-32601));
        assert_eq!(err.message, "Method not found");
    }
}
