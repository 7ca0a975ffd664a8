//! Result of one routed tool call

use serde::Serialize;

use super::BackendId;

/// Details recorded when the primary backend failed and the alternate answered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailoverInfo {
    /// Backend that failed first
    pub from: BackendId,
    /// Error message from that backend
    pub reason: String,
}

/// Successful outcome of a routed call.
///
/// A dual-backend failure is reported as an error by the gateway instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallOutcome {
    /// Backend that produced the payload
    pub backend: BackendId,
    /// Wall-clock time across all attempts
    pub duration_ms: u64,
    /// Whether the alternate backend had to be used
    pub failover_occurred: bool,
    /// Present when `failover_occurred` is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failover: Option<FailoverInfo>,
    /// JSON-RPC `result` member returned by the backend
    #[serde(skip)]
    pub payload: serde_json::Value,
}
