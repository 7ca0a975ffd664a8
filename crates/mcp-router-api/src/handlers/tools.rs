//! Generic tool-call passthrough

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use mcp_router_core::{CallOutcome, RouteTarget};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult};
use crate::handlers::routed_call;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ToolCallRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<Value>,
    #[serde(default)]
    pub target: Option<String>,
}

/// POST /mcp/tools.call
/// Route a tool call to a backend, failing over once if needed
pub async fn call_tool(
    State(state): State<AppState>,
    body: Result<Json<ToolCallRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let name = request
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing \"name\" in body for tools.call".into()))?;
    let target = RouteTarget::parse(request.target.as_deref()).map_err(ApiError::BadRequest)?;
    let arguments = match request.arguments {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(args @ Value::Object(_)) => args,
        Some(_) => {
            return Err(ApiError::BadRequest(
                "\"arguments\" must be an object".into(),
            ))
        }
    };

    let outcome = routed_call(&state, target, &name, arguments).await?;
    Ok(Json(into_response_body(outcome)))
}

/// Merge the routing fields with the backend's result.
///
/// Object results are flattened into the body; anything else goes under
/// `result`. Routing fields win over result members of the same name.
fn into_response_body(outcome: CallOutcome) -> Value {
    let mut body = match outcome.payload {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("result".to_string(), other);
            map
        }
    };

    body.insert("backend".into(), Value::from(outcome.backend.as_str()));
    body.insert("durationMs".into(), Value::from(outcome.duration_ms));
    body.insert(
        "failoverOccurred".into(),
        Value::Bool(outcome.failover_occurred),
    );
    if let Some(failover) = outcome.failover {
        body.insert(
            "failover".into(),
            serde_json::json!({"from": failover.from, "reason": failover.reason}),
        );
    }
    Value::Object(body)
}

#[cfg(test)]
mod tests {
    use mcp_router_core::{BackendId, FailoverInfo};
    use serde_json::json;

    use super::*;

    fn outcome(payload: Value, failover: Option<FailoverInfo>) -> CallOutcome {
        CallOutcome {
            backend: BackendId::Custom,
            duration_ms: 42,
            failover_occurred: failover.is_some(),
            failover,
            payload,
        }
    }

    #[test]
    fn object_results_are_flattened() {
        let body = into_response_body(outcome(
            json!({"content": [{"type": "text", "text": "hi"}], "backend": "spoofed"}),
            None,
        ));
        assert_eq!(
            body,
            json!({
                "backend": "custom",
                "durationMs": 42,
                "failoverOccurred": false,
                "content": [{"type": "text", "text": "hi"}]
            })
        );
    }

    #[test]
    fn scalar_results_go_under_result() {
        let body = into_response_body(outcome(
            json!("done"),
            Some(FailoverInfo {
                from: BackendId::Official,
                reason: "Transport error: refused".into(),
            }),
        ));
        assert_eq!(body["result"], "done");
        assert_eq!(body["failoverOccurred"], true);
        assert_eq!(body["failover"]["from"], "official");
        assert_eq!(body["failover"]["reason"], "Transport error: refused");
    }
}
