//! Page creation convenience endpoint

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use mcp_router_core::RouteTarget;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::handlers::routed_call;
use crate::pages::{normalize_page_result, CreatePageRequest, PAGE_CREATE_TOOL};
use crate::state::AppState;

/// POST /notion/pages.create
/// Create a database page through the routed `API-post-page` tool
pub async fn create_page(
    State(state): State<AppState>,
    body: Result<Json<CreatePageRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let arguments = request.to_arguments()?;

    let outcome = routed_call(&state, RouteTarget::Auto, PAGE_CREATE_TOOL, arguments).await?;
    Ok(Json(normalize_page_result(outcome.payload)))
}
