//! Current catalog snapshot, for operators

use axum::extract::State;
use axum::Json;
use mcp_router_core::BackendId;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct CatalogResponse {
    pub official: Vec<String>,
    pub custom: Vec<String>,
}

/// GET /catalog
/// Tool names per backend, sorted
pub async fn get_catalog(State(state): State<AppState>) -> Json<CatalogResponse> {
    let snapshot = state.gateway().catalog().snapshot();
    Json(CatalogResponse {
        official: snapshot.tool_names(BackendId::Official),
        custom: snapshot.tool_names(BackendId::Custom),
    })
}
