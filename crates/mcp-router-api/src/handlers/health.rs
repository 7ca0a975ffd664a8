//! Liveness probe

use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub ts: String,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
