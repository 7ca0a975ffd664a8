//! API error types and conversions

use std::time::Duration;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use mcp_router_core::BackendId;
use mcp_router_gateway::{BackendFailure, FailoverError};
use serde::Serialize;
use thiserror::Error;

/// API error type that converts to HTTP responses
#[derive(Debug, Error)]
pub enum ApiError {
    /// 400 Bad Request
    #[error("{0}")]
    BadRequest(String),
    /// 401 Unauthorized
    #[error("Unauthorized")]
    Unauthorized,
    /// 429 Too Many Requests, with the time until the oldest hit leaves the window
    #[error("Rate limit exceeded")]
    RateLimited { retry_after: Duration },
    /// 502 Bad Gateway - both backends failed a routed call
    #[error(transparent)]
    AllBackendsFailed(#[from] FailoverError),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Standard error response format
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Dual-backend failure response format
#[derive(Serialize)]
struct FailoverErrorResponse {
    error: &'static str,
    primary: FailureDetail,
    fallback: FailureDetail,
}

#[derive(Serialize)]
struct FailureDetail {
    backend: BackendId,
    error: String,
}

impl From<BackendFailure> for FailureDetail {
    fn from(failure: BackendFailure) -> Self {
        Self {
            backend: failure.backend,
            error: failure.error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::AllBackendsFailed(err) => {
                tracing::error!(
                    primary = %err.primary,
                    fallback = %err.fallback,
                    "Routed call failed on both backends"
                );
                let body = Json(FailoverErrorResponse {
                    error: "All backends failed",
                    primary: err.primary.into(),
                    fallback: err.fallback.into(),
                });
                (StatusCode::BAD_GATEWAY, body).into_response()
            }
            ApiError::RateLimited { retry_after } => {
                let secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(ErrorResponse {
                        error: "Rate limit exceeded".to_string(),
                    }),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs));
                response
            }
            ApiError::BadRequest(message) => {
                tracing::debug!(%message, "API client error");
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message })).into_response()
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Unauthorized".to_string(),
                }),
            )
                .into_response(),
        }
    }
}
