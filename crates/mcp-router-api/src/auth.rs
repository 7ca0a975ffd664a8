//! Bearer token authentication middleware
//!
//! Validates `Authorization: Bearer <token>` on every route except `/health`,
//! and except `/metrics` unless metrics auth is switched on. If no token is
//! configured, all requests pass through.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};

use crate::error::ApiError;
use crate::state::AppState;

/// Expected credential and which routes it guards
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Expected bearer token; `None` disables enforcement
    pub api_key: Option<String>,
    /// Whether `/metrics` requires the token too
    pub metrics_require_auth: bool,
}

impl AuthConfig {
    /// Whether `path` is checked against the token
    pub fn is_protected(&self, path: &str) -> bool {
        match path {
            "/health" => false,
            "/metrics" => self.metrics_require_auth,
            _ => true,
        }
    }
}

/// Short SHA-256 fingerprint of a credential, safe to log
pub fn fingerprint(secret: impl AsRef<[u8]>) -> String {
    let digest = Sha256::digest(secret.as_ref());
    let mut hex = hex::encode(digest);
    hex.truncate(12);
    hex
}

/// Axum middleware function that checks bearer token authentication.
///
/// Returns 401 `{"error": "Unauthorized"}` if the token is missing or wrong.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = state.auth();
    let expected = match auth.api_key.as_deref() {
        Some(key) if auth.is_protected(request.uri().path()) => key,
        _ => return Ok(next.run(request).await),
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(provided) if provided == expected => Ok(next.run(request).await),
        Some(provided) => {
            tracing::warn!(
                key_hash = %fingerprint(provided),
                path = %request.uri().path(),
                "Invalid bearer token"
            );
            Err(ApiError::Unauthorized)
        }
        None => {
            tracing::warn!(
                path = %request.uri().path(),
                "Missing or malformed Authorization header"
            );
            Err(ApiError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_twelve_hex_chars() {
        let fp = fingerprint("Bearer abc");
        assert_eq!(fp.len(), 12);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fp, fingerprint(b"Bearer abc"));
        assert_ne!(fp, fingerprint("Bearer abd"));
    }

    #[test]
    fn health_is_never_protected() {
        let auth = AuthConfig {
            api_key: Some("k".into()),
            metrics_require_auth: true,
        };
        assert!(!auth.is_protected("/health"));
        assert!(auth.is_protected("/metrics"));
        assert!(auth.is_protected("/mcp/tools.call"));

        let relaxed = AuthConfig {
            metrics_require_auth: false,
            ..auth
        };
        assert!(!relaxed.is_protected("/metrics"));
        assert!(relaxed.is_protected("/catalog"));
    }
}
