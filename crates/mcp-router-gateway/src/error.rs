//! Dual-backend failure

use std::fmt;

use mcp_router_core::{BackendId, ClientError};
use thiserror::Error;

/// One backend's failure during a routed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFailure {
    /// Backend that failed
    pub backend: BackendId,
    /// What went wrong
    pub error: ClientError,
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.backend, self.error)
    }
}

/// Both the primary and the alternate backend failed.
///
/// Carries both failures; neither is ever dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("All backends failed (primary {primary}; fallback {fallback})")]
pub struct FailoverError {
    /// Failure of the first backend tried
    pub primary: BackendFailure,
    /// Failure of the alternate backend
    pub fallback: BackendFailure,
}
