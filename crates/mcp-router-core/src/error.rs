//! Error types for calls against a single backend

use thiserror::Error;

/// Result type for backend calls
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to one backend.
///
/// Every variant is eligible for failover to the alternate backend.
/// The type is `Clone` so that one in-flight handshake result can be
/// handed to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Network failure, non-success HTTP status, or timeout
    #[error("Transport error: {message}")]
    Transport {
        /// Human-readable description
        message: String,
        /// Set when the per-call timeout elapsed before a response arrived
        timed_out: bool,
    },

    /// Missing or malformed framing (no session header, no data frame, bad JSON)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The backend answered with a JSON-RPC `error` member
    #[error("Upstream error: {message}")]
    Upstream {
        /// JSON-RPC error code, if the backend sent one
        code: Option<i64>,
        /// Backend-reported message, preserved verbatim
        message: String,
    },

    /// Client could not be constructed from its configuration
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Transport failure that is not a timeout
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            timed_out: false,
        }
    }

    /// Transport failure caused by the per-call timeout
    pub fn timeout(after_ms: u64) -> Self {
        Self::Transport {
            message: format!("request timed out after {}ms", after_ms),
            timed_out: true,
        }
    }

    /// Whether this error was produced by a call timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { timed_out: true, .. })
    }

    /// Short machine-readable kind, used for metrics labels and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { timed_out: true, .. } => "timeout",
            Self::Transport { .. } => "transport",
            Self::Protocol(_) => "protocol",
            Self::Upstream { .. } => "upstream",
            Self::InvalidConfig(_) => "config",
        }
    }
}
