//! Sliding-window rate limiting for routed calls.
//!
//! Each key keeps a log of the instants of its accepted requests inside the
//! window. A request is accepted while the log holds fewer than `max`
//! entries; otherwise it is rejected with the time until the oldest entry
//! leaves the window. Keys whose log has gone stale are pruned at most once
//! per window.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use parking_lot::Mutex;

use crate::auth::fingerprint;
use crate::error::ApiError;
use crate::state::AppState;

/// Rate limit settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Length of the sliding window
    pub window: Duration,
    /// Requests accepted per key inside one window
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(900_000),
            max_requests: 100,
        }
    }
}

#[derive(Debug)]
struct Inner {
    hits: HashMap<String, VecDeque<Instant>>,
    last_prune: Instant,
}

/// Per-key sliding-window log limiter
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    inner: Mutex<Inner>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                hits: HashMap::new(),
                last_prune: Instant::now(),
            }),
        }
    }

    /// Record a request for `key` now
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        self.check_at(key, Instant::now())
    }

    /// Record a request for `key` at `now`.
    ///
    /// Returns `Err(retry_after)` when the key is over its limit; rejected
    /// requests are not recorded.
    pub fn check_at(&self, key: &str, now: Instant) -> Result<(), Duration> {
        let window = self.config.window;
        let mut inner = self.inner.lock();

        if now.saturating_duration_since(inner.last_prune) >= window {
            inner
                .hits
                .retain(|_, log| log.back().is_some_and(|last| now.saturating_duration_since(*last) < window));
            inner.last_prune = now;
        }

        let log = inner.hits.entry(key.to_string()).or_default();
        while log
            .front()
            .is_some_and(|first| now.saturating_duration_since(*first) >= window)
        {
            log.pop_front();
        }

        if log.len() >= self.config.max_requests as usize {
            let retry_after = log
                .front()
                .map(|first| window.saturating_sub(now.saturating_duration_since(*first)))
                .unwrap_or(window);
            return Err(retry_after);
        }

        log.push_back(now);
        Ok(())
    }

    /// Number of keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.inner.lock().hits.len()
    }
}

/// Rate-limit key for a request: the credential's fingerprint when an
/// `Authorization` header is present, the peer address otherwise
pub fn rate_limit_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    match headers
        .get(header::AUTHORIZATION)
        .map(|v| v.as_bytes())
        .filter(|v| !v.is_empty())
    {
        Some(auth) => format!("key:{}", fingerprint(auth)),
        None => match peer {
            Some(addr) => format!("ip:{}", addr.ip()),
            None => "ip:unknown".to_string(),
        },
    }
}

/// Axum middleware rejecting requests over the limit before they are routed
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = rate_limit_key(request.headers(), peer);

    if let Err(retry_after) = state.rate_limiter().check(&key) {
        tracing::warn!(
            key = %key,
            path = %request.uri().path(),
            retry_after_ms = retry_after.as_millis() as u64,
            "Rate limit exceeded"
        );
        return Err(ApiError::RateLimited { retry_after });
    }

    Ok(next.run(request).await)
}
