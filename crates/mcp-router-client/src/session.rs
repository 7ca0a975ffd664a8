//! Session state for one backend.
//!
//! The handshake is single-flight: the first caller that finds no usable
//! session installs a shared handshake future, and every concurrent caller
//! awaits that same future instead of sending another `initialize`.

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use mcp_router_core::ClientResult;

/// In-flight handshake, resolving to the session id
pub(crate) type Handshake = Shared<BoxFuture<'static, ClientResult<String>>>;

/// Observable phase of a client's session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No handshake attempted yet
    Uninitialized,
    /// A handshake is in flight, or the last attempt failed
    Initializing,
    /// Session id established
    Ready,
}

enum SessionState {
    Uninitialized,
    Initializing(Handshake),
    Ready(String),
}

/// Owner of the session state machine.
///
/// Transitions are `Uninitialized -> Initializing -> Ready` only. A failed
/// attempt stays in `Initializing`; the next caller replaces it with a
/// fresh attempt.
pub(crate) struct Session {
    state: Mutex<SessionState>,
}

impl Session {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(SessionState::Uninitialized),
        }
    }

    pub(crate) fn phase(&self) -> SessionPhase {
        match &*self.state.lock() {
            SessionState::Uninitialized => SessionPhase::Uninitialized,
            SessionState::Initializing(_) => SessionPhase::Initializing,
            SessionState::Ready(_) => SessionPhase::Ready,
        }
    }

    pub(crate) fn session_id(&self) -> Option<String> {
        match &*self.state.lock() {
            SessionState::Ready(id) => Some(id.clone()),
            _ => None,
        }
    }

    /// Return the session id, running `start` only if no usable handshake
    /// exists yet.
    pub(crate) async fn ensure<F>(&self, start: F) -> ClientResult<String>
    where
        F: FnOnce() -> BoxFuture<'static, ClientResult<String>>,
    {
        let handshake = {
            let mut state = self.state.lock();
            match &*state {
                SessionState::Ready(id) => return Ok(id.clone()),
                SessionState::Initializing(inflight) if !failed(inflight) => inflight.clone(),
                _ => {
                    let fresh = start().shared();
                    *state = SessionState::Initializing(fresh.clone());
                    fresh
                }
            }
        };

        let session_id = handshake.await?;

        let mut state = self.state.lock();
        if !matches!(&*state, SessionState::Ready(_)) {
            *state = SessionState::Ready(session_id.clone());
        }
        Ok(session_id)
    }
}

fn failed(handshake: &Handshake) -> bool {
    matches!(handshake.peek(), Some(Err(_)))
}
