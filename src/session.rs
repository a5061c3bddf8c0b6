//! Sessions scoped to one attached target.
//!
//! A [`Session`] wraps the shared [`Connection`] with a fixed session id, so
//! every command it issues is scoped to its target. Sessions come from
//! [`TargetRegistry::attach`](crate::browser::TargetRegistry::attach).
//!
//! ```text
//! Discovered ──attach──► Attached ──detach / target gone──► Detached
//! ```
//!
//! A detached session never becomes attached again; re-attaching the same
//! target yields a new session.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::identifiers::{SessionId, TargetId};
use crate::protocol::{Command, Event};
use crate::transport::Connection;

// ============================================================================
// CommandSender
// ============================================================================

/// Anything that can issue CDP commands.
///
/// Implemented by [`Connection`] (browser-level, unscoped) and [`Session`]
/// (scoped to one target).
#[async_trait]
pub trait CommandSender: Send + Sync {
    /// Sends a raw command and waits for its result.
    async fn send_command(&self, method: &str, params: Value) -> Result<Value>;

    /// Sends a typed command.
    async fn execute(&self, command: Command) -> Result<Value> {
        let (method, params) = command.to_parts()?;
        self.send_command(&method, params).await
    }
}

#[async_trait]
impl CommandSender for Connection {
    async fn send_command(&self, method: &str, params: Value) -> Result<Value> {
        Connection::send_command(self, method, params, None).await
    }
}

// ============================================================================
// SessionState
// ============================================================================

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Commands are routed to the target.
    Attached,
    /// Terminal; every command fails with [`Error::SessionClosed`].
    Detached,
}

// ============================================================================
// Session
// ============================================================================

/// One attached target.
///
/// Cloning shares the same session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    session_id: SessionId,
    target_id: TargetId,
    connection: Connection,
    detached: Arc<AtomicBool>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.inner.session_id)
            .field("target_id", &self.inner.target_id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Registers a freshly attached session with the connection.
    pub(crate) fn attached(connection: Connection, session_id: SessionId, target_id: TargetId) -> Self {
        let detached = connection.register_session(session_id.clone(), target_id.clone());
        debug!(%session_id, %target_id, "Session attached");

        Self {
            inner: Arc::new(SessionInner {
                session_id,
                target_id,
                connection,
                detached,
            }),
        }
    }

    /// Returns the session id.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.inner.session_id
    }

    /// Returns the target this session is attached to.
    #[inline]
    #[must_use]
    pub fn target_id(&self) -> &TargetId {
        &self.inner.target_id
    }

    /// Returns the underlying connection.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.inner.connection
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.inner.detached.load(Ordering::Acquire) {
            SessionState::Detached
        } else {
            SessionState::Attached
        }
    }

    /// Returns `true` while the session is attached.
    #[inline]
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.state() == SessionState::Attached
    }

    /// Marks the session detached locally and fails its pending requests.
    pub(crate) fn mark_detached(&self) {
        self.inner.connection.detach_session(&self.inner.session_id);
        self.inner.detached.store(true, Ordering::Release);
    }

    /// Sends a scoped command with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] without a round-trip if the session
    /// is detached; otherwise as [`Connection::send_command`].
    pub async fn send_command_with_timeout(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value> {
        self.ensure_attached()?;
        self.inner
            .connection
            .send_command_with_timeout(method, params, Some(self.inner.session_id.clone()), timeout)
            .await
    }

    /// Returns the events belonging to this session.
    #[must_use]
    pub fn events(&self) -> SessionEvents {
        SessionEvents {
            session_id: self.inner.session_id.clone(),
            rx: self.inner.connection.subscribe(),
        }
    }

    fn ensure_attached(&self) -> Result<()> {
        match self.state() {
            SessionState::Attached => Ok(()),
            SessionState::Detached => Err(Error::session_closed(self.inner.session_id.clone())),
        }
    }
}

#[async_trait]
impl CommandSender for Session {
    async fn send_command(&self, method: &str, params: Value) -> Result<Value> {
        self.ensure_attached()?;
        self.inner
            .connection
            .send_command(method, params, Some(self.inner.session_id.clone()))
            .await
    }
}

// ============================================================================
// SessionEvents
// ============================================================================

/// Event stream filtered to one session.
pub struct SessionEvents {
    session_id: SessionId,
    rx: broadcast::Receiver<Event>,
}

impl SessionEvents {
    /// Waits for the next event of this session.
    ///
    /// Events dropped because this subscriber lagged are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] once the connection is gone.
    pub async fn recv(&mut self) -> Result<Event> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.session_id.as_ref() == Some(&self.session_id) => return Ok(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(session_id = %self.session_id, skipped, "Session event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return Err(Error::ConnectionClosed),
            }
        }
    }

    /// Waits for an event with the given method.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if it does not arrive in time
    /// - [`Error::ConnectionClosed`] if the connection closes first
    pub async fn wait_for(&mut self, method: &str, timeout: Duration) -> Result<Event> {
        let deadline = Instant::now() + timeout;

        loop {
            let event = timeout_at(deadline, self.recv())
                .await
                .map_err(|_| Error::timeout(format!("waiting for {method}"), timeout.as_millis() as u64))??;

            if event.method == method {
                return Ok(event);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
