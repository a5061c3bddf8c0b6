//! Error types for cdp-pilot.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use cdp_pilot::{Result, Error};
//!
//! async fn example(page: &Page) -> Result<()> {
//!     page.click("@e3").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidEndpoint`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`], [`Error::SessionClosed`] |
//! | Protocol | [`Error::Cdp`], [`Error::Protocol`] |
//! | Targets | [`Error::TargetNotFound`], [`Error::NoActivePage`] |
//! | Resolution | [`Error::RefNotFound`], [`Error::SnapshotRequired`], [`Error::InvalidSelector`] |
//! | Element | [`Error::ElementNotFound`] |
//! | Execution | [`Error::ScriptError`], [`Error::Navigation`], [`Error::Timeout`], [`Error::RequestTimeout`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Base64`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::{CommandId, SessionId, TargetId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Constants
// ============================================================================

/// CDP error code returned when a command names a session that no longer exists.
pub const CDP_SESSION_NOT_FOUND: i64 = -32001;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when driver or connection options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// DevTools endpoint rejected before any network activity.
    ///
    /// Returned for a non-`ws` scheme or a non-numeric host.
    #[error("Invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint {
        /// Endpoint as given by the caller.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    ///
    /// Returned when the TCP connect or the WebSocket handshake fails.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection timeout while opening the socket.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// WebSocket connection closed.
    ///
    /// Returned for every pending and future command once the connection
    /// has been torn down.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Session detached from its target.
    ///
    /// Returned for commands issued on a session after detach or target
    /// closure.
    #[error("Session closed: {session_id}")]
    SessionClosed {
        /// The detached session.
        session_id: SessionId,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Error object returned by the browser for a command.
    #[error("CDP error {code}: {message}")]
    Cdp {
        /// CDP error code (JSON-RPC style, e.g. `-32602`).
        code: i64,
        /// Error message from the browser.
        message: String,
        /// Optional extra detail.
        data: Option<String>,
    },

    /// Protocol violation or unexpected response shape.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // Target Errors
    // ========================================================================
    /// Target not found.
    #[error("Target not found: {target_id}")]
    TargetNotFound {
        /// The missing target ID.
        target_id: TargetId,
    },

    /// No page is currently selected in the registry.
    #[error("No active page")]
    NoActivePage,

    // ========================================================================
    // Resolution Errors
    // ========================================================================
    /// Snapshot reference not present in the stored snapshot.
    #[error("Ref not found: @{ref_id}")]
    RefNotFound {
        /// The unknown ref id (without `@`).
        ref_id: String,
    },

    /// A ref selector was used but no snapshot has been taken yet.
    #[error("Snapshot required: take a snapshot before using @refs")]
    SnapshotRequired,

    /// Selector string rejected locally.
    #[error("Invalid selector {selector:?}: {reason}")]
    InvalidSelector {
        /// The selector as given.
        selector: String,
        /// Why it was rejected.
        reason: String,
    },

    // ========================================================================
    // Element Errors
    // ========================================================================
    /// No live element matched the selector.
    #[error("Element not found: {selector}")]
    ElementNotFound {
        /// Selector (or role description) used.
        selector: String,
    },

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// JavaScript execution error.
    ///
    /// Returned when `Runtime.evaluate` reports `exceptionDetails`.
    #[error("Script error: {message}")]
    ScriptError {
        /// Exception text from the page.
        message: String,
    },

    /// Navigation failed.
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// Requested URL.
        url: String,
        /// `errorText` reported by the browser.
        message: String,
    },

    /// Operation timeout.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Command request timeout.
    ///
    /// The browser may still answer later; that answer is dropped.
    #[error("Command {request_id} ({method}) timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The command ID that timed out.
        request_id: CommandId,
        /// The CDP method.
        method: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Base64 decoding error.
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid endpoint error.
    #[inline]
    pub fn invalid_endpoint(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a session closed error.
    #[inline]
    pub fn session_closed(session_id: SessionId) -> Self {
        Self::SessionClosed { session_id }
    }

    /// Creates a CDP error from a response error object.
    #[inline]
    pub fn cdp(code: i64, message: impl Into<String>, data: Option<String>) -> Self {
        Self::Cdp {
            code,
            message: message.into(),
            data,
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a target not found error.
    #[inline]
    pub fn target_not_found(target_id: TargetId) -> Self {
        Self::TargetNotFound { target_id }
    }

    /// Creates a ref not found error.
    #[inline]
    pub fn ref_not_found(ref_id: impl Into<String>) -> Self {
        Self::RefNotFound {
            ref_id: ref_id.into(),
        }
    }

    /// Creates an invalid selector error.
    #[inline]
    pub fn invalid_selector(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            reason: reason.into(),
        }
    }

    /// Creates an element not found error.
    #[inline]
    pub fn element_not_found(selector: impl Into<String>) -> Self {
        Self::ElementNotFound {
            selector: selector.into(),
        }
    }

    /// Creates a script error.
    #[inline]
    pub fn script_error(message: impl Into<String>) -> Self {
        Self::ScriptError {
            message: message.into(),
        }
    }

    /// Creates a navigation error.
    #[inline]
    pub fn navigation(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Navigation {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(
        request_id: CommandId,
        method: impl Into<String>,
        timeout_ms: u64,
    ) -> Self {
        Self::RequestTimeout {
            request_id,
            method: method.into(),
            timeout_ms,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::Timeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this is an element error.
    #[inline]
    #[must_use]
    pub fn is_element_error(&self) -> bool {
        matches!(self, Self::ElementNotFound { .. })
    }

    /// Returns `true` if this error was raised while resolving a selector
    /// locally, before any round-trip.
    #[inline]
    #[must_use]
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::RefNotFound { .. } | Self::SnapshotRequired | Self::InvalidSelector { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::SessionClosed { .. }
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry by a higher layer.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. }
                | Self::Timeout { .. }
                | Self::RequestTimeout { .. }
                | Self::ElementNotFound { .. }
        )
    }

    /// Returns the CDP error code, if this is a browser-reported error.
    #[inline]
    #[must_use]
    pub fn cdp_code(&self) -> Option<i64> {
        match self {
            Self::Cdp { code, .. } => Some(*code),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
