//! WebSocket transport layer.
//!
//! This module handles communication between the local end (Rust) and the
//! browser's DevTools endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Page / Session │                              │  Browser        │
//! │                 │         WebSocket            │                 │
//! │  Connection     │◄────────────────────────────►│  DevTools       │
//! │  (event loop)   │   ws://<ip>:<port>/devtools  │  endpoint       │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Endpoint::parse` - Validate scheme and numeric host
//! 2. `Connection::open` - TCP connect and WebSocket handshake
//! 3. `Connection::send_command` - Commands, responses and events
//! 4. `Connection::close` - Fail pending requests and close the socket
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and event loop |
//! | `endpoint` | DevTools endpoint parsing |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// DevTools endpoint parsing.
pub mod endpoint;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::Connection;
pub use endpoint::Endpoint;
