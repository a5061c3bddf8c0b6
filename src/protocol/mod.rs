//! CDP wire message types.
//!
//! This module defines the message format exchanged with the browser's
//! DevTools WebSocket endpoint.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `CommandEnvelope` | Local → Browser | Command request, carries `id` |
//! | `ResponseEnvelope` | Browser → Local | `result` or `error` for one `id` |
//! | `Event` | Browser → Local | Notification, no `id` |
//!
//! # Command Naming
//!
//! Commands follow `Domain.method` format:
//!
//! - `Target.attachToTarget`
//! - `Runtime.evaluate`
//! - `Input.dispatchMouseEvent`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Typed commands by domain |
//! | `envelope` | Encode/decode of wire envelopes |
//! | `event` | Event and ParsedEvent types |

// ============================================================================
// Submodules
// ============================================================================

/// Typed commands organized by domain.
pub mod command;

/// Wire envelopes and the incoming-frame decoder.
pub mod envelope;

/// Event message types.
pub mod event;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Command, InputCommand, PageCommand, RuntimeCommand, TargetCommand};
pub use envelope::{CommandEnvelope, Incoming, ResponseEnvelope, ResponseError, decode};
pub use event::{Event, ParsedEvent};
