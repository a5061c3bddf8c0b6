//! Typed commands for the CDP methods the core issues itself.
//!
//! Commands follow `Domain.method` format. Only the methods needed by
//! target management, script evaluation, navigation and input are typed
//! here; anything else goes through [`CommandSender::send_command`] with a
//! raw method name.
//!
//! [`CommandSender::send_command`]: crate::session::CommandSender::send_command
//!
//! # Domains
//!
//! | Domain | Commands |
//! |--------|----------|
//! | `Target` | Discovery, attach/detach, create/close |
//! | `Runtime` | Script evaluation |
//! | `Page` | Navigation, screenshots |
//! | `Input` | Mouse, keyboard, text insertion |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::identifiers::{SessionId, TargetId};

// ============================================================================
// Command Wrapper
// ============================================================================

/// All typed commands organized by domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Command {
    /// Target domain commands.
    Target(TargetCommand),
    /// Runtime domain commands.
    Runtime(RuntimeCommand),
    /// Page domain commands.
    Page(PageCommand),
    /// Input domain commands.
    Input(InputCommand),
}

impl Command {
    /// Splits the command into its method name and params object.
    ///
    /// Unit variants serialize without `params`; those get `{}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails, or [`Error::Protocol`]
    /// if the serialized form has no method.
    pub fn to_parts(&self) -> Result<(String, Value)> {
        let mut value = serde_json::to_value(self)?;

        let method = value
            .get("method")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::protocol("command serialized without method"))?;

        let params = value
            .get_mut("params")
            .map(Value::take)
            .unwrap_or_else(|| Value::Object(Map::new()));

        Ok((method, params))
    }
}

// ============================================================================
// Target Commands
// ============================================================================

/// Target domain commands for discovery and session management.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum TargetCommand {
    /// List all targets.
    #[serde(rename = "Target.getTargets")]
    GetTargets,

    /// Create a new page target.
    #[serde(rename = "Target.createTarget")]
    CreateTarget {
        /// Initial URL.
        url: String,
    },

    /// Attach to a target and obtain a session id.
    #[serde(rename = "Target.attachToTarget")]
    AttachToTarget {
        /// Target to attach to.
        #[serde(rename = "targetId")]
        target_id: TargetId,
        /// Use flat session mode (sessionId on each message).
        flatten: bool,
    },

    /// Detach a session.
    #[serde(rename = "Target.detachFromTarget")]
    DetachFromTarget {
        /// Session to detach.
        #[serde(rename = "sessionId")]
        session_id: SessionId,
    },

    /// Bring a target to the foreground.
    #[serde(rename = "Target.activateTarget")]
    ActivateTarget {
        /// Target to activate.
        #[serde(rename = "targetId")]
        target_id: TargetId,
    },

    /// Close a target.
    #[serde(rename = "Target.closeTarget")]
    CloseTarget {
        /// Target to close.
        #[serde(rename = "targetId")]
        target_id: TargetId,
    },

    /// Toggle `Target.targetCreated` / `targetDestroyed` notifications.
    #[serde(rename = "Target.setDiscoverTargets")]
    SetDiscoverTargets {
        /// Whether to emit discovery events.
        discover: bool,
    },
}

// ============================================================================
// Runtime Commands
// ============================================================================

/// Runtime domain commands for JavaScript evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum RuntimeCommand {
    /// Enable runtime notifications.
    #[serde(rename = "Runtime.enable")]
    Enable,

    /// Evaluate an expression in the page's main world.
    #[serde(rename = "Runtime.evaluate")]
    Evaluate {
        /// JavaScript expression.
        expression: String,
        /// Return the value as JSON instead of a remote object.
        #[serde(rename = "returnByValue")]
        return_by_value: bool,
        /// Await a returned promise.
        #[serde(rename = "awaitPromise")]
        await_promise: bool,
    },
}

// ============================================================================
// Page Commands
// ============================================================================

/// Page domain commands for navigation and capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum PageCommand {
    /// Enable page lifecycle notifications.
    #[serde(rename = "Page.enable")]
    Enable,

    /// Navigate to URL.
    #[serde(rename = "Page.navigate")]
    Navigate {
        /// URL to navigate to.
        url: String,
    },

    /// Reload current page.
    #[serde(rename = "Page.reload")]
    Reload {
        /// Bypass the cache.
        #[serde(rename = "ignoreCache")]
        ignore_cache: bool,
    },

    /// Capture a screenshot of the viewport.
    #[serde(rename = "Page.captureScreenshot")]
    CaptureScreenshot {
        /// Image format (`png`, `jpeg`, `webp`).
        format: String,
    },

    /// Bring the page to front.
    #[serde(rename = "Page.bringToFront")]
    BringToFront,
}

// ============================================================================
// Input Commands
// ============================================================================

/// Input domain commands for synthesized user input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum InputCommand {
    /// Dispatch a mouse event at viewport coordinates.
    #[serde(rename = "Input.dispatchMouseEvent")]
    DispatchMouseEvent {
        /// `mousePressed`, `mouseReleased` or `mouseMoved`.
        #[serde(rename = "type")]
        event_type: String,
        /// X coordinate in CSS pixels.
        x: f64,
        /// Y coordinate in CSS pixels.
        y: f64,
        /// Mouse button (`none`, `left`, `middle`, `right`).
        button: String,
        /// Click count.
        #[serde(rename = "clickCount")]
        click_count: u32,
    },

    /// Dispatch a key event.
    #[serde(rename = "Input.dispatchKeyEvent")]
    DispatchKeyEvent {
        /// `keyDown`, `keyUp` or `char`.
        #[serde(rename = "type")]
        event_type: String,
        /// DOM `key` value.
        key: String,
        /// Text generated by the key, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },

    /// Insert text as if typed by an IME.
    #[serde(rename = "Input.insertText")]
    InsertText {
        /// Text to insert.
        text: String,
    },
}

// ============================================================================
// Tests
// ============================================================================
