//! Event message types.
//!
//! Events are notifications the browser sends without an `id`. They may
//! interleave with responses at any point; per-session order follows the
//! wire order.
//!
//! # Parsed Events
//!
//! | Domain | Events |
//! |--------|--------|
//! | `Target` | `attachedToTarget`, `detachedFromTarget`, `targetCreated`, `targetDestroyed`, `targetCrashed` |
//! | `Page` | `loadEventFired`, `domContentEventFired`, `frameNavigated` |
//! | `Runtime` | `exceptionThrown`, `consoleAPICalled` |
//! | `Inspector` | `detached` |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::{SessionId, TargetId};

// ============================================================================
// Event
// ============================================================================

/// An event notification from the browser.
///
/// # Format
///
/// ```json
/// {
///   "method": "Domain.eventName",
///   "params": { ... },
///   "sessionId": "..."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event name in `Domain.eventName` format.
    pub method: String,

    /// Event-specific data.
    #[serde(default)]
    pub params: Value,

    /// Session the event belongs to; `None` for browser-level events.
    #[serde(rename = "sessionId", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

impl Event {
    /// Returns the domain name from the method.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let event = Event { method: "Page.loadEventFired".into(), .. };
    /// assert_eq!(event.domain(), "Page");
    /// ```
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }

    /// Returns the event name from the method.
    #[inline]
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.method.split('.').nth(1).unwrap_or_default()
    }

    /// Parses the event into a typed variant.
    #[must_use]
    pub fn parse(&self) -> ParsedEvent {
        self.parse_internal()
    }
}

// ============================================================================
// ParsedEvent
// ============================================================================

/// Parsed event types for type-safe handling.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEvent {
    /// A session was attached (auto-attach or explicit attach).
    TargetAttached {
        /// New session.
        session_id: SessionId,
        /// Target the session belongs to.
        target_id: TargetId,
    },

    /// A session was detached.
    TargetDetached {
        /// Detached session.
        session_id: SessionId,
    },

    /// A target was created.
    TargetCreated {
        /// New target.
        target_id: TargetId,
        /// Target type (`page`, `service_worker`, ...).
        target_type: String,
        /// Initial URL.
        url: String,
    },

    /// A target was destroyed.
    TargetDestroyed {
        /// Destroyed target.
        target_id: TargetId,
    },

    /// A target's renderer crashed.
    TargetCrashed {
        /// Crashed target.
        target_id: TargetId,
        /// Termination status.
        status: String,
    },

    /// Page load event fired.
    PageLoad {
        /// Monotonic timestamp in seconds.
        timestamp: f64,
    },

    /// DOMContentLoaded fired.
    PageDomContentLoaded {
        /// Monotonic timestamp in seconds.
        timestamp: f64,
    },

    /// A frame committed a navigation.
    FrameNavigated {
        /// Frame ID.
        frame_id: String,
        /// New URL.
        url: String,
    },

    /// Uncaught exception in the page.
    RuntimeException {
        /// Exception description.
        text: String,
    },

    /// `console.*` call in the page.
    ConsoleApiCalled {
        /// Console method (`log`, `error`, ...).
        level: String,
        /// Stringified arguments.
        args: Vec<String>,
    },

    /// The browser side dropped the debugging client.
    InspectorDetached {
        /// Reason string.
        reason: String,
    },

    /// Unknown or unparsed event.
    Unknown {
        /// Event method.
        method: String,
        /// Event params.
        params: Value,
    },
}

// ============================================================================
// Event - Parsing
// ============================================================================

impl Event {
    /// Internal parsing implementation.
    fn parse_internal(&self) -> ParsedEvent {
        match self.method.as_str() {
            "Target.attachedToTarget" => ParsedEvent::TargetAttached {
                session_id: SessionId::new(self.get_str("sessionId")),
                target_id: TargetId::new(self.target_info_str("targetId")),
            },

            "Target.detachedFromTarget" => ParsedEvent::TargetDetached {
                session_id: SessionId::new(self.get_str("sessionId")),
            },

            "Target.targetCreated" => ParsedEvent::TargetCreated {
                target_id: TargetId::new(self.target_info_str("targetId")),
                target_type: self.target_info_str("type"),
                url: self.target_info_str("url"),
            },

            "Target.targetDestroyed" => ParsedEvent::TargetDestroyed {
                target_id: TargetId::new(self.get_str("targetId")),
            },

            "Target.targetCrashed" => ParsedEvent::TargetCrashed {
                target_id: TargetId::new(self.get_str("targetId")),
                status: self.get_str("status"),
            },

            "Page.loadEventFired" => ParsedEvent::PageLoad {
                timestamp: self.get_f64("timestamp"),
            },

            "Page.domContentEventFired" => ParsedEvent::PageDomContentLoaded {
                timestamp: self.get_f64("timestamp"),
            },

            "Page.frameNavigated" => {
                let frame = self.params.get("frame");
                let field = |key: &str| {
                    frame
                        .and_then(|f| f.get(key))
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string()
                };
                ParsedEvent::FrameNavigated {
                    frame_id: field("id"),
                    url: field("url"),
                }
            }

            "Runtime.exceptionThrown" => {
                let details = self.params.get("exceptionDetails");
                let text = details
                    .and_then(|d| d.get("exception"))
                    .and_then(|e| e.get("description"))
                    .and_then(Value::as_str)
                    .or_else(|| details.and_then(|d| d.get("text")).and_then(Value::as_str))
                    .unwrap_or_default()
                    .to_string();
                ParsedEvent::RuntimeException { text }
            }

            "Runtime.consoleAPICalled" => {
                let args = self
                    .params
                    .get("args")
                    .and_then(Value::as_array)
                    .map(|arr| arr.iter().map(remote_object_to_string).collect())
                    .unwrap_or_default();
                ParsedEvent::ConsoleApiCalled {
                    level: self.get_str("type"),
                    args,
                }
            }

            "Inspector.detached" => ParsedEvent::InspectorDetached {
                reason: self.get_str("reason"),
            },

            _ => ParsedEvent::Unknown {
                method: self.method.clone(),
                params: self.params.clone(),
            },
        }
    }

    /// Gets a string param, empty if missing.
    fn get_str(&self, key: &str) -> String {
        self.params
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Gets a numeric param, 0.0 if missing.
    fn get_f64(&self, key: &str) -> f64 {
        self.params
            .get(key)
            .and_then(Value::as_f64)
            .unwrap_or_default()
    }

    /// Gets a string field from `params.targetInfo`.
    fn target_info_str(&self, key: &str) -> String {
        self.params
            .get("targetInfo")
            .and_then(|info| info.get(key))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

/// Renders a `Runtime.RemoteObject` the way the console would.
fn remote_object_to_string(object: &Value) -> String {
    match object.get("value") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => object
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("undefined")
            .to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
