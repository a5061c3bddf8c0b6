//! Command, response and event envelopes.
//!
//! Stateless encode/decode of the three CDP message shapes:
//!
//! ```text
//! Command  → {"id":1, "method":"Domain.command", "params":{...}, "sessionId":"..."?}
//! Response → {"id":1, "result":{...}} | {"id":1, "error":{"code":-32602,"message":"..."}}
//! Event    → {"method":"Domain.event", "params":{...}, "sessionId":"..."?}
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::identifiers::{CommandId, SessionId};

use super::{Command, Event};

// ============================================================================
// CommandEnvelope
// ============================================================================

/// A command from local end to browser.
///
/// # Format
///
/// ```json
/// {
///   "id": 7,
///   "method": "Runtime.evaluate",
///   "params": { "expression": "1 + 1" },
///   "sessionId": "5E3F..."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandEnvelope {
    /// Identifier for response correlation.
    pub id: CommandId,

    /// Method in `Domain.command` format.
    pub method: String,

    /// Command parameters (always an object on the wire).
    pub params: Value,

    /// Session scope, absent for browser-level commands.
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

impl CommandEnvelope {
    /// Creates a browser-level command envelope.
    ///
    /// `Null` params are sent as `{}`.
    #[must_use]
    pub fn new(id: CommandId, method: impl Into<String>, params: Value) -> Self {
        let params = match params {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };

        Self {
            id,
            method: method.into(),
            params,
            session_id: None,
        }
    }

    /// Scopes the command to a session.
    #[inline]
    #[must_use]
    pub fn with_session(mut self, session_id: Option<SessionId>) -> Self {
        self.session_id = session_id;
        self
    }

    /// Builds an envelope from a typed command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the command cannot be serialized.
    pub fn from_command(id: CommandId, command: &Command) -> Result<Self> {
        let (method, params) = command.to_parts()?;
        Ok(Self::new(id, method, params))
    }

    /// Serializes the envelope to its wire text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// ResponseEnvelope
// ============================================================================

/// Error object carried by a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    /// JSON-RPC style error code.
    pub code: i64,

    /// Human readable message.
    pub message: String,

    /// Extra detail; Chrome sends either a string or an object here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A response from browser to local end.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseEnvelope {
    /// Matches the command `id`.
    pub id: CommandId,

    /// Result data (if success).
    #[serde(default)]
    pub result: Option<Value>,

    /// Error object (if failure).
    #[serde(default)]
    pub error: Option<ResponseError>,

    /// Session the command was scoped to, echoed back by the browser.
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<SessionId>,
}

impl ResponseEnvelope {
    /// Returns `true` if this is an error response.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Returns why the envelope is unusable, if it is.
    ///
    /// A response must carry exactly one of `result` and `error`.
    #[must_use]
    pub fn shape_error(&self) -> Option<&'static str> {
        match (&self.result, &self.error) {
            (Some(_), Some(_)) => Some("response carries both result and error"),
            (None, None) => Some("response carries neither result nor error"),
            _ => None,
        }
    }

    /// Extracts the result value.
    ///
    /// # Errors
    ///
    /// - [`Error::Cdp`] if the response carries an error object
    /// - [`Error::Protocol`] if it carries both or neither of `result` and `error`
    pub fn into_result(self) -> Result<Value> {
        if let Some(reason) = self.shape_error() {
            return Err(Error::protocol(format!("{reason} (id {})", self.id)));
        }

        match (self.result, self.error) {
            (_, Some(error)) => {
                let data = error.data.map(|d| match d {
                    Value::String(s) => s,
                    other => other.to_string(),
                });
                Err(Error::cdp(error.code, error.message, data))
            }
            (result, None) => Ok(result.unwrap_or(Value::Null)),
        }
    }
}

// ============================================================================
// Incoming
// ============================================================================

/// A decoded message from the browser.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// Reply to a command, carries an `id`.
    Response(ResponseEnvelope),
    /// Unsolicited notification, carries a `method` and no `id`.
    Event(Event),
    /// Carries an `id` but not exactly one of `result` and `error`.
    ///
    /// The id is kept so the waiting caller can be failed.
    Malformed { id: CommandId, reason: &'static str },
}

/// Decodes one incoming frame.
///
/// Anything with an `id` is a response; otherwise a string `method` makes it
/// an event.
///
/// # Errors
///
/// - [`Error::Json`] if the text is not JSON or a field has the wrong type
/// - [`Error::Protocol`] if the envelope has neither `id` nor `method`
pub fn decode(text: &str) -> Result<Incoming> {
    let value: Value = serde_json::from_str(text)?;

    if value.get("id").is_some() {
        let response: ResponseEnvelope = serde_json::from_value(value)?;
        if let Some(reason) = response.shape_error() {
            return Ok(Incoming::Malformed {
                id: response.id,
                reason,
            });
        }
        return Ok(Incoming::Response(response));
    }

    if value.get("method").is_some_and(Value::is_string) {
        let event: Event = serde_json::from_value(value)?;
        return Ok(Incoming::Event(event));
    }

    Err(Error::protocol("envelope has neither id nor method"))
}

// ============================================================================
// Tests
// ============================================================================
