//! JavaScript evaluation.

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::{Command, RuntimeCommand};

use super::Page;

// ============================================================================
// Page - Script Evaluation
// ============================================================================

impl Page {
    /// Evaluates an expression in the page's main world.
    ///
    /// Promises are awaited; the result is returned by value.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let links = page.evaluate("document.links.length").await?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScriptError`] if the expression throws.
    pub async fn evaluate(&self, expression: &str) -> Result<Value> {
        debug!(target_id = %self.target_id(), script_len = expression.len(), "Evaluating script");

        let result = self
            .execute(Command::Runtime(RuntimeCommand::Evaluate {
                expression: expression.to_string(),
                return_by_value: true,
                await_promise: true,
            }))
            .await?;

        if let Some(details) = result.get("exceptionDetails") {
            return Err(Error::script_error(exception_message(details)));
        }

        Ok(result
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }

    /// Evaluates an expression expected to produce a string.
    pub(crate) async fn evaluate_string(&self, expression: &str) -> Result<String> {
        let value = self.evaluate(expression).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}

/// Picks the most useful message out of `exceptionDetails`.
fn exception_message(details: &Value) -> String {
    details
        .get("exception")
        .and_then(|e| e.get("description"))
        .and_then(Value::as_str)
        .or_else(|| details.get("text").and_then(Value::as_str))
        .unwrap_or("Uncaught exception")
        .to_string()
}

// ============================================================================
// Tests
// ============================================================================
