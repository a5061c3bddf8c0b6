//! Element actions by selector.
//!
//! Every method takes either a CSS selector or an `@eN` ref from the last
//! snapshot. Refs resolve locally first, so an unknown ref fails before any
//! round-trip.

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::{Command, InputCommand};
use crate::scripts::{self, ElementAction};
use crate::selector::SelectorResolver;

use super::Page;

// ============================================================================
// Page - Element Actions
// ============================================================================

impl Page {
    /// Clicks the element's centre with real mouse events.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSelector`], [`Error::SnapshotRequired`] or
    ///   [`Error::RefNotFound`] from resolution
    /// - [`Error::ElementNotFound`] if nothing on the page matches
    pub async fn click(&self, selector: &str) -> Result<()> {
        let (x, y) = self.element_center(selector).await?;
        debug!(selector, x, y, "Clicking");

        self.dispatch_mouse("mouseMoved", x, y, "none", 0).await?;
        self.dispatch_mouse("mousePressed", x, y, "left", 1).await?;
        self.dispatch_mouse("mouseReleased", x, y, "left", 1).await?;
        Ok(())
    }

    /// Moves the mouse over the element's centre.
    pub async fn hover(&self, selector: &str) -> Result<()> {
        let (x, y) = self.element_center(selector).await?;
        debug!(selector, x, y, "Hovering");

        self.dispatch_mouse("mouseMoved", x, y, "none", 0).await
    }

    /// Focuses the element.
    pub async fn focus(&self, selector: &str) -> Result<()> {
        self.run_action(selector, ElementAction::Focus).await?;
        Ok(())
    }

    /// Replaces the element's value and fires `input` and `change`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScriptError`] if the element takes no text.
    pub async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        debug!(selector, value_len = value.len(), "Filling");

        let result = self
            .run_action(
                selector,
                ElementAction::Fill {
                    value: value.to_string(),
                },
            )
            .await?;

        if result.get("filled").and_then(Value::as_bool) != Some(true) {
            return Err(Error::script_error(format!("{selector} does not accept text")));
        }
        Ok(())
    }

    /// Focuses the element and types text one key at a time.
    pub async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        self.focus(selector).await?;
        debug!(selector, chars = text.chars().count(), "Typing");

        for c in text.chars() {
            let key = c.to_string();
            self.dispatch_key("keyDown", &key, Some(&key)).await?;
            self.dispatch_key("keyUp", &key, None).await?;
        }
        Ok(())
    }

    /// Returns the element's rendered text.
    pub async fn text(&self, selector: &str) -> Result<String> {
        let result = self.run_action(selector, ElementAction::Text).await?;
        Ok(result
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    /// Returns `true` if the element is rendered with a non-empty box.
    pub async fn is_visible(&self, selector: &str) -> Result<bool> {
        let result = self.run_action(selector, ElementAction::IsVisible).await?;
        Ok(result.get("visible").and_then(Value::as_bool).unwrap_or(false))
    }

    /// Scrolls the element to the centre of the viewport.
    pub async fn scroll_into_view(&self, selector: &str) -> Result<()> {
        self.run_action(selector, ElementAction::ScrollIntoView).await?;
        Ok(())
    }

    /// Presses and releases a key on the focused element.
    ///
    /// `key` is a DOM key value: `"Enter"`, `"Tab"`, `"a"`, ...
    pub async fn press_key(&self, key: &str) -> Result<()> {
        debug!(key, "Pressing key");

        let text = key_text(key);
        self.dispatch_key("keyDown", key, text.as_deref()).await?;
        self.dispatch_key("keyUp", key, None).await
    }
}

// ============================================================================
// Page - Internal
// ============================================================================

impl Page {
    /// Resolves, locates and runs one action; `{found: false}` becomes
    /// [`Error::ElementNotFound`].
    async fn run_action(&self, selector: &str, action: ElementAction) -> Result<Value> {
        let target = SelectorResolver::new(&self.inner.store).resolve(selector)?;
        let script = scripts::element_action(&target, &action)?;
        let result = self.evaluate(&script).await?;

        if result.get("found").and_then(Value::as_bool) != Some(true) {
            debug!(selector, target = %target, "No element matched");
            return Err(Error::element_not_found(selector));
        }
        Ok(result)
    }

    async fn element_center(&self, selector: &str) -> Result<(f64, f64)> {
        let result = self.run_action(selector, ElementAction::Point).await?;

        let x = result.get("x").and_then(Value::as_f64);
        let y = result.get("y").and_then(Value::as_f64);
        match (x, y) {
            (Some(x), Some(y)) => Ok((x, y)),
            _ => Err(Error::protocol("element position missing from script result")),
        }
    }

    async fn dispatch_mouse(
        &self,
        event_type: &str,
        x: f64,
        y: f64,
        button: &str,
        click_count: u32,
    ) -> Result<()> {
        self.execute(Command::Input(InputCommand::DispatchMouseEvent {
            event_type: event_type.to_string(),
            x,
            y,
            button: button.to_string(),
            click_count,
        }))
        .await?;
        Ok(())
    }

    async fn dispatch_key(&self, event_type: &str, key: &str, text: Option<&str>) -> Result<()> {
        self.execute(Command::Input(InputCommand::DispatchKeyEvent {
            event_type: event_type.to_string(),
            key: key.to_string(),
            text: text.map(str::to_string),
        }))
        .await?;
        Ok(())
    }
}

/// Text a key produces when pressed, if any.
fn key_text(key: &str) -> Option<String> {
    match key {
        "Enter" => Some("\r".to_string()),
        "Tab" => Some("\t".to_string()),
        " " | "Space" => Some(" ".to_string()),
        k if k.chars().count() == 1 => Some(k.to_string()),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::{Value, json};

    use super::key_text;
    use crate::browser::page::testing::{evaluated, page};
    use crate::error::Error;
    use crate::snapshot::SnapshotProcessor;
    use crate::transport::testing::connected;

    type Log = Arc<Mutex<Vec<(String, Value)>>>;

    /// Serves every `Runtime.evaluate` with `reply` and records all commands.
    fn serve_actions(
        browser: crate::transport::testing::FakeBrowser,
        reply: Value,
    ) -> Log {
        let log: Log = Arc::default();
        browser.serve({
            let log = Arc::clone(&log);
            move |method, params, _| {
                log.lock().push((method.to_string(), params.clone()));
                match method {
                    "Runtime.evaluate" => Ok(evaluated(reply.clone())),
                    _ => Ok(json!({})),
                }
            }
        });
        log
    }

    fn methods(log: &Log) -> Vec<String> {
        log.lock().iter().map(|(m, _)| m.clone()).collect()
    }

    #[tokio::test]
    async fn test_click_dispatches_mouse_at_centre() {
        let (connection, browser) = connected().await;
        let log = serve_actions(browser, json!({"found": true, "x": 40.5, "y": 12.0}));
        let dir = tempfile::tempdir().expect("tempdir");

        page(connection, &dir).click("#submit").await.expect("click");

        assert_eq!(
            methods(&log),
            vec![
                "Runtime.evaluate",
                "Input.dispatchMouseEvent",
                "Input.dispatchMouseEvent",
                "Input.dispatchMouseEvent"
            ]
        );
        let log = log.lock();
        assert!(log[0].1["expression"].as_str().unwrap_or_default().contains(r##""selector":"#submit""##));
        assert_eq!(log[1].1["type"], "mouseMoved");
        assert_eq!(log[2].1["type"], "mousePressed");
        assert_eq!(log[2].1["x"], 40.5);
        assert_eq!(log[3].1["type"], "mouseReleased");
        assert_eq!(log[3].1["clickCount"], 1);
    }

    #[tokio::test]
    async fn test_ref_resolves_to_role_query() {
        let (connection, browser) = connected().await;
        let log = serve_actions(browser, json!({"found": true, "x": 1.0, "y": 2.0}));
        let dir = tempfile::tempdir().expect("tempdir");
        let page = page(connection, &dir);

        let document = SnapshotProcessor::default()
            .process("- button \"Save\"\n- button \"Save\"")
            .into_document();
        page.snapshot_store().save(&document).expect("save");

        page.hover("@e2").await.expect("hover");

        let log = log.lock();
        let expression = log[0].1["expression"].as_str().unwrap_or_default();
        assert!(expression.contains(r#"{"strategy":"role","role":"button","name":"Save","nth":1}"#));
        assert_eq!(log[1].1["type"], "mouseMoved");
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_ref_fails_without_round_trip() {
        let (connection, browser) = connected().await;
        let log = serve_actions(browser, json!({"found": true}));
        let dir = tempfile::tempdir().expect("tempdir");
        let page = page(connection, &dir);

        assert!(matches!(page.click("@e1").await, Err(Error::SnapshotRequired)));

        let document = SnapshotProcessor::default().process("- link \"Home\"").into_document();
        page.snapshot_store().save(&document).expect("save");
        assert!(matches!(page.focus("@e9").await, Err(Error::RefNotFound { .. })));
        assert!(matches!(page.text("").await, Err(Error::InvalidSelector { .. })));

        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_no_match_is_element_not_found() {
        let (connection, browser) = connected().await;
        serve_actions(browser, json!({"found": false}));
        let dir = tempfile::tempdir().expect("tempdir");

        let err = page(connection, &dir).text(".missing").await.unwrap_err();
        assert!(matches!(err, Error::ElementNotFound { ref selector } if selector == ".missing"));
        assert!(err.is_element_error());
    }

    #[tokio::test]
    async fn test_text_and_visibility() {
        let (connection, browser) = connected().await;
        serve_actions(browser, json!({"found": true, "text": "Hello", "visible": true}));
        let dir = tempfile::tempdir().expect("tempdir");
        let page = page(connection, &dir);

        assert_eq!(page.text("h1").await.expect("text"), "Hello");
        assert!(page.is_visible("h1").await.expect("visible"));
        page.scroll_into_view("h1").await.expect("scroll");
    }

    #[tokio::test]
    async fn test_fill() {
        let (connection, browser) = connected().await;
        let log = serve_actions(browser, json!({"found": true, "filled": true}));
        let dir = tempfile::tempdir().expect("tempdir");

        page(connection, &dir).fill("input[name=q]", "rust").await.expect("fill");

        let log = log.lock();
        let expression = log[0].1["expression"].as_str().unwrap_or_default();
        assert!(expression.contains(r#"{"kind":"fill","value":"rust"}"#));
    }

    #[tokio::test]
    async fn test_fill_rejected() {
        let (connection, browser) = connected().await;
        serve_actions(browser, json!({"found": true, "filled": false}));
        let dir = tempfile::tempdir().expect("tempdir");

        let err = page(connection, &dir).fill("div", "x").await.unwrap_err();
        assert!(matches!(err, Error::ScriptError { .. }));
    }

    #[tokio::test]
    async fn test_type_text_sends_key_pairs() {
        let (connection, browser) = connected().await;
        let log = serve_actions(browser, json!({"found": true, "focused": true}));
        let dir = tempfile::tempdir().expect("tempdir");

        page(connection, &dir).type_text("#q", "ab").await.expect("type");

        let log = log.lock();
        let keys: Vec<_> = log[1..]
            .iter()
            .map(|(_, p)| format!("{}:{}", p["type"].as_str().unwrap_or_default(), p["key"].as_str().unwrap_or_default()))
            .collect();
        assert_eq!(keys, vec!["keyDown:a", "keyUp:a", "keyDown:b", "keyUp:b"]);
        assert_eq!(log[1].1["text"], "a");
        assert!(log[2].1.get("text").is_none());
    }

    #[tokio::test]
    async fn test_press_key() {
        let (connection, browser) = connected().await;
        let log = serve_actions(browser, json!({}));
        let dir = tempfile::tempdir().expect("tempdir");

        page(connection, &dir).press_key("Enter").await.expect("press");

        let log = log.lock();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].1["key"], "Enter");
        assert_eq!(log[0].1["text"], "\r");
        assert_eq!(log[1].1["type"], "keyUp");
    }

    #[test]
    fn test_key_text() {
        assert_eq!(key_text("Enter").as_deref(), Some("\r"));
        assert_eq!(key_text("x").as_deref(), Some("x"));
        assert_eq!(key_text("ArrowLeft"), None);
    }
}
