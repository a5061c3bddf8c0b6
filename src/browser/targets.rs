//! Target discovery and attachment.
//!
//! Thin typed layer over the `Target` domain. Every call is browser-level
//! (no session id); attaching yields a [`Session`].

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::{SessionId, TargetId};
use crate::protocol::{Command, TargetCommand};
use crate::session::{CommandSender, Session};
use crate::transport::Connection;

/// CDP "invalid params", returned for unknown target ids.
const CDP_INVALID_PARAMS: i64 = -32602;

// ============================================================================
// TargetInfo
// ============================================================================

/// One entry of `Target.getTargets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    /// Target id.
    pub target_id: TargetId,

    /// `page`, `iframe`, `worker`, `service_worker`, ...
    #[serde(rename = "type")]
    pub target_type: String,

    /// Page title.
    #[serde(default)]
    pub title: String,

    /// Current URL.
    #[serde(default)]
    pub url: String,

    /// Whether some client is attached.
    #[serde(default)]
    pub attached: bool,
}

impl TargetInfo {
    /// Returns `true` for top-level pages (tabs).
    #[inline]
    #[must_use]
    pub fn is_page(&self) -> bool {
        self.target_type == "page"
    }
}

// ============================================================================
// TargetRegistry
// ============================================================================

/// Discover, create, attach, detach, activate and close targets.
#[derive(Clone)]
pub struct TargetRegistry {
    connection: Connection,
}

impl TargetRegistry {
    /// Creates a registry over a connection.
    #[inline]
    #[must_use]
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Lists all targets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the response has no `targetInfos`.
    pub async fn list(&self) -> Result<Vec<TargetInfo>> {
        let result = self
            .connection
            .execute(Command::Target(TargetCommand::GetTargets))
            .await?;

        let infos = result
            .get("targetInfos")
            .cloned()
            .ok_or_else(|| Error::protocol("Target.getTargets returned no targetInfos"))?;

        Ok(serde_json::from_value(infos)?)
    }

    /// Lists page targets, in the browser's order.
    ///
    /// # Errors
    ///
    /// Same as [`list`](Self::list).
    pub async fn pages(&self) -> Result<Vec<TargetInfo>> {
        let mut targets = self.list().await?;
        targets.retain(TargetInfo::is_page);
        Ok(targets)
    }

    /// Looks up one target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TargetNotFound`] if no such target exists.
    pub async fn get(&self, target_id: &TargetId) -> Result<TargetInfo> {
        self.list()
            .await?
            .into_iter()
            .find(|t| &t.target_id == target_id)
            .ok_or_else(|| Error::target_not_found(target_id.clone()))
    }

    /// Opens a new page target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the response has no `targetId`.
    pub async fn create(&self, url: &str) -> Result<TargetId> {
        let result = self
            .connection
            .execute(Command::Target(TargetCommand::CreateTarget {
                url: url.to_string(),
            }))
            .await?;

        let target_id = str_field(&result, "targetId")
            .map(TargetId::new)
            .ok_or_else(|| Error::protocol("Target.createTarget returned no targetId"))?;

        debug!(%target_id, url, "Target created");
        Ok(target_id)
    }

    /// Attaches to a target in flat mode.
    ///
    /// Each attach yields a new session, even for the same target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TargetNotFound`] if the browser rejects the id.
    pub async fn attach(&self, target_id: &TargetId) -> Result<Session> {
        let result = self
            .connection
            .execute(Command::Target(TargetCommand::AttachToTarget {
                target_id: target_id.clone(),
                flatten: true,
            }))
            .await
            .map_err(|e| match e.cdp_code() {
                Some(CDP_INVALID_PARAMS) => Error::target_not_found(target_id.clone()),
                _ => e,
            })?;

        let session_id = str_field(&result, "sessionId")
            .map(SessionId::new)
            .ok_or_else(|| Error::protocol("Target.attachToTarget returned no sessionId"))?;

        Ok(Session::attached(
            self.connection.clone(),
            session_id,
            target_id.clone(),
        ))
    }

    /// Detaches a session. Detaching twice is a no-op.
    ///
    /// The session is Detached afterwards even if the browser call fails.
    ///
    /// # Errors
    ///
    /// Returns the browser's error, if any.
    pub async fn detach(&self, session: &Session) -> Result<()> {
        if !session.is_attached() {
            return Ok(());
        }

        let result = self
            .connection
            .execute(Command::Target(TargetCommand::DetachFromTarget {
                session_id: session.session_id().clone(),
            }))
            .await;

        session.mark_detached();
        result.map(|_| ())
    }

    /// Brings a target to the foreground.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TargetNotFound`] if the browser rejects the id.
    pub async fn activate(&self, target_id: &TargetId) -> Result<()> {
        self.connection
            .execute(Command::Target(TargetCommand::ActivateTarget {
                target_id: target_id.clone(),
            }))
            .await
            .map_err(|e| match e.cdp_code() {
                Some(CDP_INVALID_PARAMS) => Error::target_not_found(target_id.clone()),
                _ => e,
            })?;
        Ok(())
    }

    /// Closes a target; its sessions become Detached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TargetNotFound`] if the browser rejects the id or
    /// reports `success: false`.
    pub async fn close(&self, target_id: &TargetId) -> Result<()> {
        let result = self
            .connection
            .execute(Command::Target(TargetCommand::CloseTarget {
                target_id: target_id.clone(),
            }))
            .await
            .map_err(|e| match e.cdp_code() {
                Some(CDP_INVALID_PARAMS) => Error::target_not_found(target_id.clone()),
                _ => e,
            })?;

        if result.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(Error::target_not_found(target_id.clone()));
        }

        self.connection.detach_target(target_id);
        debug!(%target_id, "Target closed");
        Ok(())
    }

    /// Toggles `Target.targetCreated` / `targetDestroyed` events.
    ///
    /// # Errors
    ///
    /// Returns the browser's error, if any.
    pub async fn set_discover_targets(&self, discover: bool) -> Result<()> {
        self.connection
            .execute(Command::Target(TargetCommand::SetDiscoverTargets { discover }))
            .await?;
        Ok(())
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;
    use crate::transport::testing::connected;
    use serde_json::json;

    fn targets_json() -> Value {
        json!({"targetInfos": [
            {"targetId": "P1", "type": "page", "title": "One", "url": "https://one.test/", "attached": false},
            {"targetId": "W1", "type": "service_worker", "title": "", "url": "https://one.test/sw.js", "attached": false},
            {"targetId": "P2", "type": "page", "title": "Two", "url": "about:blank", "attached": true}
        ]})
    }

    #[tokio::test]
    async fn test_list_and_pages() {
        let (connection, browser) = connected().await;
        browser.serve(|method, _, _| match method {
            "Target.getTargets" => Ok(targets_json()),
            _ => Err((-32601, "not found".into())),
        });
        let registry = TargetRegistry::new(connection);

        assert_eq!(registry.list().await.expect("list").len(), 3);

        let pages = registry.pages().await.expect("pages");
        let ids: Vec<_> = pages.iter().map(|p| p.target_id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P2"]);
        assert!(pages[1].attached);

        assert_eq!(registry.get(&TargetId::new("P2")).await.expect("get").title, "Two");
        assert!(matches!(
            registry.get(&TargetId::new("nope")).await,
            Err(Error::TargetNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_and_attach() {
        let (connection, browser) = connected().await;
        let mut attaches = 0;
        browser.serve(move |method, params, session| {
            assert!(session.is_none());
            match method {
                "Target.createTarget" => {
                    assert_eq!(params["url"], "about:blank");
                    Ok(json!({"targetId": "T1"}))
                }
                "Target.attachToTarget" => {
                    assert_eq!(params["flatten"], true);
                    attaches += 1;
                    Ok(json!({"sessionId": format!("S{attaches}")}))
                }
                _ => Err((-32601, "not found".into())),
            }
        });
        let registry = TargetRegistry::new(connection);

        let target_id = registry.create("about:blank").await.expect("create");
        assert_eq!(target_id.as_str(), "T1");

        let first = registry.attach(&target_id).await.expect("attach");
        let second = registry.attach(&target_id).await.expect("attach again");
        assert_eq!(first.target_id(), &target_id);
        assert_ne!(first.session_id(), second.session_id());
        assert_eq!(first.state(), SessionState::Attached);
    }

    #[tokio::test]
    async fn test_detach_arriving_before_attach_response() {
        let (connection, mut browser) = connected().await;
        let registry = TargetRegistry::new(connection.clone());

        let attach = tokio::spawn(async move { registry.attach(&TargetId::new("T1")).await });

        let command = browser.recv_command().await;
        assert_eq!(command["method"], "Target.attachToTarget");
        browser
            .send_json(json!({
                "method": "Target.detachedFromTarget",
                "params": {"sessionId": "S1", "targetId": "T1"}
            }))
            .await;
        browser
            .respond(command["id"].as_u64().expect("id"), json!({"sessionId": "S1"}))
            .await;

        let session = attach.await.expect("join").expect("attach");
        assert_eq!(session.state(), SessionState::Detached);
        assert!(matches!(
            session.send_command("Runtime.evaluate", json!({})).await,
            Err(Error::SessionClosed { .. })
        ));
        assert_eq!(connection.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_attach_unknown_target() {
        let (connection, browser) = connected().await;
        browser.serve(|_, _, _| Err((-32602, "No target with given id found".into())));

        let err = TargetRegistry::new(connection)
            .attach(&TargetId::new("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TargetNotFound { target_id } if target_id.as_str() == "missing"));
    }

    #[tokio::test]
    async fn test_detach_and_close() {
        let (connection, browser) = connected().await;
        browser.serve(|method, params, _| match method {
            "Target.attachToTarget" => Ok(json!({"sessionId": format!("S-{}", params["targetId"].as_str().unwrap_or_default())})),
            "Target.detachFromTarget" | "Target.activateTarget" => Ok(json!({})),
            "Target.closeTarget" => Ok(json!({"success": true})),
            _ => Err((-32601, "not found".into())),
        });
        let registry = TargetRegistry::new(connection);

        let a = registry.attach(&TargetId::new("A")).await.expect("attach");
        registry.detach(&a).await.expect("detach");
        assert_eq!(a.state(), SessionState::Detached);
        registry.detach(&a).await.expect("second detach is a no-op");

        let b = registry.attach(&TargetId::new("B")).await.expect("attach");
        registry.activate(&TargetId::new("B")).await.expect("activate");
        registry.close(&TargetId::new("B")).await.expect("close");
        assert_eq!(b.state(), SessionState::Detached);
        assert!(matches!(
            b.send_command("Runtime.evaluate", json!({})).await,
            Err(Error::SessionClosed { .. })
        ));
    }
}
