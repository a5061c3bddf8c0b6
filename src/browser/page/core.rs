//! Core Page struct and accessors.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::browser::TargetRegistry;
use crate::error::Result;
use crate::identifiers::{SessionId, TargetId};
use crate::protocol::{Command, PageCommand};
use crate::session::{CommandSender, Session};
use crate::snapshot::SnapshotStore;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a page.
pub(crate) struct PageInner {
    /// Session scoped to this page's target.
    pub session: Session,
    /// Where snapshots are saved and `@ref`s resolved.
    pub store: SnapshotStore,
}

// ============================================================================
// Page
// ============================================================================

/// A handle to an attached page.
///
/// Pages provide methods for navigation, scripting, snapshots and element
/// interaction. Cloning shares the same session.
#[derive(Clone)]
pub struct Page {
    pub(crate) inner: Arc<PageInner>,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("target_id", self.target_id())
            .field("session_id", self.session_id())
            .field("store", &self.inner.store.path())
            .finish_non_exhaustive()
    }
}

impl Page {
    /// Creates a page handle.
    pub(crate) fn new(session: Session, store: SnapshotStore) -> Self {
        Self {
            inner: Arc::new(PageInner { session, store }),
        }
    }
}

// ============================================================================
// Page - Accessors
// ============================================================================

impl Page {
    /// Returns the target id.
    #[inline]
    #[must_use]
    pub fn target_id(&self) -> &TargetId {
        self.inner.session.target_id()
    }

    /// Returns the session id.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        self.inner.session.session_id()
    }

    /// Returns the underlying session.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Returns the snapshot store.
    #[inline]
    #[must_use]
    pub fn snapshot_store(&self) -> &SnapshotStore {
        &self.inner.store
    }
}

// ============================================================================
// Page - Lifecycle
// ============================================================================

impl Page {
    /// Brings this page to the foreground.
    pub async fn bring_to_front(&self) -> Result<()> {
        debug!(target_id = %self.target_id(), "Bringing page to front");
        self.execute(Command::Page(PageCommand::BringToFront)).await?;
        Ok(())
    }

    /// Detaches from the page, leaving the tab open.
    pub async fn detach(&self) -> Result<()> {
        debug!(target_id = %self.target_id(), "Detaching page");
        self.targets().detach(&self.inner.session).await
    }

    /// Closes the tab.
    pub async fn close(&self) -> Result<()> {
        debug!(target_id = %self.target_id(), "Closing page");
        self.targets().close(self.target_id()).await
    }
}

// ============================================================================
// Page - Internal
// ============================================================================

impl Page {
    /// Sends a typed command on this page's session.
    pub(crate) async fn execute(&self, command: Command) -> Result<Value> {
        self.inner.session.execute(command).await
    }

    fn targets(&self) -> TargetRegistry {
        TargetRegistry::new(self.inner.session.connection().clone())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::Page;
    use crate::browser::page::testing::page;
    use crate::transport::testing::connected;
    use serde_json::json;

    #[test]
    fn test_page_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<Page>();
    }

    #[test]
    fn test_page_is_debug() {
        fn assert_debug<T: std::fmt::Debug>() {}
        assert_debug::<Page>();
    }

    #[tokio::test]
    async fn test_close_detaches_session() {
        let (connection, browser) = connected().await;
        browser.serve(|method, params, session| match method {
            "Target.closeTarget" => {
                assert!(session.is_none());
                assert_eq!(params["targetId"], "T1");
                Ok(json!({"success": true}))
            }
            _ => Ok(json!({})),
        });
        let dir = tempfile::tempdir().expect("tempdir");
        let page = page(connection, &dir);

        page.bring_to_front().await.expect("bring to front");
        page.close().await.expect("close");
        assert!(!page.session().is_attached());
    }
}
