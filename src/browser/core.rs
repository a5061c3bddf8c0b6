//! Browser-level handle over one connection.
//!
//! A [`Browser`] owns the [`Connection`] to a running browser's DevTools
//! endpoint and hands out [`Page`]s that share one [`SnapshotStore`].
//!
//! # Example
//!
//! ```no_run
//! use cdp_pilot::Driver;
//!
//! # async fn example() -> cdp_pilot::Result<()> {
//! let driver = Driver::builder()
//!     .endpoint("ws://127.0.0.1:9222/devtools/browser/4f6c")
//!     .build()?;
//!
//! let browser = driver.connect().await?;
//! let page = browser.new_page("https://example.com").await?;
//! println!("{}", page.title().await?);
//!
//! browser.close();
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Result;
use crate::identifiers::TargetId;
use crate::snapshot::SnapshotStore;
use crate::transport::Connection;

use super::page::Page;
use super::registry::PageRegistry;
use super::targets::{TargetInfo, TargetRegistry};

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a browser.
pub(crate) struct BrowserInner {
    /// Browser-level connection.
    pub connection: Connection,
    /// Target operations over `connection`.
    pub targets: TargetRegistry,
    /// Store shared by every page.
    pub store: SnapshotStore,
}

// ============================================================================
// Browser
// ============================================================================

/// A handle to a connected browser.
///
/// Cloning shares the same connection.
#[derive(Clone)]
pub struct Browser {
    pub(crate) inner: Arc<BrowserInner>,
}

impl fmt::Debug for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Browser")
            .field("closed", &self.inner.connection.is_closed())
            .field("store", &self.inner.store.path())
            .finish_non_exhaustive()
    }
}

impl Browser {
    /// Wraps an open connection.
    #[must_use]
    pub fn new(connection: Connection, store: SnapshotStore) -> Self {
        let targets = TargetRegistry::new(connection.clone());
        Self {
            inner: Arc::new(BrowserInner {
                connection,
                targets,
                store,
            }),
        }
    }
}

// ============================================================================
// Browser - Accessors
// ============================================================================

impl Browser {
    /// Returns the browser-level connection.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.inner.connection
    }

    /// Returns the target registry.
    #[inline]
    #[must_use]
    pub fn targets(&self) -> &TargetRegistry {
        &self.inner.targets
    }

    /// Returns the snapshot store shared by all pages.
    #[inline]
    #[must_use]
    pub fn snapshot_store(&self) -> &SnapshotStore {
        &self.inner.store
    }

    /// Creates an empty page registry over this browser.
    #[must_use]
    pub fn registry(&self) -> PageRegistry {
        PageRegistry::new(self.clone())
    }
}

// ============================================================================
// Browser - Pages
// ============================================================================

impl Browser {
    /// Lists page targets.
    pub async fn pages(&self) -> Result<Vec<TargetInfo>> {
        self.inner.targets.pages().await
    }

    /// Attaches to an existing target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TargetNotFound`](crate::Error::TargetNotFound) if the
    /// browser rejects the id.
    pub async fn attach(&self, target_id: &TargetId) -> Result<Page> {
        let session = self.inner.targets.attach(target_id).await?;
        debug!(%target_id, session_id = %session.session_id(), "Attached page");
        Ok(Page::new(session, self.inner.store.clone()))
    }

    /// Opens a new tab at `url` and attaches to it.
    pub async fn new_page(&self, url: &str) -> Result<Page> {
        let target_id = self.inner.targets.create(url).await?;
        self.attach(&target_id).await
    }

    /// Closes the connection. Open tabs stay open.
    pub fn close(&self) {
        self.inner.connection.close();
        info!("Browser connection closed");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Browser;
    use crate::error::Error;
    use crate::identifiers::TargetId;
    use crate::snapshot::SnapshotStore;
    use crate::transport::testing::connected;

    #[tokio::test]
    async fn test_new_page_attaches() {
        let (connection, browser) = connected().await;
        browser.serve(|method, params, _| match method {
            "Target.createTarget" => {
                assert_eq!(params["url"], "about:blank");
                Ok(json!({"targetId": "T7"}))
            }
            "Target.attachToTarget" => {
                assert_eq!(params["flatten"], true);
                Ok(json!({"sessionId": "S7"}))
            }
            _ => Err((-32601, format!("'{method}' wasn't found"))),
        });
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::new(dir.path().join("snapshot.json"));

        let browser = Browser::new(connection, store.clone());
        let page = browser.new_page("about:blank").await.expect("new page");

        assert_eq!(page.target_id().as_str(), "T7");
        assert_eq!(page.session_id().as_str(), "S7");
        assert_eq!(page.snapshot_store(), &store);
    }

    #[tokio::test]
    async fn test_attach_unknown_target() {
        let (connection, browser) = connected().await;
        browser.serve(|_, _, _| Err((-32602, "No target with given id found".into())));
        let dir = tempfile::tempdir().expect("tempdir");

        let browser = Browser::new(connection, SnapshotStore::new(dir.path().join("s.json")));
        let err = browser.attach(&TargetId::new("nope")).await.unwrap_err();
        assert!(matches!(err, Error::TargetNotFound { .. }));
    }

    #[tokio::test]
    async fn test_close_closes_connection() {
        let (connection, _browser) = connected().await;
        let dir = tempfile::tempdir().expect("tempdir");

        let browser = Browser::new(connection, SnapshotStore::new(dir.path().join("s.json")));
        browser.close();
        assert!(browser.connection().is_closed());
    }
}
