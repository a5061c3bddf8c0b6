//! The current-page registry.
//!
//! A [`PageRegistry`] holds at most one attached [`Page`], the one commands
//! without an explicit target act on. Switching pages detaches the old one.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::identifiers::TargetId;

use super::core::Browser;
use super::page::Page;

// ============================================================================
// PageRegistry
// ============================================================================

/// Tracks the current page of a [`Browser`].
///
/// # Example
///
/// ```ignore
/// let registry = browser.registry();
/// registry.select_tab(0).await?;
///
/// registry.current()?.navigate("https://example.com").await?;
/// registry.shutdown().await?;
/// ```
#[derive(Debug)]
pub struct PageRegistry {
    browser: Browser,
    current: Mutex<Option<Page>>,
}

impl PageRegistry {
    /// Creates a registry with no current page.
    #[must_use]
    pub fn new(browser: Browser) -> Self {
        Self {
            browser,
            current: Mutex::new(None),
        }
    }

    /// Returns the browser.
    #[inline]
    #[must_use]
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Returns the current page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActivePage`] if none has been selected.
    pub fn current(&self) -> Result<Page> {
        self.current.lock().clone().ok_or(Error::NoActivePage)
    }

    /// Attaches to `target_id` and makes it current.
    ///
    /// The new page is attached before the old one is detached, so a failed
    /// attach leaves the current page untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TargetNotFound`] if the browser rejects the id.
    pub async fn use_target(&self, target_id: &TargetId) -> Result<Page> {
        let page = self.browser.attach(target_id).await?;

        let previous = self.current.lock().replace(page.clone());
        if let Some(previous) = previous {
            release(&previous).await;
        }

        debug!(%target_id, "Current page changed");
        Ok(page)
    }

    /// Makes the `index`-th page target current and brings it to the front.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if `index` is out of range.
    pub async fn select_tab(&self, index: usize) -> Result<Page> {
        let pages = self.browser.pages().await?;
        let target = pages.get(index).ok_or_else(|| {
            Error::protocol(format!(
                "tab index {index} out of range ({} open)",
                pages.len()
            ))
        })?;

        self.browser.targets().activate(&target.target_id).await?;
        self.use_target(&target.target_id).await
    }

    /// Detaches the current page, if any.
    ///
    /// # Errors
    ///
    /// Returns the browser's error from `Target.detachFromTarget`.
    pub async fn shutdown(&self) -> Result<()> {
        let previous = self.current.lock().take();
        match previous {
            Some(page) => page.detach().await,
            None => Ok(()),
        }
    }
}

/// Detaches a replaced page; failures are logged.
async fn release(page: &Page) {
    if let Err(e) = page.detach().await {
        warn!(target_id = %page.target_id(), error = %e, "Failed to detach previous page");
    }
}

// ============================================================================
// Tests
// ============================================================================
