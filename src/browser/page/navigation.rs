//! Page navigation methods.

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::{Command, PageCommand};
use crate::scripts;

use super::Page;

// ============================================================================
// Constants
// ============================================================================

/// Interval between `document.readyState` polls.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

// ============================================================================
// Page - Navigation
// ============================================================================

impl Page {
    /// Navigates to a URL.
    ///
    /// Returns once the browser has committed the navigation; use
    /// [`wait_for_ready`](Self::wait_for_ready) to wait for the load.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Navigation`] if the browser reports an `errorText`.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        debug!(url, target_id = %self.target_id(), "Navigating");

        let result = self
            .execute(Command::Page(PageCommand::Navigate {
                url: url.to_string(),
            }))
            .await?;

        if let Some(error_text) = result
            .get("errorText")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
        {
            return Err(Error::navigation(url, error_text));
        }

        Ok(())
    }

    /// Reloads the current page.
    pub async fn reload(&self) -> Result<()> {
        debug!(target_id = %self.target_id(), "Reloading page");
        self.execute(Command::Page(PageCommand::Reload { ignore_cache: false }))
            .await?;
        Ok(())
    }

    /// Navigates back in history.
    pub async fn go_back(&self) -> Result<()> {
        debug!(target_id = %self.target_id(), "Navigating back");
        self.evaluate(&scripts::history_go(-1)).await?;
        Ok(())
    }

    /// Navigates forward in history.
    pub async fn go_forward(&self) -> Result<()> {
        debug!(target_id = %self.target_id(), "Navigating forward");
        self.evaluate(&scripts::history_go(1)).await?;
        Ok(())
    }

    /// Gets the current URL.
    pub async fn url(&self) -> Result<String> {
        self.evaluate_string(scripts::LOCATION_HREF).await
    }

    /// Gets the current page title.
    pub async fn title(&self) -> Result<String> {
        self.evaluate_string(scripts::DOCUMENT_TITLE).await
    }

    /// Waits until `document.readyState` is `complete`.
    ///
    /// Evaluation failures while a navigation swaps the document are
    /// retried until the deadline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the page is not ready in time, or any
    /// connection error.
    pub async fn wait_for_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;

        loop {
            match self.evaluate_string(scripts::READY_STATE).await {
                Ok(state) if state == "complete" => {
                    debug!(target_id = %self.target_id(), "Page ready");
                    return Ok(());
                }
                Ok(state) => trace!(state = %state, "Page not ready"),
                Err(e @ (Error::Cdp { .. } | Error::ScriptError { .. })) => {
                    trace!(error = %e, "Ready check failed, retrying");
                }
                Err(e) => return Err(e),
            }

            if Instant::now() + READY_POLL_INTERVAL > deadline {
                return Err(Error::timeout(
                    "waiting for document ready",
                    timeout.as_millis() as u64,
                ));
            }
            sleep(READY_POLL_INTERVAL).await;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
