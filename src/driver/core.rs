//! Driver entry point.
//!
//! The [`Driver`] holds validated configuration and opens connections.
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
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::browser::Browser;
use crate::error::Result;
use crate::snapshot::SnapshotStore;
use crate::transport::{Connection, Endpoint};

use super::builder::DriverBuilder;
use super::options::ConnectionOptions;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the driver.
pub(crate) struct DriverInner {
    /// Validated DevTools endpoint.
    pub endpoint: Endpoint,

    /// Options for every connection this driver opens.
    pub options: ConnectionOptions,

    /// Store handed to every browser.
    pub store: SnapshotStore,
}

// ============================================================================
// Driver
// ============================================================================

/// Configured entry point for connecting to a browser.
///
/// Cheap to clone. Each [`connect`](Self::connect) opens a separate
/// connection; all of them share the snapshot store.
#[derive(Clone)]
pub struct Driver {
    /// Shared inner state.
    pub(crate) inner: Arc<DriverInner>,
}

// ============================================================================
// Driver - Display
// ============================================================================

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("snapshot_path", &self.inner.store.path())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Driver - Public API
// ============================================================================

impl Driver {
    /// Creates a configuration builder for the driver.
    #[inline]
    #[must_use]
    pub fn builder() -> DriverBuilder {
        DriverBuilder::new()
    }

    /// Opens a connection to the browser.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`](crate::Error::Connection) if the socket or
    ///   handshake fails
    /// - [`Error::ConnectionTimeout`](crate::Error::ConnectionTimeout) if
    ///   that takes longer than the connect timeout
    pub async fn connect(&self) -> Result<Browser> {
        let connection = Connection::open(self.inner.endpoint.as_str(), self.inner.options).await?;

        info!(endpoint = %self.inner.endpoint, "Connected to browser");
        Ok(Browser::new(connection, self.inner.store.clone()))
    }

    /// Returns the endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.inner.endpoint
    }

    /// Returns the connection options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ConnectionOptions {
        &self.inner.options
    }

    /// Returns the snapshot store.
    #[inline]
    #[must_use]
    pub fn snapshot_store(&self) -> &SnapshotStore {
        &self.inner.store
    }
}

// ============================================================================
// Driver - Internal
// ============================================================================

impl Driver {
    /// Creates a driver from validated parts.
    pub(crate) fn new(endpoint: Endpoint, options: ConnectionOptions, store: SnapshotStore) -> Self {
        Self {
            inner: Arc::new(DriverInner {
                endpoint,
                options,
                store,
            }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
