//! Builder pattern for driver configuration.
//!
//! Provides a fluent API for configuring and creating [`Driver`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use cdp_pilot::Driver;
//!
//! # fn example() -> cdp_pilot::Result<()> {
//! let driver = Driver::builder()
//!     .endpoint("ws://127.0.0.1:9222/devtools/browser/4f6c")
//!     .command_timeout(Duration::from_secs(10))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::snapshot::SnapshotStore;
use crate::transport::Endpoint;

use super::core::Driver;
use super::options::ConnectionOptions;

// ============================================================================
// Constants
// ============================================================================

/// Environment variable holding the DevTools WebSocket URL.
pub const ENDPOINT_ENV: &str = "CDP_PILOT_ENDPOINT";

/// Environment variable overriding the snapshot file path.
pub const SNAPSHOT_PATH_ENV: &str = "CDP_PILOT_SNAPSHOT_PATH";

// ============================================================================
// DriverBuilder
// ============================================================================

/// Builder for configuring a [`Driver`] instance.
///
/// Use [`Driver::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct DriverBuilder {
    /// DevTools WebSocket URL.
    endpoint: Option<String>,
    /// Connection tuning.
    options: ConnectionOptions,
    /// Snapshot file; defaults to [`SnapshotStore::default_path`].
    snapshot_path: Option<PathBuf>,
}

// ============================================================================
// DriverBuilder Implementation
// ============================================================================

impl DriverBuilder {
    /// Creates a new driver builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder from `CDP_PILOT_ENDPOINT` and
    /// `CDP_PILOT_SNAPSHOT_PATH`. Unset variables leave the default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = Self::new();
        builder.endpoint = non_empty(ENDPOINT_ENV);
        builder.snapshot_path = non_empty(SNAPSHOT_PATH_ENV).map(PathBuf::from);
        builder
    }

    /// Sets the DevTools WebSocket URL.
    ///
    /// # Arguments
    ///
    /// * `url` - e.g. `ws://127.0.0.1:9222/devtools/browser/<guid>`
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Replaces all connection options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ConnectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the per-command timeout.
    #[inline]
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_command_timeout(timeout);
        self
    }

    /// Sets the connect and handshake timeout.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_connect_timeout(timeout);
        self
    }

    /// Sets where snapshots are stored.
    #[inline]
    #[must_use]
    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Builds the driver with validation. Does not connect.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no endpoint is set or an option is zero
    /// - [`Error::InvalidEndpoint`] if the endpoint is malformed
    pub fn build(self) -> Result<Driver> {
        let endpoint = self.validate_endpoint()?;
        self.options.validate()?;

        let store = SnapshotStore::new(
            self.snapshot_path
                .unwrap_or_else(SnapshotStore::default_path),
        );

        Ok(Driver::new(endpoint, self.options, store))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl DriverBuilder {
    /// Validates the endpoint configuration.
    fn validate_endpoint(&self) -> Result<Endpoint> {
        let endpoint = self.endpoint.as_deref().ok_or_else(|| {
            Error::config(format!(
                "DevTools endpoint is required. Use .endpoint() or set {ENDPOINT_ENV}.\n\
                 Example: Driver::builder().endpoint(\"ws://127.0.0.1:9222/devtools/browser/<id>\")"
            ))
        })?;

        Endpoint::parse(endpoint)
    }
}

// ============================================================================
// Tests
// ============================================================================
