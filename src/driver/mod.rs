//! Driver module.
//!
//! This module provides the entry point for connecting to a browser.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Driver`] | Validated configuration; opens connections |
//! | [`DriverBuilder`] | Fluent configuration builder |
//! | [`ConnectionOptions`] | Timeouts and limits for one connection |
//!
//! # Example
//!
//! ```no_run
//! use cdp_pilot::{Driver, Result};
//!
//! # async fn example() -> Result<()> {
//! let driver = Driver::builder()
//!     .endpoint("ws://127.0.0.1:9222/devtools/browser/4f6c")
//!     .build()?;
//!
//! let browser = driver.connect().await?;
//! let page = browser.new_page("https://example.com").await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for driver configuration.
pub mod builder;

/// Core driver implementation.
pub mod core;

/// Connection timeouts and limits.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::DriverBuilder;
pub use core::Driver;
pub use options::ConnectionOptions;
