//! Browser entities module.
//!
//! This module provides the browser-facing types:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Browser`] | One connection to a browser's DevTools endpoint |
//! | [`TargetRegistry`] | List, create, attach, detach, activate, close targets |
//! | [`PageRegistry`] | The current page, switched explicitly |
//! | [`Page`] | One attached page target |
//!
//! # Example
//!
//! ```no_run
//! use cdp_pilot::{Driver, Result, SnapshotOptions};
//!
//! # async fn example() -> Result<()> {
//! let browser = Driver::builder()
//!     .endpoint("ws://127.0.0.1:9222/devtools/browser/4f6c")
//!     .build()?
//!     .connect()
//!     .await?;
//!
//! let registry = browser.registry();
//! let page = registry.select_tab(0).await?;
//!
//! let snapshot = page.snapshot(&SnapshotOptions::new().with_interactive_only()).await?;
//! println!("{}", snapshot.tree);
//! page.click("@e1").await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Browser handle.
pub mod core;

/// Page automation.
pub mod page;

/// Current-page registry.
pub mod registry;

/// Target discovery and lifecycle.
pub mod targets;

// ============================================================================
// Re-exports
// ============================================================================

pub use core::Browser;
pub use page::Page;
pub use registry::PageRegistry;
pub use targets::{TargetInfo, TargetRegistry};
