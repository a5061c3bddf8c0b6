//! Page automation and control.
//!
//! Each [`Page`] is one attached page target.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | Page struct and accessors |
//! | `navigation` | URL navigation, history, readiness |
//! | `script` | JavaScript evaluation |
//! | `snapshot` | Accessibility snapshots |
//! | `actions` | Element actions by selector or `@ref` |
//! | `capture` | Screenshots |
//!
//! # Example
//!
//! ```ignore
//! let page = browser.new_page("about:blank").await?;
//!
//! page.navigate("https://example.com").await?;
//! page.wait_for_ready(Duration::from_secs(10)).await?;
//!
//! let snapshot = page.snapshot(&SnapshotOptions::new().with_interactive_only()).await?;
//! println!("{}", snapshot.tree);
//!
//! page.click("@e1").await?;
//! page.fill("input[name=q]", "rust").await?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod actions;
mod capture;
mod core;
mod navigation;
mod script;
mod snapshot;

// ============================================================================
// Re-exports
// ============================================================================

pub use core::Page;

#[cfg(test)]
pub(crate) mod testing {
    use crate::identifiers::{SessionId, TargetId};
    use crate::session::Session;
    use crate::snapshot::SnapshotStore;
    use crate::transport::Connection;

    use super::Page;

    /// A page on session `S1` / target `T1` with a store under `dir`.
    pub(crate) fn page(connection: Connection, dir: &tempfile::TempDir) -> Page {
        let session = Session::attached(connection, SessionId::new("S1"), TargetId::new("T1"));
        Page::new(session, SnapshotStore::new(dir.path().join("snapshot.json")))
    }

    /// `Runtime.evaluate` result wrapping a by-value JSON value.
    pub(crate) fn evaluated(value: serde_json::Value) -> serde_json::Value {
        serde_json::json!({"result": {"type": "object", "value": value}})
    }
}
