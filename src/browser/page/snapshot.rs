//! Accessibility snapshots.

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::scripts;
use crate::snapshot::{SnapshotDocument, SnapshotOptions, SnapshotProcessor};

use super::Page;

// ============================================================================
// Page - Snapshot
// ============================================================================

impl Page {
    /// Takes an accessibility snapshot and stores it.
    ///
    /// The stored document replaces any previous one; its refs are what
    /// `@eN` selectors resolve against from then on.
    ///
    /// # Errors
    ///
    /// - [`Error::ElementNotFound`] if `options.scope` matches nothing
    /// - [`Error::Protocol`] if the page returns an unexpected shape
    /// - [`Error::Io`] if the snapshot cannot be written
    pub async fn snapshot(&self, options: &SnapshotOptions) -> Result<SnapshotDocument> {
        debug!(
            target_id = %self.target_id(),
            interactive_only = options.interactive_only,
            compact = options.compact,
            max_depth = ?options.max_depth,
            scope = ?options.scope,
            "Taking snapshot"
        );

        let script = scripts::accessibility_tree(options.scope.as_deref())?;
        let value = self.evaluate(&script).await?;

        if !value.get("found").and_then(Value::as_bool).unwrap_or(false) {
            return Err(Error::element_not_found(
                options.scope.as_deref().unwrap_or("document"),
            ));
        }

        let raw = value
            .get("tree")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::protocol("snapshot script returned no tree"))?;

        let document = SnapshotProcessor::new(options.clone())
            .process(raw)
            .into_document();
        self.inner.store.save(&document)?;

        debug!(target_id = %self.target_id(), refs = document.refs.len(), "Snapshot taken");
        Ok(document)
    }
}

// ============================================================================
// Tests
// ============================================================================
