//! Snapshot persistence.
//!
//! The latest [`SnapshotDocument`] is kept in one JSON file so that later,
//! separate invocations can resolve `@eN` refs.
//!
//! # Format
//!
//! ```json
//! {
//!   "timestamp": 1718000000000,
//!   "tree": "- button \"Save\" [ref=e1]",
//!   "refs": { "e1": {"ref_id": "e1", "selector": "...", "role": "button", "name": "Save"} }
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;

use super::document::SnapshotDocument;

// ============================================================================
// Constants
// ============================================================================

/// Directory under the user cache dir.
const CACHE_DIR_NAME: &str = "cdp-pilot";

/// File name of the stored snapshot.
const SNAPSHOT_FILE_NAME: &str = "snapshot.json";

// ============================================================================
// SnapshotStore
// ============================================================================

/// File-backed store for the latest snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Creates a store at an explicit path.
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location: `<cache dir>/cdp-pilot/snapshot.json`, falling back
    /// to the system temp dir when no cache dir is known.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(CACHE_DIR_NAME)
            .join(SNAPSHOT_FILE_NAME)
    }

    /// Returns the file path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the document, replacing any previous one.
    ///
    /// Writes to a sibling temp file and renames it into place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) or [`Error::Json`](crate::Error::Json).
    pub fn save(&self, document: &SnapshotDocument) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(document)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), refs = document.refs.len(), "Snapshot saved");
        Ok(())
    }

    /// Reads the stored document; `Ok(None)` when no snapshot was ever saved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) for unreadable files and
    /// [`Error::Json`](crate::Error::Json) for corrupt ones.
    pub fn load(&self) -> Result<Option<SnapshotDocument>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let document = serde_json::from_str(&text).inspect_err(|e| {
            warn!(path = %self.path.display(), error = %e, "Stored snapshot is corrupt");
        })?;
        Ok(Some(document))
    }

    /// Removes the stored snapshot. Missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if removal fails.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

// ============================================================================
// Tests
// ============================================================================
