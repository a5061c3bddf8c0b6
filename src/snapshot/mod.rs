//! Accessibility snapshot pipeline.
//!
//! Turns the page's accessibility tree text into an addressable document:
//! every interactive element (and every named content element) gets a ref
//! id that later commands can use as `@eN`.
//!
//! ```text
//! raw tree ──► scanner ──► processor ──► SnapshotDocument ──► SnapshotStore
//!                (ParsedLine)   (filters, refs, nth)            (JSON file)
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `roles` | Interactive / content / structural role tables |
//! | `scanner` | Line scanner producing `ParsedLine` |
//! | `processor` | Filters and ref minting |
//! | `document` | `SnapshotDocument` and `ElementRef` |
//! | `store` | JSON persistence |

// ============================================================================
// Submodules
// ============================================================================

/// Snapshot document and element refs.
pub mod document;

/// Filtering and ref minting.
pub mod processor;

/// ARIA role tables.
pub mod roles;

/// Line scanner.
pub mod scanner;

/// Snapshot persistence.
pub mod store;

// ============================================================================
// Re-exports
// ============================================================================

pub use document::{ElementRef, SnapshotDocument, SnapshotStats};
pub use processor::{EMPTY_TREE, ProcessedTree, SnapshotOptions, SnapshotProcessor};
pub use roles::RoleClass;
pub use scanner::{ParsedLine, ScannedLine};
pub use store::SnapshotStore;
