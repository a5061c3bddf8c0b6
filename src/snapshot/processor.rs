//! Accessibility tree annotation.
//!
//! Turns the raw indented tree into an annotated tree plus a ref table.
//!
//! # Filters
//!
//! Applied per line, in this order:
//!
//! 1. `max_depth`: drop lines indented deeper than the limit
//! 2. `interactive_only`: keep only interactive roles, emitted flat
//! 3. `compact`: drop nameless structural lines
//!
//! Each filter looks at the line alone. A line whose parent was dropped by
//! another filter still survives; subtrees are never pruned as a unit.
//!
//! # Refs
//!
//! A surviving line gets a ref when it is interactive, or a content role
//! with a name. Refs are minted `e1, e2, ...` in line order. Repeated
//! `(role, name)` pairs get `nth = 1, 2, ...` after the first occurrence.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt::Write as _;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::identifiers::RefId;

use super::document::{ElementRef, SnapshotDocument};
use super::roles::RoleClass;
use super::scanner::{self, ParsedLine, ScannedLine};

// ============================================================================
// Constants
// ============================================================================

/// Serialized form of a tree with no surviving lines.
pub const EMPTY_TREE: &str = "(empty)";

// ============================================================================
// SnapshotOptions
// ============================================================================

/// Snapshot filtering options.
///
/// # Example
///
/// ```ignore
/// let options = SnapshotOptions::new().with_interactive_only().with_max_depth(4);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotOptions {
    /// Keep only interactive roles.
    pub interactive_only: bool,

    /// Drop nameless structural lines.
    pub compact: bool,

    /// Drop lines indented deeper than this.
    pub max_depth: Option<usize>,

    /// CSS selector of the subtree to capture (whole document if `None`).
    pub scope: Option<String>,
}

impl SnapshotOptions {
    /// Creates options with every filter off.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only interactive roles.
    #[inline]
    #[must_use]
    pub fn with_interactive_only(mut self) -> Self {
        self.interactive_only = true;
        self
    }

    /// Drops nameless structural lines.
    #[inline]
    #[must_use]
    pub fn with_compact(mut self) -> Self {
        self.compact = true;
        self
    }

    /// Limits indentation depth.
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Restricts capture to the subtree under a CSS selector.
    #[inline]
    #[must_use]
    pub fn with_scope(mut self, selector: impl Into<String>) -> Self {
        self.scope = Some(selector.into());
        self
    }
}

// ============================================================================
// ProcessedTree
// ============================================================================

/// Output of [`SnapshotProcessor::process`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedTree {
    /// Annotated tree text, or [`EMPTY_TREE`].
    pub tree: String,
    /// Ref table keyed by ref id.
    pub refs: BTreeMap<String, ElementRef>,
}

impl ProcessedTree {
    /// Wraps the result into a timestamped document.
    #[inline]
    #[must_use]
    pub fn into_document(self) -> SnapshotDocument {
        SnapshotDocument::new(self.tree, self.refs)
    }
}

// ============================================================================
// SnapshotProcessor
// ============================================================================

/// Annotates raw accessibility tree text.
#[derive(Debug, Clone, Default)]
pub struct SnapshotProcessor {
    options: SnapshotOptions,
}

impl SnapshotProcessor {
    /// Creates a processor with the given options.
    #[inline]
    #[must_use]
    pub fn new(options: SnapshotOptions) -> Self {
        Self { options }
    }

    /// Returns the options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &SnapshotOptions {
        &self.options
    }

    /// Processes a raw tree. Deterministic for identical input.
    #[must_use]
    pub fn process(&self, raw: &str) -> ProcessedTree {
        let mut refs = BTreeMap::new();
        let mut tracker = NthTracker::default();
        let mut lines: Vec<String> = Vec::new();
        let mut next_ordinal = 1usize;

        for (line, scanned) in raw.lines().zip(scanner::scan(raw)) {
            if self
                .options
                .max_depth
                .is_some_and(|max| scanned.depth() > max)
            {
                continue;
            }

            let parsed = match scanned {
                ScannedLine::Element(parsed) => parsed,
                ScannedLine::Other { text, .. } => {
                    if !self.options.interactive_only {
                        lines.push(text.to_string());
                    }
                    continue;
                }
            };

            let class = parsed.class();
            if self.options.interactive_only && !class.is_interactive() {
                continue;
            }
            if self.options.compact && class == RoleClass::Structural && parsed.name.is_none() {
                continue;
            }

            let gets_ref = match class {
                RoleClass::Interactive => true,
                RoleClass::Content => parsed.name.is_some(),
                RoleClass::Structural | RoleClass::Other => false,
            };

            if !gets_ref {
                lines.push(line.to_string());
                continue;
            }

            let ref_id = RefId::from_ordinal(next_ordinal);
            next_ordinal += 1;

            let nth = tracker.next(&parsed.role, parsed.name.as_deref());
            lines.push(self.render_ref_line(&parsed, &ref_id, nth));

            let element = ElementRef::new(ref_id.clone(), parsed.role, parsed.name, nth);
            refs.insert(ref_id.as_str().to_string(), element);
        }

        let tree = if lines.is_empty() {
            EMPTY_TREE.to_string()
        } else {
            lines.join("\n")
        };

        debug!(
            lines = lines.len(),
            refs = refs.len(),
            interactive_only = self.options.interactive_only,
            compact = self.options.compact,
            "Processed snapshot tree"
        );

        ProcessedTree { tree, refs }
    }

    /// Renders an element line with its ref annotation.
    fn render_ref_line(&self, parsed: &ParsedLine, ref_id: &RefId, nth: usize) -> String {
        let mut out = String::new();

        if !self.options.interactive_only {
            out.push_str(&"  ".repeat(parsed.depth));
        }
        let _ = write!(out, "- {}", parsed.role);
        if let Some(name) = &parsed.name {
            let _ = write!(out, " \"{}\"", scanner::escape_name(name));
        }
        let _ = write!(out, " [ref={ref_id}]");
        if nth > 0 {
            let _ = write!(out, " [nth={nth}]");
        }

        // Flat output has no children, so a trailing ':' would dangle.
        if self.options.interactive_only {
            out.push_str(parsed.suffix.trim_end_matches(':'));
        } else {
            out.push_str(&parsed.suffix);
        }
        out
    }
}

// ============================================================================
// NthTracker
// ============================================================================

/// Counts occurrences of each `(role, name)` pair in traversal order.
#[derive(Debug, Default)]
struct NthTracker {
    seen: FxHashMap<(String, String), usize>,
}

impl NthTracker {
    /// Returns the 0-based occurrence index for this pair and advances it.
    fn next(&mut self, role: &str, name: Option<&str>) -> usize {
        let key = (role.to_ascii_lowercase(), name.unwrap_or_default().to_string());
        let count = self.seen.entry(key).or_insert(0);
        let nth = *count;
        *count += 1;
        nth
    }
}

// ============================================================================
// Tests
// ============================================================================
