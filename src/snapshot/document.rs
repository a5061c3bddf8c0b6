//! Snapshot document and element refs.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize, Serializer};

use crate::identifiers::RefId;

use super::processor::EMPTY_TREE;
use super::roles::RoleClass;
use super::scanner;

// ============================================================================
// ElementRef
// ============================================================================

/// A candidate element identified by role, name and position.
///
/// Re-resolved against the live page on each use; it goes stale when the
/// page structure changes. It is not a DOM node handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRef {
    /// Ref id (`e1`, `e2`, ...).
    pub ref_id: RefId,

    /// Human readable locator, informational only.
    pub selector: String,

    /// ARIA role.
    pub role: String,

    /// Accessible name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Index among elements sharing this role and name; absent for the first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nth: Option<usize>,
}

impl ElementRef {
    /// Creates a ref. `nth == 0` is stored as `None`.
    #[must_use]
    pub fn new(ref_id: RefId, role: String, name: Option<String>, nth: usize) -> Self {
        let nth = (nth > 0).then_some(nth);
        let selector = describe(&role, name.as_deref(), nth);

        Self {
            ref_id,
            selector,
            role,
            name,
            nth,
        }
    }

    /// Returns the position index, treating absent as 0.
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.nth.unwrap_or(0)
    }
}

/// Builds the descriptive locator string, e.g. `role=button[name="Save"] >> nth=1`.
fn describe(role: &str, name: Option<&str>, nth: Option<usize>) -> String {
    let mut out = format!("role={role}");
    if let Some(name) = name {
        out.push_str(&format!("[name=\"{}\"]", scanner::escape_name(name)));
    }
    if let Some(nth) = nth {
        out.push_str(&format!(" >> nth={nth}"));
    }
    out
}

// ============================================================================
// SnapshotDocument
// ============================================================================

/// One snapshot run: annotated tree plus ref table.
///
/// Each run replaces the previous document in full.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    /// Capture time, milliseconds since the Unix epoch.
    pub timestamp: u64,

    /// Annotated tree text, or `(empty)`.
    pub tree: String,

    /// Ref table keyed by ref id, written in minting order.
    #[serde(serialize_with = "serialize_refs_in_order")]
    pub refs: BTreeMap<String, ElementRef>,
}

impl SnapshotDocument {
    /// Creates a document stamped with the current time.
    #[must_use]
    pub fn new(tree: String, refs: BTreeMap<String, ElementRef>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self {
            timestamp,
            tree,
            refs,
        }
    }

    /// Looks up a ref by id, with or without the leading `@`.
    #[must_use]
    pub fn get(&self, ref_id: &str) -> Option<&ElementRef> {
        self.refs.get(ref_id.strip_prefix('@').unwrap_or(ref_id))
    }

    /// Returns `true` if the snapshot matched nothing.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree == EMPTY_TREE
    }

    /// Refs in minting order (`e2` before `e10`).
    #[must_use]
    pub fn refs_in_order(&self) -> Vec<&ElementRef> {
        let mut refs: Vec<_> = self.refs.values().collect();
        refs.sort_by_key(|r| ref_ordinal(r.ref_id.as_str()));
        refs
    }

    /// Summary counts.
    #[must_use]
    pub fn stats(&self) -> SnapshotStats {
        let lines = if self.is_empty() {
            0
        } else {
            self.tree.lines().count()
        };
        let interactive_refs = self
            .refs
            .values()
            .filter(|r| RoleClass::of(&r.role).is_interactive())
            .count();

        SnapshotStats {
            lines,
            refs: self.refs.len(),
            interactive_refs,
        }
    }
}

fn serialize_refs_in_order<S>(
    refs: &BTreeMap<String, ElementRef>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut ordered: Vec<_> = refs.iter().collect();
    ordered.sort_by_key(|(key, _)| ref_ordinal(key));
    serializer.collect_map(ordered)
}

/// Numeric part of `eN`, `usize::MAX` for anything else.
fn ref_ordinal(ref_id: &str) -> usize {
    ref_id
        .strip_prefix('e')
        .and_then(|n| n.parse().ok())
        .unwrap_or(usize::MAX)
}

// ============================================================================
// SnapshotStats
// ============================================================================

/// Counts describing a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnapshotStats {
    /// Lines in the annotated tree.
    pub lines: usize,
    /// Total refs.
    pub refs: usize,
    /// Refs on interactive roles.
    pub interactive_refs: usize,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> SnapshotDocument {
        let mut refs = BTreeMap::new();
        for (n, role, name, nth) in [
            (1, "link", Some("Home"), 0),
            (2, "link", Some("Home"), 1),
            (10, "heading", Some("News"), 0),
        ] {
            let r = ElementRef::new(RefId::from_ordinal(n), role.into(), name.map(Into::into), nth);
            refs.insert(r.ref_id.to_string(), r);
        }
        SnapshotDocument::new("- link \"Home\" [ref=e1]".into(), refs)
    }

    #[test]
    fn test_element_ref_json_shape() {
        let first = ElementRef::new(RefId::new("e1"), "button".into(), Some("Save".into()), 0);
        let value = serde_json::to_value(&first).expect("serialize");

        assert_eq!(
            value,
            json!({"ref_id": "e1", "selector": "role=button[name=\"Save\"]", "role": "button", "name": "Save"})
        );

        let unnamed = ElementRef::new(RefId::new("e2"), "textbox".into(), None, 2);
        let value = serde_json::to_value(&unnamed).expect("serialize");
        assert_eq!(value["nth"], 2);
        assert!(value.get("name").is_none());
    }

    #[test]
    fn test_get_accepts_at_prefix() {
        let doc = sample();
        assert_eq!(doc.get("@e2").map(ElementRef::index), Some(1));
        assert_eq!(doc.get("e1").map(ElementRef::index), Some(0));
        assert!(doc.get("e3").is_none());
    }

    #[test]
    fn test_refs_in_order_is_numeric() {
        let doc = sample();
        let order: Vec<_> = doc.refs_in_order().iter().map(|r| r.ref_id.to_string()).collect();
        assert_eq!(order, vec!["e1", "e2", "e10"]);
    }

    #[test]
    fn test_refs_are_written_in_minting_order() {
        let mut refs = BTreeMap::new();
        for n in 1..=12 {
            let r = ElementRef::new(RefId::from_ordinal(n), "button".into(), None, n - 1);
            refs.insert(r.ref_id.to_string(), r);
        }
        let doc = SnapshotDocument::new("- button".into(), refs);

        let text = serde_json::to_string(&doc).expect("serialize");
        let e2 = text.find(r#""e2":{"#).expect("e2 key");
        let e10 = text.find(r#""e10":{"#).expect("e10 key");
        assert!(e2 < e10);

        let loaded: SnapshotDocument = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_stats() {
        let stats = sample().stats();
        assert_eq!(stats.lines, 1);
        assert_eq!(stats.refs, 3);
        assert_eq!(stats.interactive_refs, 2);
    }

    #[test]
    fn test_empty_document() {
        let doc = SnapshotDocument::new(EMPTY_TREE.into(), BTreeMap::new());
        assert!(doc.is_empty());
        assert_eq!(doc.stats(), SnapshotStats::default());
    }
}
