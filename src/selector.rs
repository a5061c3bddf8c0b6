//! Selector resolution.
//!
//! User-facing selectors come in two forms:
//!
//! - any CSS selector, passed through untouched
//! - `@` + ref id (`@e3`), looked up in the stored snapshot
//!
//! ```ignore
//! let resolver = SelectorResolver::new(&store);
//!
//! resolver.resolve("#submit")?;   // ResolvedElement::Css
//! resolver.resolve("@e3")?;       // ResolvedElement::Role { role, name, nth }
//! ```
//!
//! Resolution is local: no round-trip to the browser. An invalid CSS
//! selector only surfaces later, as an element-not-found.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Error, Result};
use crate::snapshot::{SnapshotDocument, SnapshotStore};

// ============================================================================
// ResolvedElement
// ============================================================================

/// How to find an element in the live page.
///
/// Exactly one form: never CSS and role-based at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum ResolvedElement {
    /// CSS selector for `querySelector`.
    Css {
        /// The selector.
        selector: String,
    },

    /// Role query re-run against the live DOM.
    Role {
        /// ARIA role.
        role: String,
        /// Accessible name to match exactly.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// Index among matches; absent means the first.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        nth: Option<usize>,
    },
}

impl ResolvedElement {
    /// Creates a CSS form.
    #[inline]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css {
            selector: selector.into(),
        }
    }

    /// Creates a role form.
    #[inline]
    pub fn role(role: impl Into<String>, name: Option<String>, nth: Option<usize>) -> Self {
        Self::Role {
            role: role.into(),
            name,
            nth,
        }
    }

    /// Returns `true` for the CSS form.
    #[inline]
    #[must_use]
    pub fn is_css(&self) -> bool {
        matches!(self, Self::Css { .. })
    }
}

impl fmt::Display for ResolvedElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css { selector } => f.write_str(selector),
            Self::Role { role, name, nth } => {
                write!(f, "role={role}")?;
                if let Some(name) = name {
                    write!(f, "[name={name:?}]")?;
                }
                if let Some(nth) = nth {
                    write!(f, " >> nth={nth}")?;
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// SelectorResolver
// ============================================================================

/// Resolves selector strings against the stored snapshot.
///
/// The snapshot is re-read on every `@ref` resolution, so a snapshot taken
/// by another process is picked up.
#[derive(Debug, Clone, Copy)]
pub struct SelectorResolver<'a> {
    store: &'a SnapshotStore,
}

impl<'a> SelectorResolver<'a> {
    /// Creates a resolver over a store.
    #[inline]
    #[must_use]
    pub fn new(store: &'a SnapshotStore) -> Self {
        Self { store }
    }

    /// Resolves a selector.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSelector`] for an empty selector or a bare `@`
    /// - [`Error::SnapshotRequired`] for `@ref` with no stored snapshot
    /// - [`Error::RefNotFound`] for `@ref` missing from the snapshot
    /// - [`Error::Io`] / [`Error::Json`] if the stored snapshot is unreadable
    pub fn resolve(&self, selector: &str) -> Result<ResolvedElement> {
        if ref_id(selector)?.is_none() {
            return Ok(ResolvedElement::css(selector));
        }

        let document = self.store.load()?;
        resolve_in(document.as_ref(), selector)
    }
}

/// Resolves a selector against an already-loaded snapshot.
///
/// # Errors
///
/// Same as [`SelectorResolver::resolve`], minus IO.
pub fn resolve_in(document: Option<&SnapshotDocument>, selector: &str) -> Result<ResolvedElement> {
    let Some(ref_id) = ref_id(selector)? else {
        return Ok(ResolvedElement::css(selector));
    };

    let document = document.ok_or(Error::SnapshotRequired)?;
    let element = document
        .get(ref_id)
        .ok_or_else(|| Error::ref_not_found(ref_id))?;

    trace!(ref_id, role = %element.role, nth = ?element.nth, "Resolved ref");

    Ok(ResolvedElement::role(
        element.role.clone(),
        element.name.clone(),
        element.nth,
    ))
}

/// Splits off the ref id of an `@ref` selector; `None` for CSS.
fn ref_id(selector: &str) -> Result<Option<&str>> {
    let trimmed = selector.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_selector(selector, "selector is empty"));
    }

    match trimmed.strip_prefix('@') {
        Some("") => Err(Error::invalid_selector(selector, "missing ref id after '@'")),
        Some(id) => Ok(Some(id)),
        None => Ok(None),
    }
}

// ============================================================================
// Tests
// ============================================================================
