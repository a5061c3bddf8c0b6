//! Type-safe identifiers for protocol entities.
//!
//! Newtype wrappers prevent mixing a session id with a target id, or a
//! command id with any other integer, at compile time.
//!
//! | Type | Wire form | Issued by |
//! |------|-----------|-----------|
//! | [`CommandId`] | `u64` | local connection counter |
//! | [`SessionId`] | string | browser, on `Target.attachToTarget` |
//! | [`TargetId`] | string | browser |
//! | [`RefId`] | `eN` | snapshot processor |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ============================================================================
// CommandId
// ============================================================================

/// Identifier correlating a command with its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(u64);

impl CommandId {
    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic command id source, starting at 1.
#[derive(Debug)]
pub(crate) struct CommandIdGenerator {
    next: AtomicU64,
}

impl CommandIdGenerator {
    pub(crate) const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocates the next id. Ids are strictly increasing.
    #[inline]
    pub(crate) fn next(&self) -> CommandId {
        CommandId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for CommandIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// String Identifiers
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw identifier.
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Browser-issued id scoping commands and events to one attached target.
    SessionId
);

string_id!(
    /// Browser-issued id of a tab, worker or other controllable unit.
    TargetId
);

string_id!(
    /// Snapshot reference id (`e1`, `e2`, ...), without the leading `@`.
    RefId
);

impl RefId {
    /// Builds the ref id for the given 1-based ordinal.
    #[inline]
    #[must_use]
    pub fn from_ordinal(n: usize) -> Self {
        Self(format!("e{n}"))
    }
}

// ============================================================================
// Tests
// ============================================================================
