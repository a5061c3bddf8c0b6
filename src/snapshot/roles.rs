//! ARIA role tables.
//!
//! Plain data, independent of traversal: which roles get refs, which are
//! dropped in compact mode, and how an implicit role maps back to CSS when
//! re-locating an element in the live DOM.

// ============================================================================
// Role Tables
// ============================================================================

/// Roles a user can act on. Always receive a ref.
pub const INTERACTIVE_ROLES: &[&str] = &[
    "button",
    "link",
    "textbox",
    "checkbox",
    "radio",
    "combobox",
    "listbox",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "option",
    "searchbox",
    "slider",
    "spinbutton",
    "switch",
    "tab",
    "treeitem",
];

/// Roles carrying readable content. Receive a ref only when named.
pub const CONTENT_ROLES: &[&str] = &[
    "heading",
    "cell",
    "gridcell",
    "columnheader",
    "rowheader",
    "listitem",
    "article",
    "region",
    "main",
    "navigation",
];

/// Layout-only roles. Dropped in compact mode when nameless.
pub const STRUCTURAL_ROLES: &[&str] = &[
    "generic",
    "group",
    "list",
    "table",
    "row",
    "rowgroup",
    "grid",
    "treegrid",
    "menu",
    "menubar",
    "toolbar",
    "tablist",
    "tree",
    "directory",
    "document",
    "application",
    "presentation",
    "none",
];

/// Implicit ARIA role of common HTML elements, as CSS.
///
/// Elements with an explicit `role` attribute are matched separately, so
/// these selectors only need to cover the native semantics.
pub const IMPLICIT_ROLE_SELECTORS: &[(&str, &str)] = &[
    (
        "button",
        "button, input[type=button], input[type=submit], input[type=reset], input[type=image], summary",
    ),
    ("link", "a[href], area[href]"),
    (
        "textbox",
        "input:not([type]), input[type=text], input[type=email], input[type=tel], input[type=url], input[type=password], textarea, [contenteditable=true]",
    ),
    ("searchbox", "input[type=search]"),
    ("checkbox", "input[type=checkbox]"),
    ("radio", "input[type=radio]"),
    ("combobox", "select:not([multiple]):not([size])"),
    ("listbox", "select[multiple], select[size], datalist"),
    ("option", "option"),
    ("slider", "input[type=range]"),
    ("spinbutton", "input[type=number]"),
    ("heading", "h1, h2, h3, h4, h5, h6"),
    ("list", "ul, ol, menu"),
    ("listitem", "li"),
    ("navigation", "nav"),
    ("main", "main"),
    ("article", "article"),
    ("region", "section[aria-label], section[aria-labelledby]"),
    ("table", "table"),
    ("row", "tr"),
    ("rowgroup", "thead, tbody, tfoot"),
    ("cell", "td"),
    ("columnheader", "th"),
    ("img", "img[alt]:not([alt=''])"),
    ("group", "fieldset, details, optgroup"),
    ("form", "form[aria-label], form[aria-labelledby]"),
    ("dialog", "dialog"),
    ("progressbar", "progress"),
];

// ============================================================================
// RoleClass
// ============================================================================

/// Classification of a role into the disjoint role tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleClass {
    /// In [`INTERACTIVE_ROLES`].
    Interactive,
    /// In [`CONTENT_ROLES`].
    Content,
    /// In [`STRUCTURAL_ROLES`].
    Structural,
    /// Anything else (`img`, `paragraph`, `text`, ...).
    Other,
}

impl RoleClass {
    /// Classifies a role, ignoring ASCII case.
    #[must_use]
    pub fn of(role: &str) -> Self {
        let contains = |table: &[&str]| table.iter().any(|r| r.eq_ignore_ascii_case(role));

        if contains(INTERACTIVE_ROLES) {
            Self::Interactive
        } else if contains(CONTENT_ROLES) {
            Self::Content
        } else if contains(STRUCTURAL_ROLES) {
            Self::Structural
        } else {
            Self::Other
        }
    }

    /// Returns `true` for interactive roles.
    #[inline]
    #[must_use]
    pub const fn is_interactive(self) -> bool {
        matches!(self, Self::Interactive)
    }
}

/// Returns the implicit-role CSS for `role`, if the table has one.
#[must_use]
pub fn implicit_selector(role: &str) -> Option<&'static str> {
    IMPLICIT_ROLE_SELECTORS
        .iter()
        .find(|(r, _)| r.eq_ignore_ascii_case(role))
        .map(|(_, css)| *css)
}

// ============================================================================
// Tests
// ============================================================================
