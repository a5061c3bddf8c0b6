//! Line scanner for the indented accessibility tree text.
//!
//! Each element line has the shape
//!
//! ```text
//! <2*depth spaces>- <role>["<name>"][ suffix]
//! ```
//!
//! e.g. `    - link "Home" [level=1]:`. Anything else (`- /url: /home`,
//! free text) is a non-element line and is passed through untouched.

use std::sync::LazyLock;

use regex::Regex;

use super::roles::RoleClass;

/// Element line pattern: indent, role, optional quoted name, rest.
static ELEMENT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^( *)-\s+([A-Za-z][\w-]*)(?:\s+"((?:[^"\\]|\\.)*)")?(.*)$"#)
        .expect("element line pattern is valid")
});

/// One line of the raw tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannedLine<'a> {
    /// An element line.
    Element(ParsedLine),
    /// Anything that does not match the element shape.
    Other {
        /// Depth derived from the leading spaces.
        depth: usize,
        /// The line verbatim.
        text: &'a str,
    },
}

impl ScannedLine<'_> {
    /// Depth derived from indentation, for both kinds of line.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Element(parsed) => parsed.depth,
            Self::Other { depth, .. } => *depth,
        }
    }
}

/// A parsed element line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// `leading spaces / 2`, rounded down.
    pub depth: usize,
    /// Role as written.
    pub role: String,
    /// Unescaped accessible name; `None` when absent or empty.
    pub name: Option<String>,
    /// Everything after the role and name, verbatim (attributes, `:`).
    pub suffix: String,
}

impl ParsedLine {
    /// Classifies this line's role.
    #[inline]
    #[must_use]
    pub fn class(&self) -> RoleClass {
        RoleClass::of(&self.role)
    }
}

/// Scans one line.
#[must_use]
pub fn scan_line(line: &str) -> ScannedLine<'_> {
    let Some(caps) = ELEMENT_LINE.captures(line) else {
        return ScannedLine::Other {
            depth: indent_depth(line),
            text: line,
        };
    };

    let indent = caps.get(1).map_or(0, |m| m.as_str().len());
    let role = caps.get(2).map_or("", |m| m.as_str()).to_string();
    let name = caps
        .get(3)
        .map(|m| unescape_name(m.as_str()))
        .filter(|n| !n.is_empty());
    let suffix = caps.get(4).map_or("", |m| m.as_str()).to_string();

    ScannedLine::Element(ParsedLine {
        depth: indent / 2,
        role,
        name,
        suffix,
    })
}

/// Scans a whole tree, one entry per line.
pub fn scan(tree: &str) -> impl Iterator<Item = ScannedLine<'_>> {
    tree.lines().map(scan_line)
}

/// Depth of an arbitrary line from its leading spaces.
#[must_use]
pub fn indent_depth(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ').count() / 2
}

/// Reverses the `\"` and `\\` escapes used inside quoted names.
fn unescape_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Escapes a name for re-emission between double quotes.
#[must_use]
pub fn escape_name(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn element(line: &str) -> ParsedLine {
        match scan_line(line) {
            ScannedLine::Element(parsed) => parsed,
            other => panic!("expected element line, got {other:?}"),
        }
    }

    #[test]
    fn test_role_only() {
        let parsed = element("- navigation");
        assert_eq!(parsed.depth, 0);
        assert_eq!(parsed.role, "navigation");
        assert_eq!(parsed.name, None);
        assert_eq!(parsed.suffix, "");
    }

    #[test]
    fn test_role_name_suffix() {
        let parsed = element("    - heading \"Welcome\" [level=1]");
        assert_eq!(parsed.depth, 2);
        assert_eq!(parsed.role, "heading");
        assert_eq!(parsed.name.as_deref(), Some("Welcome"));
        assert_eq!(parsed.suffix, " [level=1]");
    }

    #[test]
    fn test_trailing_colon_is_suffix() {
        let parsed = element("  - link \"Home\":");
        assert_eq!(parsed.depth, 1);
        assert_eq!(parsed.suffix, ":");
    }

    #[test]
    fn test_escaped_quotes_in_name() {
        let parsed = element(r#"- button "Say \"hi\"""#);
        assert_eq!(parsed.name.as_deref(), Some(r#"Say "hi""#));
        assert_eq!(escape_name(parsed.name.as_deref().unwrap_or_default()), r#"Say \"hi\""#);
    }

    #[test]
    fn test_empty_name_is_none() {
        assert_eq!(element("- button \"\"").name, None);
    }

    #[test]
    fn test_odd_indent_rounds_down() {
        assert_eq!(element("   - button").depth, 1);
    }

    #[test]
    fn test_non_element_lines() {
        assert!(matches!(
            scan_line("    - /url: /home"),
            ScannedLine::Other { depth: 2, .. }
        ));
        assert!(matches!(scan_line("plain text"), ScannedLine::Other { depth: 0, .. }));
        assert!(matches!(scan_line(""), ScannedLine::Other { depth: 0, text: "" }));
    }

    #[test]
    fn test_scan_preserves_line_count() {
        let tree = "- main\n  - button \"A\"\n  - /url: x";
        assert_eq!(scan(tree).count(), 3);
    }
}
