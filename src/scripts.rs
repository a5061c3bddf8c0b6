//! Page-side JavaScript.
//!
//! Every snippet is an expression for `Runtime.evaluate` with
//! `returnByValue`. Role and name computation lives in one shared prelude so
//! the tree a snapshot prints and the element a ref later resolves to agree
//! on roles, names and ordering.
//!
//! Inputs are spliced in as JSON literals, never as raw text.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use serde::Serialize;

use crate::error::Result;
use crate::selector::ResolvedElement;
use crate::snapshot::roles::{IMPLICIT_ROLE_SELECTORS, INTERACTIVE_ROLES};

// ============================================================================
// Constants
// ============================================================================

/// Bumped whenever a snippet's output shape changes.
pub const SCRIPT_VERSION: u32 = 1;

/// Longest accessible name kept, in characters.
const MAX_NAME_LEN: usize = 100;

/// `document.readyState`.
pub const READY_STATE: &str = "document.readyState";

/// Current URL.
pub const LOCATION_HREF: &str = "location.href";

/// Current title.
pub const DOCUMENT_TITLE: &str = "document.title";

/// Content roles whose name falls back to the element text.
const NAME_FROM_CONTENT: &[&str] = &[
    "heading",
    "cell",
    "gridcell",
    "columnheader",
    "rowheader",
    "listitem",
];

/// Shared helpers: `getRole`, `accessibleName`, `isHidden`, `inHiddenTree`.
static PRELUDE: LazyLock<String> = LazyLock::new(|| {
    let implicit: serde_json::Map<String, serde_json::Value> = IMPLICIT_ROLE_SELECTORS
        .iter()
        .map(|(role, css)| ((*role).to_string(), (*css).into()))
        .collect();
    let order: Vec<&str> = IMPLICIT_ROLE_SELECTORS.iter().map(|(role, _)| *role).collect();
    let from_content: Vec<&str> = INTERACTIVE_ROLES
        .iter()
        .chain(NAME_FROM_CONTENT)
        .copied()
        .collect();

    format!(
        r#"/* cdp-pilot scripts v{version} */
        const IMPLICIT = {implicit};
        const IMPLICIT_ORDER = {order};
        const NAME_FROM_CONTENT = new Set({from_content});
        const SKIP_TAGS = new Set(['script','style','noscript','template','svg','meta','link','head','br','wbr']);
        const MAX_NAME_LEN = {max_name};

        function collapse(text) {{
            return (text || '').replace(/\s+/g, ' ').trim().substring(0, MAX_NAME_LEN);
        }}
        function getRole(el) {{
            const explicit = el.getAttribute('role');
            if (explicit) return explicit.trim().split(/\s+/)[0].toLowerCase();
            for (const role of IMPLICIT_ORDER) {{
                if (el.matches(IMPLICIT[role])) return role;
            }}
            return 'generic';
        }}
        function accessibleName(el, role) {{
            const ariaLabel = el.getAttribute('aria-label');
            if (ariaLabel && ariaLabel.trim()) return collapse(ariaLabel);
            const labelledBy = el.getAttribute('aria-labelledby');
            if (labelledBy) {{
                const text = labelledBy.split(/\s+/)
                    .map(id => document.getElementById(id))
                    .filter(Boolean)
                    .map(n => n.textContent)
                    .join(' ');
                if (collapse(text)) return collapse(text);
            }}
            const placeholder = el.getAttribute('placeholder');
            if (placeholder && placeholder.trim()) return collapse(placeholder);
            if (el.labels && el.labels.length) {{
                const text = collapse(el.labels[0].textContent);
                if (text) return text;
            }}
            if (el.tagName === 'IMG') return collapse(el.getAttribute('alt'));
            if (NAME_FROM_CONTENT.has(role)) {{
                if (el.tagName === 'INPUT') return collapse(el.value);
                return collapse(el.innerText !== undefined ? el.innerText : el.textContent);
            }}
            return collapse(el.getAttribute('title'));
        }}
        function isHidden(el) {{
            if (el.hidden || el.getAttribute('aria-hidden') === 'true') return true;
            if (el.tagName === 'INPUT' && (el.getAttribute('type') || '').toLowerCase() === 'hidden') return true;
            const style = getComputedStyle(el);
            return style.display === 'none' || style.visibility === 'hidden';
        }}
        function inHiddenTree(el) {{
            for (let node = el; node && node.nodeType === 1; node = node.parentElement) {{
                if (SKIP_TAGS.has(node.tagName.toLowerCase()) || isHidden(node)) return true;
            }}
            return false;
        }}
        "#,
        version = SCRIPT_VERSION,
        implicit = serde_json::Value::Object(implicit),
        order = serde_json::json!(order),
        from_content = serde_json::json!(from_content),
        max_name = MAX_NAME_LEN,
    )
});

// ============================================================================
// Accessibility Tree
// ============================================================================

/// Builds the tree extraction expression.
///
/// Evaluates to `{found, tree}`. Each visible element becomes one
/// `- role "name"` line, indented two spaces per level; nameless generic
/// wrappers are flattened into their parent. `found` is `false` when
/// `scope` matches nothing.
///
/// # Errors
///
/// Returns [`Error::Json`](crate::Error::Json) if `scope` cannot be encoded.
pub fn accessibility_tree(scope: Option<&str>) -> Result<String> {
    let scope = serde_json::to_string(&scope)?;

    Ok(format!(
        r#"(() => {{
        {prelude}
        const scope = {scope};
        let root = document.body || document.documentElement;
        if (scope !== null) {{
            try {{ root = document.querySelector(scope); }} catch (e) {{ root = null; }}
            if (!root) return {{ found: false, tree: '' }};
        }}
        const out = [];
        function walk(el, depth) {{
            const tag = el.tagName.toLowerCase();
            if (SKIP_TAGS.has(tag) || isHidden(el)) return;
            const role = getRole(el);
            const name = accessibleName(el, role);
            if (role === 'generic' && !name) {{
                if (el.children.length === 0) {{
                    const text = collapse(el.textContent);
                    if (text) out.push('  '.repeat(depth) + '- text: ' + text);
                }}
                for (const child of el.children) walk(child, depth);
                return;
            }}
            const at = out.length;
            out.push('');
            for (const child of el.children) walk(child, depth + 1);
            let line = '  '.repeat(depth) + '- ' + role;
            if (name) line += ' ' + JSON.stringify(name);
            if (out.length > at + 1) {{
                line += ':';
            }} else if (!NAME_FROM_CONTENT.has(role)) {{
                const text = collapse(el.textContent);
                if (text && text !== name) line += ': ' + text;
            }}
            out[at] = line;
        }}
        if (root) walk(root, 0);
        return {{ found: true, tree: out.join('\n') }};
    }})()"#,
        prelude = PRELUDE.as_str(),
    ))
}

// ============================================================================
// Element Actions
// ============================================================================

/// What to do with a located element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementAction {
    /// Scroll into view and report the centre point `{x, y}`.
    Point,
    /// Focus the element.
    Focus,
    /// Replace the value and fire `input` / `change`.
    Fill {
        /// New value.
        value: String,
    },
    /// Report `innerText`.
    Text,
    /// Report whether the element is rendered with a non-empty box.
    IsVisible,
    /// Scroll the element to the centre of the viewport.
    ScrollIntoView,
}

/// Builds an expression that locates `target` and applies `action`.
///
/// Evaluates to `{found: false}` when nothing matches, otherwise
/// `{found: true, ...}` with the action's output. CSS targets use
/// `querySelector` (a syntax error counts as no match). Role targets match
/// explicit `[role]` plus implicit-role elements, filter by accessible name
/// and pick the `nth` visible one.
///
/// # Errors
///
/// Returns [`Error::Json`](crate::Error::Json) if the inputs cannot be encoded.
pub fn element_action(target: &ResolvedElement, action: &ElementAction) -> Result<String> {
    let target = serde_json::to_string(target)?;
    let action = serde_json::to_string(action)?;

    Ok(format!(
        r#"(() => {{
        {prelude}
        const target = {target};
        const action = {action};
        function locate(t) {{
            if (t.strategy === 'css') {{
                try {{ return document.querySelector(t.selector); }} catch (e) {{ return null; }}
            }}
            const role = t.role.toLowerCase();
            let css = '[role]';
            if (IMPLICIT[role]) css += ', ' + IMPLICIT[role];
            const wanted = t.name == null ? '' : t.name;
            const matches = Array.from(document.querySelectorAll(css)).filter(el =>
                getRole(el) === role && !inHiddenTree(el) && accessibleName(el, role) === wanted);
            return matches[t.nth || 0] || null;
        }}
        const el = locate(target);
        if (!el) return {{ found: false }};
        switch (action.kind) {{
            case 'point': {{
                el.scrollIntoView({{ block: 'center', inline: 'center', behavior: 'instant' }});
                const r = el.getBoundingClientRect();
                return {{ found: true, x: r.left + r.width / 2, y: r.top + r.height / 2 }};
            }}
            case 'focus':
                el.focus();
                return {{ found: true, focused: document.activeElement === el }};
            case 'fill': {{
                el.focus();
                if ('value' in el) {{
                    const proto = Object.getPrototypeOf(el);
                    const setter = Object.getOwnPropertyDescriptor(proto, 'value');
                    if (setter && setter.set) setter.set.call(el, action.value); else el.value = action.value;
                }} else if (el.isContentEditable) {{
                    el.textContent = action.value;
                }} else {{
                    return {{ found: true, filled: false }};
                }}
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return {{ found: true, filled: true }};
            }}
            case 'text':
                return {{ found: true, text: el.innerText !== undefined ? el.innerText : el.textContent }};
            case 'is_visible': {{
                const r = el.getBoundingClientRect();
                return {{ found: true, visible: !inHiddenTree(el) && r.width > 0 && r.height > 0 }};
            }}
            case 'scroll_into_view':
                el.scrollIntoView({{ block: 'center', inline: 'center', behavior: 'instant' }});
                return {{ found: true }};
        }}
        return {{ found: true }};
    }})()"#,
        prelude = PRELUDE.as_str(),
    ))
}

// ============================================================================
// History
// ============================================================================

/// Moves through session history; `-1` is back, `1` is forward.
#[must_use]
pub fn history_go(delta: i32) -> String {
    format!("history.go({delta})")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_embeds_role_tables() {
        assert!(PRELUDE.contains(&format!("scripts v{SCRIPT_VERSION}")));
        assert!(PRELUDE.contains(r#""link":"a[href], area[href]""#));
        assert!(PRELUDE.contains(r#""treeitem""#));
        assert!(PRELUDE.contains(r#""heading""#));
    }

    #[test]
    fn test_tree_script_scope_is_json() {
        let unscoped = accessibility_tree(None).expect("script");
        assert!(unscoped.contains("const scope = null;"));

        let scoped = accessibility_tree(Some("main[data-x=\"1\"]")).expect("script");
        assert!(scoped.contains(r#"const scope = "main[data-x=\"1\"]";"#));
    }

    #[test]
    fn test_action_inputs_are_escaped() {
        let target = ResolvedElement::css("input[name='q']");
        let action = ElementAction::Fill {
            value: "a\"b</script>".into(),
        };
        let script = element_action(&target, &action).expect("script");

        assert!(script.contains(r#"const target = {"strategy":"css","selector":"input[name='q']"};"#));
        assert!(script.contains(r#"const action = {"kind":"fill","value":"a\"b</script>"};"#));
    }

    #[test]
    fn test_role_target_encoding() {
        let target = ResolvedElement::role("button", Some("Save".into()), Some(2));
        let script = element_action(&target, &ElementAction::Point).expect("script");

        assert!(script.contains(r#"{"strategy":"role","role":"button","name":"Save","nth":2}"#));
        assert!(script.contains(r#"const action = {"kind":"point"};"#));
    }

    #[test]
    fn test_action_kinds() {
        let kind = |a: ElementAction| serde_json::to_value(a).expect("serialize")["kind"].clone();
        assert_eq!(kind(ElementAction::IsVisible), "is_visible");
        assert_eq!(kind(ElementAction::ScrollIntoView), "scroll_into_view");
        assert_eq!(kind(ElementAction::Text), "text");
    }

    #[test]
    fn test_history() {
        assert_eq!(history_go(-1), "history.go(-1)");
    }
}
