//! Element locators evaluated inside the page.
//!
//! A [`Locator`] is a CSS selector refined step by step: optionally resolved
//! inside another locator's element, filtered to rendered elements, filtered
//! by normalized text, indexed, and finally re-targeted through an ancestor.
//! Every driver resolves the same description, so workflow code never deals
//! with raw JavaScript.

use std::fmt;

use serde_json::{Value, json};

/// How a [`TextFilter`] compares rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    /// Whole string, case-sensitive.
    Exact,
    /// Whole string, case-insensitive.
    IgnoreCase,
    /// Substring, case-sensitive.
    Contains,
}

impl TextMatch {
    fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::IgnoreCase => "ignore_case",
            Self::Contains => "contains",
        }
    }
}

/// Text predicate applied to an element's rendered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFilter {
    pub value: String,
    pub mode: TextMatch,
}

impl TextFilter {
    /// Compare after normalizing both sides with [`normalize_text`].
    pub fn matches(&self, rendered: &str) -> bool {
        let text = normalize_text(rendered);
        let wanted = normalize_text(&self.value);
        match self.mode {
            TextMatch::Exact => text == wanted,
            TextMatch::IgnoreCase => text.to_lowercase() == wanted.to_lowercase(),
            TextMatch::Contains => text.contains(&wanted),
        }
    }
}

/// Trim and collapse every whitespace run to a single space.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Re-target a matched element: `closest(ancestor)` then
/// `querySelector(descendant)` from there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Climb {
    pub ancestor: String,
    pub descendant: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    selector: String,
    scope: Option<Box<Locator>>,
    visible_only: bool,
    text: Option<TextFilter>,
    nth: usize,
    climb: Option<Climb>,
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            scope: None,
            visible_only: false,
            text: None,
            nth: 0,
            climb: None,
        }
    }

    /// Resolve inside the element `scope` resolves to.
    pub fn within(mut self, scope: Locator) -> Self {
        self.scope = Some(Box::new(scope));
        self
    }

    /// Keep only rendered elements (non-empty box, not hidden).
    pub fn visible(mut self) -> Self {
        self.visible_only = true;
        self
    }

    pub fn with_exact_text(self, text: impl Into<String>) -> Self {
        self.with_text(text, TextMatch::Exact)
    }

    pub fn with_text_ignore_case(self, text: impl Into<String>) -> Self {
        self.with_text(text, TextMatch::IgnoreCase)
    }

    pub fn containing_text(self, text: impl Into<String>) -> Self {
        self.with_text(text, TextMatch::Contains)
    }

    pub fn with_text(mut self, text: impl Into<String>, mode: TextMatch) -> Self {
        self.text = Some(TextFilter {
            value: text.into(),
            mode,
        });
        self
    }

    /// Zero-based index among the filtered matches.
    pub fn nth(mut self, index: usize) -> Self {
        self.nth = index;
        self
    }

    pub fn climb(mut self, ancestor: impl Into<String>, descendant: impl Into<String>) -> Self {
        self.climb = Some(Climb {
            ancestor: ancestor.into(),
            descendant: descendant.into(),
        });
        self
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn scope(&self) -> Option<&Locator> {
        self.scope.as_deref()
    }

    pub fn is_visible_only(&self) -> bool {
        self.visible_only
    }

    pub fn text_filter(&self) -> Option<&TextFilter> {
        self.text.as_ref()
    }

    pub fn index(&self) -> usize {
        self.nth
    }

    pub fn climb_target(&self) -> Option<&Climb> {
        self.climb.as_ref()
    }

    /// Script that binds the resolved element (or `null`) to `el`, then runs
    /// `body`, which must `return` a value.
    pub fn element_script(&self, body: &str) -> String {
        format!(
            "(() => {{ {PRELUDE} const el = {}; {body} }})()",
            self.element_expr()
        )
    }

    /// Script that binds every filtered match (before indexing) to `els`.
    pub fn elements_script(&self, body: &str) -> String {
        format!(
            "(() => {{ {PRELUDE} const els = {}; {body} }})()",
            self.elements_expr()
        )
    }

    fn elements_expr(&self) -> String {
        let root = self
            .scope
            .as_ref()
            .map_or_else(|| "document".to_string(), |scope| scope.element_expr());
        let filter = self.text.as_ref().map_or(Value::Null, |filter| {
            json!({ "value": filter.value, "mode": filter.mode.as_str() })
        });
        format!(
            "__tsAll({root}, {}, {}, {filter})",
            Value::from(self.selector.as_str()),
            self.visible_only
        )
    }

    fn element_expr(&self) -> String {
        let climb = self.climb.as_ref().map_or(Value::Null, |climb| {
            json!({ "ancestor": climb.ancestor, "descendant": climb.descendant })
        });
        format!("__tsPick({}, {}, {climb})", self.elements_expr(), self.nth)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scope) = &self.scope {
            write!(f, "{scope} >> ")?;
        }
        f.write_str(&self.selector)?;
        if self.visible_only {
            f.write_str(" >> visible")?;
        }
        if let Some(filter) = &self.text {
            match filter.mode {
                TextMatch::Exact => write!(f, " >> text={:?}", filter.value)?,
                TextMatch::IgnoreCase => write!(f, " >> text=/{}/i", filter.value)?,
                TextMatch::Contains => write!(f, " >> has-text={:?}", filter.value)?,
            }
        }
        if self.nth > 0 {
            write!(f, " >> nth={}", self.nth)?;
        }
        if let Some(climb) = &self.climb {
            write!(f, " >> closest({}) {}", climb.ancestor, climb.descendant)?;
        }
        Ok(())
    }
}

const PRELUDE: &str = r#"
const __tsNorm = (s) => (s || '').replace(/\s+/g, ' ').trim();
const __tsVisible = (el) => {
  const r = el.getBoundingClientRect();
  const st = window.getComputedStyle(el);
  return r.width > 0 && r.height > 0 && st.visibility !== 'hidden' && st.display !== 'none';
};
const __tsMatch = (text, filter) => {
  const t = __tsNorm(text);
  const w = __tsNorm(filter.value);
  if (filter.mode === 'exact') return t === w;
  if (filter.mode === 'ignore_case') return t.toLowerCase() === w.toLowerCase();
  return t.includes(w);
};
const __tsAll = (root, css, visible, filter) => {
  if (!root) return [];
  let els = Array.from(root.querySelectorAll(css));
  if (visible) els = els.filter(__tsVisible);
  if (filter) {
    els = els.filter((el) => __tsMatch(el.textContent, filter));
    els = els.filter((el) => !els.some((other) => other !== el && el.contains(other)));
  }
  return els;
};
const __tsPick = (els, nth, climb) => {
  let el = els[nth] || null;
  if (el && climb) {
    const anchor = el.closest(climb.ancestor);
    el = anchor ? anchor.querySelector(climb.descendant) : null;
  }
  return el;
};
"#;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_whitespace() {
        assert_eq!(normalize_text("  Trouble \n Ticket\tMonitoring "), "Trouble Ticket Monitoring");
        assert_eq!(normalize_text(" \n "), "");
    }

    #[test]
    fn exact_match_is_case_sensitive_whole_string() {
        let filter = Locator::css("div").with_exact_text("Complaint");
        let filter = filter.text_filter().unwrap();
        assert!(filter.matches(" Complaint "));
        assert!(!filter.matches("complaint"));
        assert!(!filter.matches("Complaint Escalation"));
    }

    #[test]
    fn ignore_case_match_is_whole_string() {
        let filter = TextFilter {
            value: "Radio".into(),
            mode: TextMatch::IgnoreCase,
        };
        assert!(filter.matches("RADIO"));
        assert!(filter.matches(" radio\n"));
        assert!(!filter.matches("Radio Access"));
    }

    #[test]
    fn contains_match() {
        let filter = TextFilter {
            value: "select a job".into(),
            mode: TextMatch::Contains,
        };
        assert!(filter.matches("Please select   a job to log in"));
        assert!(!filter.matches("Please Select a Job"));
    }

    #[test]
    fn display_reads_like_a_selector_chain() {
        let locator = Locator::css("td")
            .within(Locator::css(".ant-picker-dropdown").visible())
            .with_exact_text("OK")
            .nth(1);
        assert_eq!(
            locator.to_string(),
            r#".ant-picker-dropdown >> visible >> td >> text="OK" >> nth=1"#
        );

        let climbed = Locator::css("#ticket_type").climb("div.ant-select", "div.ant-select-selector");
        assert_eq!(
            climbed.to_string(),
            "#ticket_type >> closest(div.ant-select) div.ant-select-selector"
        );
    }

    #[test]
    fn scripts_embed_escaped_arguments() {
        let script = Locator::css(r#"input[placeholder="User ID"]"#)
            .with_exact_text("a \"quoted\" value")
            .element_script("return el !== null;");
        assert!(script.contains(r#"__tsAll(document, "input[placeholder=\"User ID\"]", false"#));
        assert!(script.contains(r#""value":"a \"quoted\" value""#));
        assert!(script.contains(r#""mode":"exact""#));
        assert!(script.trim_end().ends_with("return el !== null; })()"));
    }

    #[test]
    fn scoped_script_resolves_scope_first() {
        let script = Locator::css(".ant-picker-year-btn")
            .within(Locator::css(".ant-picker-dropdown").visible())
            .elements_script("return els.length;");
        assert!(script.contains(r#"__tsAll(__tsPick(__tsAll(document, ".ant-picker-dropdown", true, null), 0, null), ".ant-picker-year-btn", false, null)"#));
    }

    #[test]
    fn climb_is_rendered_into_pick() {
        let script = Locator::css("#tt")
            .climb("div.ant-select", "div.ant-select-selector")
            .element_script("return 1;");
        assert!(script.contains(r#"{"ancestor":"div.ant-select","descendant":"div.ant-select-selector"}"#));
    }
}
