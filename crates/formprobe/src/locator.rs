//! Selector abstraction for element lookup.
//!
//! A [`Selector`] names one candidate way of finding an element. It compiles
//! to a JavaScript expression that evaluates to the element (or `null`) in
//! page context, so every driver resolves selectors the same way.
//!
//! `Display` renders the Playwright-style spelling (`text=Male`,
//! `.option:has-text("NCR")`), which is also what diagnostics and the mock
//! driver key on.

use serde::{Deserialize, Serialize};

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g., "#firstName")
    Css(String),
    /// Innermost element whose text contains the string
    Text(String),
    /// CSS selector filtered by contained text
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
    /// CSS selector filtered by exact (trimmed) text
    CssWithExactText {
        /// Base CSS selector
        css: String,
        /// Exact text content
        text: String,
    },
    /// Element matching `css` inside, or controlled by, a label with the text
    InLabel {
        /// Label text to match
        text: String,
        /// CSS selector for the labelled element
        css: String,
    },
}

/// Encode a string as a JavaScript string literal
pub(crate) fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_owned()).to_string()
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a CSS selector filtered by contained text
    #[must_use]
    pub fn css_with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::CssWithText {
            css: css.into(),
            text: text.into(),
        }
    }

    /// Create a CSS selector filtered by exact text
    #[must_use]
    pub fn css_exact_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::CssWithExactText {
            css: css.into(),
            text: text.into(),
        }
    }

    /// Create a labelled-element selector
    #[must_use]
    pub fn in_label(text: impl Into<String>, css: impl Into<String>) -> Self {
        Self::InLabel {
            text: text.into(),
            css: css.into(),
        }
    }

    /// Convert to a JavaScript expression yielding the element or `null`
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            Self::Css(s) => format!("document.querySelector({})", js_str(s)),
            Self::Text(t) => {
                let t = js_str(t);
                format!(
                    "(Array.from(document.querySelectorAll('body *')).find(el => \
                     el.textContent.includes({t}) && \
                     !Array.from(el.children).some(c => c.textContent.includes({t}))) ?? null)"
                )
            }
            Self::CssWithText { css, text } => format!(
                "(Array.from(document.querySelectorAll({})).find(el => el.textContent.includes({})) ?? null)",
                js_str(css),
                js_str(text)
            ),
            Self::CssWithExactText { css, text } => format!(
                "(Array.from(document.querySelectorAll({})).find(el => el.textContent.trim() === {}) ?? null)",
                js_str(css),
                js_str(text)
            ),
            Self::InLabel { text, css } => {
                let css = js_str(css);
                format!(
                    "(Array.from(document.querySelectorAll('label')).filter(l => l.textContent.includes({})) \
                     .map(l => l.querySelector({css}) ?? (l.control && l.control.matches({css}) ? l.control : null)) \
                     .find(el => el) ?? null)",
                    js_str(text)
                )
            }
        }
    }

    /// Convert to a script returning the element's observable state, or `null`
    /// when the element is not attached.
    #[must_use]
    pub fn to_state_query(&self) -> String {
        format!(
            "(() => {{ \
               const el = {}; \
               if (!el) return null; \
               const r = el.getBoundingClientRect(); \
               const s = window.getComputedStyle(el); \
               return {{ \
                 visible: s.visibility !== 'hidden' && s.display !== 'none' && r.width > 0 && r.height > 0, \
                 enabled: !el.disabled, \
                 boundingBox: {{ x: r.x, y: r.y, width: r.width, height: r.height }}, \
                 text: (el.textContent || '').trim(), \
                 value: ('value' in el) ? String(el.value) : null, \
                 fileCount: el.files ? el.files.length : 0, \
                 optionCount: el.querySelectorAll ? el.querySelectorAll('option').length : 0 \
               }}; \
             }})()",
            self.to_query()
        )
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(s) => write!(f, "{s}"),
            Self::Text(t) => write!(f, "text={t}"),
            Self::CssWithText { css, text } => write!(f, "{css}:has-text(\"{text}\")"),
            Self::CssWithExactText { css, text } => write!(f, "{css}:text(\"{text}\")"),
            Self::InLabel { text, css } => write!(f, "label:has-text(\"{text}\") {css}"),
        }
    }
}

impl From<&str> for Selector {
    fn from(css: &str) -> Self {
        Self::Css(css.to_string())
    }
}

/// A point in 2D space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

/// Bounding box for an element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f64,
    /// Y position
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the center point
    #[must_use]
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    /// Whether the box covers a non-zero area
    #[must_use]
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod selector_tests {
        use super::*;

        #[test]
        fn test_css_selector_query() {
            let query = Selector::css("#firstName").to_query();
            assert_eq!(query, "document.querySelector(\"#firstName\")");
        }

        #[test]
        fn test_attribute_quotes_are_escaped() {
            let query = Selector::css("input[value=\"Male\"]").to_query();
            assert!(query.contains(r#"input[value=\"Male\"]"#));
        }

        #[test]
        fn test_text_selector_prefers_innermost() {
            let query = Selector::text("Sports").to_query();
            assert!(query.contains("textContent.includes(\"Sports\")"));
            assert!(query.contains("el.children"));
        }

        #[test]
        fn test_exact_text_selector_trims() {
            let query = Selector::css_exact_text(".react-datepicker__day", "20").to_query();
            assert!(query.contains("textContent.trim() === \"20\""));
        }

        #[test]
        fn test_in_label_falls_back_to_control() {
            let query = Selector::in_label("Male", "input[type=\"radio\"]").to_query();
            assert!(query.contains("l.control"));
            assert!(query.contains("querySelectorAll('label')"));
        }

        #[test]
        fn test_state_query_wraps_element_query() {
            let sel = Selector::css("#uploadPicture");
            let script = sel.to_state_query();
            assert!(script.contains(&sel.to_query()));
            assert!(script.contains("fileCount"));
            assert!(script.contains("boundingBox"));
            assert!(script.contains("return null"));
        }

        #[test]
        fn test_display_uses_playwright_spelling() {
            assert_eq!(Selector::css("#state").to_string(), "#state");
            assert_eq!(Selector::text("NCR").to_string(), "text=NCR");
            assert_eq!(
                Selector::css_with_text(".opt", "Delhi").to_string(),
                ".opt:has-text(\"Delhi\")"
            );
            assert_eq!(
                Selector::css_exact_text(".day", "5").to_string(),
                ".day:text(\"5\")"
            );
            assert_eq!(
                Selector::in_label("Other", "input").to_string(),
                "label:has-text(\"Other\") input"
            );
        }
    }

    mod bounding_box_tests {
        use super::*;

        #[test]
        fn test_center() {
            let bbox = BoundingBox::new(10.0, 20.0, 100.0, 50.0);
            assert_eq!(bbox.center(), Point { x: 60.0, y: 45.0 });
        }

        #[test]
        fn test_has_area() {
            assert!(BoundingBox::new(0.0, 0.0, 1.0, 1.0).has_area());
            assert!(!BoundingBox::new(5.0, 5.0, 0.0, 10.0).has_area());
        }
    }
}
