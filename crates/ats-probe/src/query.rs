//! Element queries: the locator descriptors handed to the driver.
//!
//! An [`ElementQuery`] is an immutable (kind, selector) pair. It is created by
//! page objects and consumed by the interaction helper; it never owns a live
//! element. The `Display` form doubles as the locator description in log lines.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the selector string is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    /// Element `id` attribute
    Id,
    /// CSS selector
    Css,
    /// XPath expression
    XPath,
}

impl SelectorKind {
    /// Short label used in locator descriptions
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Css => "css",
            Self::XPath => "xpath",
        }
    }
}

/// Opaque element descriptor: selector string plus selector kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementQuery {
    kind: SelectorKind,
    selector: String,
}

impl ElementQuery {
    /// Query by element id
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::Id,
            selector: id.into(),
        }
    }

    /// Query by CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::Css,
            selector: selector.into(),
        }
    }

    /// Query by XPath expression
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::XPath,
            selector: expr.into(),
        }
    }

    /// Selector kind
    #[must_use]
    pub const fn kind(&self) -> SelectorKind {
        self.kind
    }

    /// Raw selector string
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// CSS form of the query, if it has one.
    ///
    /// Ids are rendered as attribute selectors so generated ids such as
    /// `__BVID__31__BV_toggle_` need no escaping.
    #[must_use]
    pub fn to_css(&self) -> Option<String> {
        match self.kind {
            SelectorKind::Id => Some(format!("[id={:?}]", self.selector)),
            SelectorKind::Css => Some(self.selector.clone()),
            SelectorKind::XPath => None,
        }
    }
}

impl fmt::Display for ElementQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "By.{}: {}", self.kind.label(), self.selector)
    }
}

/// Quote a string as an XPath literal, handling embedded quotes.
#[must_use]
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{text}'")
    } else if !text.contains('"') {
        format!("\"{text}\"")
    } else {
        let parts: Vec<String> = text.split('\'').map(|p| format!("'{p}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod construction_tests {
        use super::*;

        #[test]
        fn test_id_query() {
            let q = ElementQuery::id("emailInputOnLoginPage");
            assert_eq!(q.kind(), SelectorKind::Id);
            assert_eq!(q.selector(), "emailInputOnLoginPage");
            assert_eq!(q.to_string(), "By.id: emailInputOnLoginPage");
        }

        #[test]
        fn test_css_query_display() {
            let q = ElementQuery::css("input[placeholder='Hesap ara...']");
            assert_eq!(q.to_string(), "By.css: input[placeholder='Hesap ara...']");
        }

        #[test]
        fn test_xpath_query_has_no_css_form() {
            let q = ElementQuery::xpath("//h1[contains(text(),'Hoş Geldin')]");
            assert!(q.to_css().is_none());
        }
    }

    mod css_tests {
        use super::*;

        #[test]
        fn test_id_css_form_is_attribute_selector() {
            let q = ElementQuery::id("__BVID__31__BV_toggle_");
            assert_eq!(q.to_css().unwrap(), "[id=\"__BVID__31__BV_toggle_\"]");
        }
    }

    mod xpath_literal_tests {
        use super::*;

        #[test]
        fn test_plain_text() {
            assert_eq!(xpath_literal("Parametreler"), "'Parametreler'");
        }

        #[test]
        fn test_single_quote() {
            assert_eq!(xpath_literal("Kullanıcı's"), "\"Kullanıcı's\"");
        }

        #[test]
        fn test_both_quotes() {
            assert_eq!(xpath_literal("a'b\"c"), "concat('a', \"'\", 'b\"c')");
        }
    }
}
