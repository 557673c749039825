//! Browser session capability
//!
//! Scenarios only talk to the browser through [`BrowserSession`]. The real
//! implementation is [`crate::chrome::ChromeSession`]; tests plug in an
//! in-memory application instead.

use async_trait::async_trait;
use std::fmt;
use std::path::Path;

use crate::error::{DriverError, DriverResult};

/// How an element is located on the page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// `name` attribute
    Name(String),
    /// CSS selector
    Css(String),
    /// XPath expression
    XPath(String),
    /// Exact visible text of a link
    LinkText(String),
}

/// A locator lowered to a query language the browser evaluates natively
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn name(value: impl Into<String>) -> Self {
        Locator::Name(value.into())
    }

    pub fn css(value: impl Into<String>) -> Self {
        Locator::Css(value.into())
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Locator::XPath(value.into())
    }

    pub fn link_text(value: impl Into<String>) -> Self {
        Locator::LinkText(value.into())
    }

    pub fn query(&self) -> Query {
        match self {
            Locator::Name(name) => Query::Css(format!("[name=\"{}\"]", css_escape(name))),
            Locator::Css(selector) => Query::Css(selector.clone()),
            Locator::XPath(xpath) => Query::XPath(xpath.clone()),
            Locator::LinkText(text) => Query::XPath(format!(
                "//a[normalize-space(.)={}]",
                xpath_literal(text.trim())
            )),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Name(v) => write!(f, "name={}", v),
            Locator::Css(v) => write!(f, "css={}", v),
            Locator::XPath(v) => write!(f, "xpath={}", v),
            Locator::LinkText(v) => write!(f, "link={}", v),
        }
    }
}

fn css_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Quote a string as an XPath 1.0 literal. XPath has no escape sequences, so a
/// value holding both quote kinds is split into a `concat()`.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value
            .split('\'')
            .map(|part| format!("'{}'", part))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// A live browser session.
///
/// Methods take `&self`; a session is used by one scenario at a time and the
/// implementations serialize access internally.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    type Element: Send + Sync;

    /// Load a URL and wait for the navigation to finish
    async fn navigate(&self, url: &str) -> DriverResult<()>;

    /// All elements matching the locator, in document order. No match is an
    /// empty vector, not an error.
    async fn locate_all(&self, locator: &Locator) -> DriverResult<Vec<Self::Element>>;

    /// First element matching the locator
    async fn locate(&self, locator: &Locator) -> DriverResult<Self::Element> {
        self.locate_all(locator)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::NoSuchElement(locator.to_string()))
    }

    async fn send_keys(&self, element: &Self::Element, text: &str) -> DriverResult<()>;

    /// Empty an input or textarea
    async fn clear(&self, element: &Self::Element) -> DriverResult<()>;

    async fn click(&self, element: &Self::Element) -> DriverResult<()>;

    async fn is_displayed(&self, element: &Self::Element) -> DriverResult<bool>;

    async fn is_enabled(&self, element: &Self::Element) -> DriverResult<bool>;

    /// Accept the open JavaScript dialog. Returns [`DriverError::NoDialog`]
    /// when none is showing.
    async fn accept_dialog(&self) -> DriverResult<()>;

    /// Write a PNG of the current page to `path`
    async fn screenshot(&self, path: &Path) -> DriverResult<()>;

    async fn current_url(&self) -> DriverResult<String>;

    /// Close the browser. Further calls fail.
    async fn quit(&self) -> DriverResult<()>;
}
