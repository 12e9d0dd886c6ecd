//! Locator abstraction: immutable query descriptors for page elements.
//!
//! A [`Locator`] identifies zero or more elements in the current page. It is
//! constructed once, owned by the caller, and never mutated; every use of it
//! is a fresh query against the live page through the browser driver.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy for selecting elements in a rendered page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// Match by `id` attribute
    Id(String),
    /// CSS selector (e.g. `button.primary`)
    Css(String),
    /// Match by `name` attribute
    Name(String),
    /// XPath structural path
    XPath(String),
    /// Match elements whose text contains the given string
    Text(String),
}

impl Selector {
    /// Create an id selector
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a name-attribute selector
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(path: impl Into<String>) -> Self {
        Self::XPath(path.into())
    }

    /// Create a text-content selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id={id}"),
            Self::Css(css) => write!(f, "css={css}"),
            Self::Name(name) => write!(f, "name={name}"),
            Self::XPath(path) => write!(f, "xpath={path}"),
            Self::Text(text) => write!(f, "text={text}"),
        }
    }
}

/// An immutable descriptor identifying zero or more elements.
///
/// Carries a human-readable description used in timeout and verification
/// messages, so failures name the thing that was being looked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    selector: Selector,
    description: String,
}

impl Locator {
    /// Create a locator from a selector, described by the selector itself
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        let description = selector.to_string();
        Self {
            selector,
            description,
        }
    }

    /// Create a locator with a custom description
    #[must_use]
    pub fn described(selector: Selector, description: impl Into<String>) -> Self {
        Self {
            selector,
            description: description.into(),
        }
    }

    /// Shorthand for an id locator
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::new(Selector::id(id))
    }

    /// Shorthand for a CSS locator
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(Selector::css(selector))
    }

    /// Shorthand for a name-attribute locator
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::new(Selector::name(name))
    }

    /// Shorthand for a text-content locator
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Selector::text(text))
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the description
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}
