//! Abstract browser-driver capability consumed by the wait and verify layers.
//!
//! The core never depends on a specific automation protocol or process
//! model: anything that can find elements by locator, read their text, and
//! interact with them satisfies [`BrowserDriver`] and is substitutable. The
//! crate ships [`crate::sim::SimBrowser`] as a deterministic in-memory
//! implementation for tests and development.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::locator::Locator;
use crate::result::{EsperarError, EsperarResult};

/// A reference to a located element.
///
/// Handles are bounded by the page's current render: after a navigation the
/// driver bumps its render generation and operations on handles from an
/// earlier generation fail with [`EsperarError::StaleElement`]. Re-acquire
/// through [`BrowserDriver::find_elements`] after navigating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    id: String,
    tag_name: String,
    generation: u64,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>, generation: u64) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
            generation,
        }
    }

    /// Driver-assigned element id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Element tag name
    #[must_use]
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// Render generation this handle was acquired in
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Browser-driver capability.
///
/// All queries observe the live page at the moment of the call; nothing is
/// cached between calls. `find_elements` returns matches in document order
/// and may legitimately return an empty vector (e.g. mid-navigation).
pub trait BrowserDriver {
    /// Find all elements matching the locator, in document order
    fn find_elements(&self, locator: &Locator) -> EsperarResult<Vec<ElementHandle>>;

    /// Read the text content of an element
    fn text(&self, handle: &ElementHandle) -> EsperarResult<String>;

    /// Type text into an element
    fn send_keys(&self, handle: &ElementHandle, text: &str) -> EsperarResult<()>;

    /// Click an element
    fn click(&self, handle: &ElementHandle) -> EsperarResult<()>;

    /// Navigate to a URL
    fn navigate(&self, url: &str) -> EsperarResult<()>;

    /// Terminate the browser. Further calls fail.
    fn quit(&mut self) -> EsperarResult<()>;
}

/// Resolve a locator that must match exactly one element.
///
/// # Errors
///
/// Returns [`EsperarError::MissingElement`] when nothing matches and
/// [`EsperarError::AmbiguousLocator`] when several elements do.
pub fn find_single(
    driver: &dyn BrowserDriver,
    locator: &Locator,
) -> EsperarResult<ElementHandle> {
    let mut matches = driver.find_elements(locator)?;
    if matches.len() > 1 {
        return Err(EsperarError::AmbiguousLocator {
            locator: locator.to_string(),
            count: matches.len(),
        });
    }
    matches.pop().ok_or_else(|| EsperarError::MissingElement {
        locator: locator.to_string(),
    })
}

/// Recognized browser engines.
///
/// An explicit configuration value injected into scenario setup, never read
/// from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BrowserKind {
    /// Chromium-family browser (default)
    #[default]
    Chromium,
    /// Firefox-family browser
    Firefox,
}

impl BrowserKind {
    /// Name of the engine
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Firefox => "firefox",
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
