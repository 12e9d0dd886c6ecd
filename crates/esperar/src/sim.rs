//! Simulated browser driver for deterministic tests.
//!
//! [`SimBrowser`] implements [`BrowserDriver`] over an in-memory page model:
//! pages are registered against URLs, elements can be scheduled to appear
//! only after a delay (to exercise the poll loop), clicks can trigger
//! navigations (to model form submission), and keystrokes are recorded for
//! assertion. Document order is insertion order. Handles are invalidated by
//! navigation exactly as the driver contract requires.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::driver::{BrowserDriver, ElementHandle};
use crate::locator::{Locator, Selector};
use crate::result::{EsperarError, EsperarResult};

/// A single element in a simulated page
#[derive(Debug, Clone)]
pub struct SimElement {
    tag: String,
    id: Option<String>,
    name: Option<String>,
    classes: Vec<String>,
    text: String,
    appears_after: Duration,
}

impl SimElement {
    /// Create an element with the given tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            name: None,
            classes: Vec::new(),
            text: String::new(),
            appears_after: Duration::ZERO,
        }
    }

    /// Set the `id` attribute
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the `name` attribute
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a CSS class
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Set the text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Make the element appear only after a delay from page load
    #[must_use]
    pub const fn appearing_after(mut self, delay: Duration) -> Self {
        self.appears_after = delay;
        self
    }

    fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Id(id) => self.id.as_deref() == Some(id),
            Selector::Name(name) => self.name.as_deref() == Some(name),
            Selector::Css(css) => self.matches_css(css),
            Selector::Text(text) => self.text.contains(text.as_str()),
            // Structural paths are not modeled by the simulator.
            Selector::XPath(_) => false,
        }
    }

    // Supports the selector shapes the scenarios use: "tag", "#id",
    // ".class" and "tag.class".
    fn matches_css(&self, css: &str) -> bool {
        if let Some(id) = css.strip_prefix('#') {
            return self.id.as_deref() == Some(id);
        }
        if let Some(class) = css.strip_prefix('.') {
            return self.classes.iter().any(|c| c == class);
        }
        if let Some((tag, class)) = css.split_once('.') {
            return self.tag == tag && self.classes.iter().any(|c| c == class);
        }
        self.tag == css
    }

    fn key(&self, index: usize) -> String {
        self.id.clone().unwrap_or_else(|| index.to_string())
    }
}

/// A simulated page: elements in document order
#[derive(Debug, Clone, Default)]
pub struct SimPage {
    elements: Vec<SimElement>,
}

impl SimPage {
    /// Create an empty page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element (builder style)
    #[must_use]
    pub fn with_element(mut self, element: SimElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Append an element
    pub fn push(&mut self, element: SimElement) {
        self.elements.push(element);
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the page has no elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[derive(Debug, Default)]
struct SimState {
    routes: HashMap<String, SimPage>,
    transitions: HashMap<String, String>,
    current: Option<SimPage>,
    current_url: Option<String>,
    loaded_at: Option<Instant>,
    generation: u64,
    typed: HashMap<String, String>,
    clicks: Vec<String>,
    quit: bool,
}

fn load(state: &mut SimState, url: &str) -> EsperarResult<()> {
    let page = state
        .routes
        .get(url)
        .cloned()
        .ok_or_else(|| EsperarError::Navigation {
            url: url.to_string(),
            message: "no page registered for this URL".to_string(),
        })?;
    state.current = Some(page);
    state.current_url = Some(url.to_string());
    state.loaded_at = Some(Instant::now());
    state.generation += 1;
    Ok(())
}

/// A deterministic in-memory [`BrowserDriver`].
///
/// Cloning shares the underlying state, so a test can hold one clone to
/// mutate or inspect the page model while the engine under test polls
/// through another.
#[derive(Debug, Clone, Default)]
pub struct SimBrowser {
    state: Arc<Mutex<SimState>>,
}

impl SimBrowser {
    /// Create a browser with no routes
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> EsperarResult<MutexGuard<'_, SimState>> {
        self.state.lock().map_err(|_| EsperarError::Driver {
            message: "page model lock poisoned".to_string(),
        })
    }

    fn locked_live(&self) -> EsperarResult<MutexGuard<'_, SimState>> {
        let state = self.lock()?;
        if state.quit {
            return Err(EsperarError::Driver {
                message: "browser has quit".to_string(),
            });
        }
        Ok(state)
    }

    /// Register a page for a URL
    ///
    /// # Panics
    ///
    /// Panics if the page model lock is poisoned.
    pub fn route(&self, url: impl Into<String>, page: SimPage) {
        let mut state = self.state.lock().expect("page model lock poisoned");
        let _ = state.routes.insert(url.into(), page);
    }

    /// Make clicking the element with the given id navigate to a URL
    ///
    /// # Panics
    ///
    /// Panics if the page model lock is poisoned.
    pub fn on_click_navigate(&self, element_id: impl Into<String>, url: impl Into<String>) {
        let mut state = self.state.lock().expect("page model lock poisoned");
        let _ = state.transitions.insert(element_id.into(), url.into());
    }

    /// Text typed into the element with the given id, if any
    #[must_use]
    pub fn typed_into(&self, element_id: &str) -> Option<String> {
        self.lock().ok()?.typed.get(element_id).cloned()
    }

    /// Whether the element with the given id has been clicked
    #[must_use]
    pub fn clicked(&self, element_id: &str) -> bool {
        self.lock()
            .map(|state| state.clicks.iter().any(|c| c == element_id))
            .unwrap_or(false)
    }

    /// Currently loaded URL
    #[must_use]
    pub fn current_url(&self) -> Option<String> {
        self.lock().ok()?.current_url.clone()
    }

    /// Whether the browser has been quit
    #[must_use]
    pub fn is_quit(&self) -> bool {
        self.lock().map(|state| state.quit).unwrap_or(true)
    }

    fn element_at<'a>(
        state: &'a SimState,
        handle: &ElementHandle,
    ) -> EsperarResult<(&'a SimElement, usize)> {
        if handle.generation() != state.generation {
            return Err(EsperarError::StaleElement {
                id: handle.id().to_string(),
            });
        }
        let index: usize = handle.id().parse().map_err(|_| EsperarError::Driver {
            message: format!("malformed element id {:?}", handle.id()),
        })?;
        let element = state
            .current
            .as_ref()
            .and_then(|page| page.elements.get(index))
            .ok_or_else(|| EsperarError::Driver {
                message: format!("no element at index {index}"),
            })?;
        Ok((element, index))
    }
}

impl BrowserDriver for SimBrowser {
    fn find_elements(&self, locator: &Locator) -> EsperarResult<Vec<ElementHandle>> {
        let state = self.locked_live()?;
        let Some(page) = state.current.as_ref() else {
            // Nothing loaded yet: an empty result, not an error.
            return Ok(Vec::new());
        };
        let since_load = state
            .loaded_at
            .map_or(Duration::ZERO, |loaded| loaded.elapsed());
        Ok(page
            .elements
            .iter()
            .enumerate()
            .filter(|(_, element)| {
                since_load >= element.appears_after && element.matches(locator.selector())
            })
            .map(|(index, element)| {
                ElementHandle::new(index.to_string(), element.tag.clone(), state.generation)
            })
            .collect())
    }

    fn text(&self, handle: &ElementHandle) -> EsperarResult<String> {
        let state = self.locked_live()?;
        let (element, _) = Self::element_at(&state, handle)?;
        Ok(element.text.clone())
    }

    fn send_keys(&self, handle: &ElementHandle, text: &str) -> EsperarResult<()> {
        let mut state = self.locked_live()?;
        let key = {
            let (element, index) = Self::element_at(&state, handle)?;
            element.key(index)
        };
        state.typed.entry(key).or_default().push_str(text);
        Ok(())
    }

    fn click(&self, handle: &ElementHandle) -> EsperarResult<()> {
        let mut state = self.locked_live()?;
        let key = {
            let (element, index) = Self::element_at(&state, handle)?;
            element.key(index)
        };
        state.clicks.push(key.clone());
        if let Some(url) = state.transitions.get(&key).cloned() {
            load(&mut state, &url)?;
        }
        Ok(())
    }

    fn navigate(&self, url: &str) -> EsperarResult<()> {
        let mut state = self.locked_live()?;
        load(&mut state, url)
    }

    fn quit(&mut self) -> EsperarResult<()> {
        let mut state = self.lock()?;
        state.quit = true;
        state.current = None;
        state.current_url = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_browser() -> SimBrowser {
        let browser = SimBrowser::new();
        browser.route(
            "https://app.test/login",
            SimPage::new()
                .with_element(SimElement::new("input").with_id("username").with_name("user"))
                .with_element(SimElement::new("input").with_id("password"))
                .with_element(
                    SimElement::new("button")
                        .with_id("log-in")
                        .with_class("primary")
                        .with_text("Log In"),
                ),
        );
        browser.route(
            "https://app.test/home",
            SimPage::new().with_element(SimElement::new("div").with_id("balance")),
        );
        browser
    }

    mod matching_tests {
        use super::*;

        #[test]
        fn test_css_shapes() {
            let element = SimElement::new("button")
                .with_id("log-in")
                .with_class("primary");
            assert!(element.matches(&Selector::css("button")));
            assert!(element.matches(&Selector::css("#log-in")));
            assert!(element.matches(&Selector::css(".primary")));
            assert!(element.matches(&Selector::css("button.primary")));
            assert!(!element.matches(&Selector::css("input")));
            assert!(!element.matches(&Selector::css(".secondary")));
        }

        #[test]
        fn test_id_name_and_text_selectors() {
            let element = SimElement::new("button")
                .with_id("log-in")
                .with_name("submit")
                .with_text("Log In");
            assert!(element.matches(&Selector::id("log-in")));
            assert!(element.matches(&Selector::name("submit")));
            assert!(element.matches(&Selector::text("Log")));
            assert!(!element.matches(&Selector::text("Sign")));
        }

        #[test]
        fn test_document_order_is_insertion_order() {
            let browser = login_browser();
            browser.navigate("https://app.test/login").unwrap();
            let handles = browser
                .find_elements(&Locator::css("input"))
                .unwrap();
            assert_eq!(handles.len(), 2);
            assert_eq!(handles[0].id(), "0");
            assert_eq!(handles[1].id(), "1");
        }
    }

    mod navigation_tests {
        use super::*;

        #[test]
        fn test_nothing_loaded_finds_nothing() {
            let browser = login_browser();
            let handles = browser.find_elements(&Locator::id("username")).unwrap();
            assert!(handles.is_empty());
        }

        #[test]
        fn test_unregistered_url_fails() {
            let browser = login_browser();
            let err = browser.navigate("https://app.test/missing").unwrap_err();
            assert!(matches!(err, EsperarError::Navigation { .. }));
        }

        #[test]
        fn test_handles_go_stale_after_navigation() {
            let browser = login_browser();
            browser.navigate("https://app.test/login").unwrap();
            let handles = browser.find_elements(&Locator::id("username")).unwrap();
            browser.navigate("https://app.test/home").unwrap();
            let err = browser.text(&handles[0]).unwrap_err();
            assert!(matches!(err, EsperarError::StaleElement { .. }));
        }

        #[test]
        fn test_click_transition_navigates() {
            let browser = login_browser();
            browser.on_click_navigate("log-in", "https://app.test/home");
            browser.navigate("https://app.test/login").unwrap();
            let handles = browser.find_elements(&Locator::id("log-in")).unwrap();
            browser.click(&handles[0]).unwrap();
            assert_eq!(
                browser.current_url().as_deref(),
                Some("https://app.test/home")
            );
            assert!(browser.clicked("log-in"));
        }
    }

    mod interaction_tests {
        use super::*;

        #[test]
        fn test_send_keys_accumulates() {
            let browser = login_browser();
            browser.navigate("https://app.test/login").unwrap();
            let handles = browser.find_elements(&Locator::id("username")).unwrap();
            browser.send_keys(&handles[0], "an").unwrap();
            browser.send_keys(&handles[0], "dy").unwrap();
            assert_eq!(browser.typed_into("username").as_deref(), Some("andy"));
        }

        #[test]
        fn test_delayed_element_is_hidden_then_visible() {
            let browser = SimBrowser::new();
            browser.route(
                "https://app.test/",
                SimPage::new().with_element(
                    SimElement::new("button")
                        .with_id("pay-now")
                        .appearing_after(Duration::from_millis(50)),
                ),
            );
            browser.navigate("https://app.test/").unwrap();
            assert!(browser
                .find_elements(&Locator::id("pay-now"))
                .unwrap()
                .is_empty());
            std::thread::sleep(Duration::from_millis(60));
            assert_eq!(
                browser.find_elements(&Locator::id("pay-now")).unwrap().len(),
                1
            );
        }
    }

    mod quit_tests {
        use super::*;

        #[test]
        fn test_queries_fail_after_quit() {
            let mut browser = login_browser();
            browser.navigate("https://app.test/login").unwrap();
            browser.quit().unwrap();
            assert!(browser.is_quit());
            let err = browser.find_elements(&Locator::id("username")).unwrap_err();
            assert!(matches!(err, EsperarError::Driver { .. }));
        }

        #[test]
        fn test_quit_is_idempotent() {
            let mut browser = login_browser();
            browser.quit().unwrap();
            assert!(browser.quit().is_ok());
        }
    }
}
