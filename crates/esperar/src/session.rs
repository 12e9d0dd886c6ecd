//! Scoped browser session.
//!
//! A [`Session`] is an explicitly passed handle around a driver, never a
//! process-wide singleton: acquired at scenario start, released on every
//! exit path. [`Session::close`] quits the browser eagerly; `Drop` quits it
//! as a backstop, so an assertion failure that unwinds past the scenario
//! still terminates the browser process.

use uuid::Uuid;

use crate::driver::{find_single, BrowserDriver};
use crate::locator::Locator;
use crate::result::EsperarResult;
use crate::verify::Verifier;
use crate::wait::Waiter;

/// An owned, scoped browser session
pub struct Session<D: BrowserDriver> {
    id: Uuid,
    driver: D,
    waiter: Waiter,
    open: bool,
}

impl<D: BrowserDriver> std::fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("open", &self.open)
            .finish_non_exhaustive()
    }
}

impl<D: BrowserDriver> Session<D> {
    /// Take ownership of a driver and start a session
    #[must_use]
    pub fn start(driver: D, waiter: Waiter) -> Self {
        let id = Uuid::new_v4();
        tracing::info!(session = %id, "session started");
        Self {
            id,
            driver,
            waiter,
            open: true,
        }
    }

    /// Session identifier (appears in logs)
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Borrow the underlying driver
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Borrow the session's waiter
    #[must_use]
    pub const fn waiter(&self) -> &Waiter {
        &self.waiter
    }

    /// Navigate to a URL
    ///
    /// # Errors
    ///
    /// Propagates driver navigation errors.
    pub fn navigate(&self, url: &str) -> EsperarResult<()> {
        tracing::info!(session = %self.id, url, "navigating");
        self.driver.navigate(url)
    }

    /// Wait for the locator's single element, then type into it
    ///
    /// # Errors
    ///
    /// Times out if the element never appears; fails if the locator is
    /// ambiguous or the driver rejects the keystrokes.
    pub fn type_into(&self, locator: &Locator, text: &str) -> EsperarResult<()> {
        let handle = self.resolve(locator)?;
        self.driver.send_keys(&handle, text)
    }

    /// Wait for the locator's single element, then click it
    ///
    /// # Errors
    ///
    /// Times out if the element never appears; fails if the locator is
    /// ambiguous or the driver rejects the click.
    pub fn click(&self, locator: &Locator) -> EsperarResult<()> {
        let handle = self.resolve(locator)?;
        self.driver.click(&handle)
    }

    /// A verifier over this session's driver and waiter
    #[must_use]
    pub fn verifier(&self) -> Verifier<'_> {
        Verifier::with_waiter(&self.driver, self.waiter.clone())
    }

    /// Quit the browser and consume the session
    ///
    /// # Errors
    ///
    /// Propagates driver quit errors; the session is considered released
    /// either way.
    pub fn close(mut self) -> EsperarResult<()> {
        self.open = false;
        let result = self.driver.quit();
        tracing::info!(session = %self.id, "session closed");
        result
    }

    fn resolve(&self, locator: &Locator) -> EsperarResult<crate::driver::ElementHandle> {
        self.waiter.wait_for_presence(&self.driver, locator)?;
        find_single(&self.driver, locator)
    }
}

impl<D: BrowserDriver> Drop for Session<D> {
    fn drop(&mut self) {
        if self.open {
            if let Err(err) = self.driver.quit() {
                tracing::warn!(session = %self.id, %err, "driver quit failed during drop");
            }
        }
    }
}
