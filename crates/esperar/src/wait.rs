//! Polling explicit waits.
//!
//! Bridges synchronous assertions to an asynchronously-rendering page:
//! instead of fixed sleeps, a [`Waiter`] repeatedly evaluates a
//! [`WaitCondition`] against the live page at a bounded interval until it
//! holds or the timeout elapses. Worst-case wait time is bounded; a page
//! that renders early is observed early.

use std::time::{Duration, Instant};

use crate::driver::BrowserDriver;
use crate::locator::Locator;
use crate::result::{EsperarError, EsperarResult};

/// Default timeout for wait operations (15 seconds)
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Options for wait operations
#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    /// Total time budget
    pub timeout: Duration,
    /// Delay between successive condition evaluations
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_WAIT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// A predicate over the current page state.
///
/// Stateless: every call to [`WaitCondition::evaluate`] is a fresh query
/// against the driver, never a cached observation from an earlier poll.
/// `Ok(false)` means "not yet" and is retried; a driver error aborts the
/// wait and is propagated.
pub trait WaitCondition {
    /// Evaluate the condition against the live page
    fn evaluate(&self, driver: &dyn BrowserDriver) -> EsperarResult<bool>;

    /// Description used in timeout errors
    fn description(&self) -> String;
}

/// A function-based wait condition
pub struct FnCondition<F>
where
    F: Fn(&dyn BrowserDriver) -> EsperarResult<bool>,
{
    func: F,
    description: String,
}

impl<F> std::fmt::Debug for FnCondition<F>
where
    F: Fn(&dyn BrowserDriver) -> EsperarResult<bool>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCondition")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<F> FnCondition<F>
where
    F: Fn(&dyn BrowserDriver) -> EsperarResult<bool>,
{
    /// Create a new function condition
    pub fn new(func: F, description: impl Into<String>) -> Self {
        Self {
            func,
            description: description.into(),
        }
    }
}

impl<F> WaitCondition for FnCondition<F>
where
    F: Fn(&dyn BrowserDriver) -> EsperarResult<bool>,
{
    fn evaluate(&self, driver: &dyn BrowserDriver) -> EsperarResult<bool> {
        (self.func)(driver)
    }

    fn description(&self) -> String {
        self.description.clone()
    }
}

/// Built-in condition: at least one element matches the locator
#[derive(Debug, Clone)]
pub struct Appearance {
    locator: Locator,
}

impl Appearance {
    /// Condition that the locator matches at least one element
    #[must_use]
    pub fn of(locator: Locator) -> Self {
        Self { locator }
    }
}

impl WaitCondition for Appearance {
    fn evaluate(&self, driver: &dyn BrowserDriver) -> EsperarResult<bool> {
        Ok(!driver.find_elements(&self.locator)?.is_empty())
    }

    fn description(&self) -> String {
        format!("at least one element matching {}", self.locator)
    }
}

/// Built-in condition: no element matches the locator
#[derive(Debug, Clone)]
pub struct Absence {
    locator: Locator,
}

impl Absence {
    /// Condition that the locator matches nothing
    #[must_use]
    pub fn of(locator: Locator) -> Self {
        Self { locator }
    }
}

impl WaitCondition for Absence {
    fn evaluate(&self, driver: &dyn BrowserDriver) -> EsperarResult<bool> {
        Ok(driver.find_elements(&self.locator)?.is_empty())
    }

    fn description(&self) -> String {
        format!("no element matching {}", self.locator)
    }
}

/// Outcome of a successful wait
#[derive(Debug, Clone)]
pub struct WaitOutcome {
    /// Time spent until the condition held
    pub elapsed: Duration,
    /// Number of condition evaluations
    pub polls: u32,
    /// Description of what was waited for
    pub waited_for: String,
}

/// Polls a condition against the live page until it holds or a timeout
/// elapses.
///
/// The calling thread blocks cooperatively between polls. A condition that
/// already holds on the first evaluation returns immediately with no sleep.
#[derive(Debug, Clone, Default)]
pub struct Waiter {
    options: WaitOptions,
}

impl Waiter {
    /// Create a waiter with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a waiter with custom options
    #[must_use]
    pub const fn with_options(options: WaitOptions) -> Self {
        Self { options }
    }

    /// Get the wait options
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Poll the condition until it holds or the timeout elapses.
    ///
    /// The final sleep is clamped to the remaining budget, so on timeout the
    /// elapsed time overshoots the budget by at most one poll interval.
    ///
    /// # Errors
    ///
    /// [`EsperarError::ConditionTimeout`] when the budget elapses first;
    /// driver errors from condition evaluation are propagated as-is.
    pub fn wait_until(
        &self,
        driver: &dyn BrowserDriver,
        condition: &dyn WaitCondition,
    ) -> EsperarResult<WaitOutcome> {
        let start = Instant::now();
        let mut polls: u32 = 0;
        loop {
            polls += 1;
            if condition.evaluate(driver)? {
                let elapsed = start.elapsed();
                tracing::debug!(
                    condition = %condition.description(),
                    ?elapsed,
                    polls,
                    "condition satisfied"
                );
                return Ok(WaitOutcome {
                    elapsed,
                    polls,
                    waited_for: condition.description(),
                });
            }
            let elapsed = start.elapsed();
            if elapsed >= self.options.timeout {
                return Err(EsperarError::ConditionTimeout {
                    elapsed,
                    condition: condition.description(),
                });
            }
            let remaining = self.options.timeout - elapsed;
            std::thread::sleep(self.options.poll_interval.min(remaining));
        }
    }

    /// Wait until at least one element matches the locator.
    ///
    /// # Errors
    ///
    /// [`EsperarError::ConditionTimeout`] naming the locator when nothing
    /// appears within budget.
    pub fn wait_for_presence(
        &self,
        driver: &dyn BrowserDriver,
        locator: &Locator,
    ) -> EsperarResult<WaitOutcome> {
        self.wait_until(driver, &Appearance::of(locator.clone()))
    }

    /// Wait until no element matches the locator (spinners, overlays).
    ///
    /// # Errors
    ///
    /// [`EsperarError::ConditionTimeout`] when matches remain within budget.
    pub fn wait_for_absence(
        &self,
        driver: &dyn BrowserDriver,
        locator: &Locator,
    ) -> EsperarResult<WaitOutcome> {
        self.wait_until(driver, &Absence::of(locator.clone()))
    }
}
