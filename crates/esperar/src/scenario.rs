//! Login scenario: configuration, page objects, and the end-to-end glue.
//!
//! The scenario loads the login page, submits credentials, waits for the
//! post-login page to render, and runs its [`VerificationSpec`]. The
//! browser session is released on every exit path, including verification
//! failure.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::driver::{BrowserDriver, BrowserKind};
use crate::locator::Locator;
use crate::result::EsperarResult;
use crate::session::Session;
use crate::verify::{VerificationReport, VerificationSpec};
use crate::wait::Waiter;

/// Menu items expected on the post-login page, in document order
pub const MENU_ITEMS: [&str; 6] = [
    "card types",
    "credit cards",
    "debit cards",
    "lending",
    "loans",
    "mortgages",
];

/// Allowed transaction status values; proportions are data-dependent
pub const STATUS_VALUES: [&str; 3] = ["complete", "pending", "declined"];

/// Full-text pattern for the branch-closing countdown, a repeating
/// `<number><unit>` group
pub const COUNTDOWN_PATTERN: &str = r"Your nearest branch closes in:( \d+[hms])+";

/// Login credentials. The password is redacted from `Debug` output.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Account username
    pub username: String,
    /// Account password
    pub password: String,
}

impl Credentials {
    /// Create credentials
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Scenario configuration: explicit values injected at setup, never read
/// from the environment
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Login page URL
    pub base_url: String,
    /// Optional visual-variant URL of the same page
    pub alternate_url: Option<String>,
    /// Which browser engine to drive
    pub browser: BrowserKind,
    /// Credentials to submit
    pub credentials: Credentials,
}

impl ScenarioConfig {
    /// Create a configuration with the default browser and no alternate URL
    #[must_use]
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            base_url: base_url.into(),
            alternate_url: None,
            browser: BrowserKind::default(),
            credentials,
        }
    }

    /// Set the alternate URL variant
    #[must_use]
    pub fn with_alternate_url(mut self, url: impl Into<String>) -> Self {
        self.alternate_url = Some(url.into());
        self
    }

    /// Select the browser engine
    #[must_use]
    pub const fn with_browser(mut self, browser: BrowserKind) -> Self {
        self.browser = browser;
        self
    }

    /// URL to load: the alternate variant when requested and configured,
    /// the base URL otherwise
    #[must_use]
    pub fn target_url(&self, use_alternate: bool) -> &str {
        if use_alternate {
            if let Some(ref url) = self.alternate_url {
                return url;
            }
        }
        &self.base_url
    }
}

/// Locators for the login form
#[derive(Debug, Clone)]
pub struct LoginPage {
    /// Username input
    pub username: Locator,
    /// Password input
    pub password: Locator,
    /// Submit button
    pub submit: Locator,
}

impl Default for LoginPage {
    fn default() -> Self {
        Self {
            username: Locator::id("username"),
            password: Locator::id("password"),
            submit: Locator::id("log-in"),
        }
    }
}

impl LoginPage {
    /// Create the login page object with its stable locators
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Type the credentials and submit the form
    ///
    /// # Errors
    ///
    /// Times out if a form element never appears; propagates driver errors.
    pub fn log_in<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        credentials: &Credentials,
    ) -> EsperarResult<()> {
        session.type_into(&self.username, &credentials.username)?;
        session.type_into(&self.password, &credentials.password)?;
        session.click(&self.submit)
    }
}

/// Locators and expected shape of the post-login page
#[derive(Debug, Clone)]
pub struct MainPage {
    /// Navigation bar
    pub nav_bar: Locator,
    /// Logged-in user's avatar
    pub user_avatar: Locator,
    /// Account balance summary
    pub balance_summary: Locator,
    /// Recent transactions table
    pub transactions: Locator,
    /// Search box
    pub search: Locator,
    /// Pay Now action
    pub pay_now: Locator,
    /// Left-hand menu entries
    pub menu_items: Locator,
    /// Transaction status badges
    pub status_pills: Locator,
    /// Branch-closing countdown text
    pub branch_countdown: Locator,
}

impl Default for MainPage {
    fn default() -> Self {
        Self {
            nav_bar: Locator::css(".nav-bar"),
            user_avatar: Locator::id("user-avatar"),
            balance_summary: Locator::id("balance-summary"),
            transactions: Locator::id("transactions"),
            search: Locator::id("search"),
            pay_now: Locator::id("pay-now"),
            menu_items: Locator::css(".menu-item"),
            status_pills: Locator::css(".status-pill"),
            branch_countdown: Locator::id("time-to-close"),
        }
    }
}

impl MainPage {
    /// Create the main page object with its stable locators
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The complete expected shape of the page: nine present elements, the
    /// menu in exact order, statuses within the allowed set, and a
    /// well-formed countdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the countdown pattern fails to compile.
    pub fn verification_spec(&self) -> EsperarResult<VerificationSpec> {
        let countdown = Regex::new(COUNTDOWN_PATTERN)?;
        Ok(VerificationSpec::new("main page")
            .presence([
                self.nav_bar.clone(),
                self.user_avatar.clone(),
                self.balance_summary.clone(),
                self.transactions.clone(),
                self.search.clone(),
                self.menu_items.clone(),
                self.status_pills.clone(),
                self.branch_countdown.clone(),
                self.pay_now.clone(),
            ])
            .ordered_text(self.menu_items.clone(), MENU_ITEMS)
            .text_subset(self.status_pills.clone(), STATUS_VALUES)
            .text_pattern(self.branch_countdown.clone(), countdown))
    }
}

/// Run the full login scenario: load the login page, submit credentials,
/// and verify the post-login page.
///
/// Returns the passing [`VerificationReport`]. The session is closed on
/// every path; if both the scenario and the close fail, the scenario
/// failure wins.
///
/// # Errors
///
/// [`crate::EsperarError::ConditionTimeout`] when an expected element never
/// appears, [`crate::EsperarError::Verification`] when the page renders but
/// does not match its spec, and driver errors otherwise.
pub fn run_login_scenario<D: BrowserDriver>(
    driver: D,
    config: &ScenarioConfig,
    waiter: Waiter,
) -> EsperarResult<VerificationReport> {
    let session = Session::start(driver, waiter);
    let outcome = drive(&session, config);
    let closed = session.close();
    let report = outcome?;
    closed?;
    Ok(report)
}

fn drive<D: BrowserDriver>(
    session: &Session<D>,
    config: &ScenarioConfig,
) -> EsperarResult<VerificationReport> {
    tracing::info!(browser = %config.browser, "starting login scenario");
    session.navigate(config.target_url(false))?;
    LoginPage::new().log_in(session, &config.credentials)?;
    let spec = MainPage::new().verification_spec()?;
    let verifier = session.verifier();
    spec.run(&verifier).into_result()
}
