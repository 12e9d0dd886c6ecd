//! # esperar
//!
//! Explicit waiting and page verification for browser-driven tests.
//!
//! The crate replaces sleep-based synchronization with a polling wait
//! engine: a [`Waiter`] re-evaluates a [`WaitCondition`] against live
//! browser state until it holds or a timeout elapses. On top of it, a
//! [`Verifier`] checks rendered pages against expected shape, and a
//! [`Session`] scopes the browser's lifetime so it is released on every
//! exit path.
//!
//! ## Quick Start
//!
//! ```
//! use esperar::{Locator, SimBrowser, SimElement, SimPage, Session, Waiter};
//!
//! let browser = SimBrowser::new();
//! browser.route(
//!     "https://app.test/",
//!     SimPage::new().with_element(SimElement::new("h1").with_id("title").with_text("Welcome")),
//! );
//!
//! let session = Session::start(browser, Waiter::new());
//! session.navigate("https://app.test/")?;
//! session.verifier().verify_presence(&[Locator::id("title")])?;
//! session.close()?;
//! # Ok::<(), esperar::EsperarError>(())
//! ```
//!
//! ## Design Principles
//!
//! - **Explicit waits only**: every wait names its condition and its
//!   timeout; there are no unconditional sleeps
//! - **Fresh state per poll**: conditions query the driver each attempt,
//!   never a cached snapshot
//! - **Driver-agnostic**: the [`BrowserDriver`] trait is the only seam to
//!   a real browser; [`SimBrowser`] implements it in memory for tests
//! - **Scoped sessions**: browser handles are passed explicitly and
//!   released deterministically, never held in globals

#![forbid(unsafe_code)]

pub mod driver;
pub mod locator;
pub mod result;
pub mod scenario;
pub mod session;
pub mod sim;
pub mod verify;
pub mod wait;

pub use driver::{find_single, BrowserDriver, BrowserKind, ElementHandle};
pub use locator::{Locator, Selector};
pub use result::{EsperarError, EsperarResult};
pub use scenario::{
    run_login_scenario, Credentials, LoginPage, MainPage, ScenarioConfig, COUNTDOWN_PATTERN,
    MENU_ITEMS, STATUS_VALUES,
};
pub use session::Session;
pub use sim::{SimBrowser, SimElement, SimPage};
pub use verify::{
    normalize_text, CheckFailure, PageCheck, VerificationReport, VerificationSpec, Verifier,
};
pub use wait::{
    Absence, Appearance, FnCondition, WaitCondition, WaitOptions, WaitOutcome, Waiter,
    DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT,
};
