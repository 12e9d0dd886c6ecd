//! Result and error types for Esperar.

use std::time::Duration;
use thiserror::Error;

use crate::verify::VerificationReport;

/// Result type for Esperar operations
pub type EsperarResult<T> = Result<T, EsperarError>;

/// Errors that can occur in Esperar
#[derive(Debug, Error)]
pub enum EsperarError {
    /// A wait condition never became true within its budget
    #[error("condition \"{condition}\" not satisfied after {elapsed:?}")]
    ConditionTimeout {
        /// Time spent polling before giving up
        elapsed: Duration,
        /// Description of the condition that was waited for
        condition: String,
    },

    /// No element matched a locator that requires at least one match
    #[error("no element matching {locator}")]
    MissingElement {
        /// The locator that matched nothing
        locator: String,
    },

    /// A locator that requires exactly one match matched several elements
    #[error("{locator} matched {count} elements, expected exactly one")]
    AmbiguousLocator {
        /// The ambiguous locator
        locator: String,
        /// How many elements matched
        count: usize,
    },

    /// Element text did not fully match the expected pattern
    #[error("text of {locator} does not fully match /{pattern}/, got {actual:?}")]
    TextMismatch {
        /// The locator whose text was read
        locator: String,
        /// The expected pattern
        pattern: String,
        /// The text actually observed
        actual: String,
    },

    /// Observed text sequence differs from the expected one
    #[error("{locator}: expected {expected:?} in order, got {actual:?}")]
    SequenceMismatch {
        /// The locator whose matches were collected
        locator: String,
        /// Expected normalized texts, in order
        expected: Vec<String>,
        /// Observed normalized texts, in document order
        actual: Vec<String>,
    },

    /// An observed value is outside the allowed set
    #[error("{locator}: value {value:?} is not one of {allowed:?}")]
    UnexpectedValue {
        /// The locator whose matches were collected
        locator: String,
        /// The offending normalized text
        value: String,
        /// The allowed normalized values
        allowed: Vec<String>,
    },

    /// One or more checks of a verification spec failed
    #[error("{0}")]
    Verification(VerificationReport),

    /// An element handle was used after the page re-rendered
    #[error("stale element handle {id}: page was re-rendered since it was acquired")]
    StaleElement {
        /// Driver-assigned element id
        id: String,
    },

    /// The browser driver reported an error
    #[error("driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Navigation failed
    #[error("navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed to load
        url: String,
        /// Error message
        message: String,
    },

    /// A verification pattern failed to compile
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
