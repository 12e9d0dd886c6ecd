//! Declarative page verification.
//!
//! A [`VerificationSpec`] declares the complete expected shape of a page in
//! one place: which elements must be present, which text patterns must hold,
//! and what the ordered or allowed collections of texts look like. Individual
//! checks are pure: run once against the live page, terminal pass/fail.
//! Running a spec executes every check and collects all failures into a
//! [`VerificationReport`], so one run reports every broken assertion rather
//! than just the first.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::driver::{find_single, BrowserDriver};
use crate::locator::Locator;
use crate::result::{EsperarError, EsperarResult};
use crate::wait::Waiter;

/// Element text after trimming whitespace and case-folding.
///
/// Used for ordered-sequence and subset comparisons so that markup casing
/// and incidental whitespace do not break structural checks.
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A single failed check within a verification run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckFailure {
    /// Description of the check that failed
    pub check: String,
    /// Expected-vs-actual detail
    pub message: String,
}

impl CheckFailure {
    /// Create a new check failure
    #[must_use]
    pub fn new(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.check, self.message)
    }
}

/// Outcome of running a [`VerificationSpec`]: every check's result, with
/// all failures collected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationReport {
    page: String,
    checks_run: usize,
    failures: Vec<CheckFailure>,
}

impl VerificationReport {
    /// Create an empty report for a page
    #[must_use]
    pub fn new(page: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            checks_run: 0,
            failures: Vec::new(),
        }
    }

    /// Record the outcome of one check
    pub fn observe(&mut self, check: impl Into<String>, outcome: EsperarResult<()>) {
        self.checks_run += 1;
        if let Err(err) = outcome {
            self.failures.push(CheckFailure::new(check, err.to_string()));
        }
    }

    /// Page this report describes
    #[must_use]
    pub fn page(&self) -> &str {
        &self.page
    }

    /// Number of checks executed
    #[must_use]
    pub const fn checks_run(&self) -> usize {
        self.checks_run
    }

    /// The collected failures
    #[must_use]
    pub fn failures(&self) -> &[CheckFailure] {
        &self.failures
    }

    /// Whether every check passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Convert into a result: the report itself on success, a
    /// [`EsperarError::Verification`] carrying it otherwise.
    ///
    /// # Errors
    ///
    /// Returns the report wrapped in an error when any check failed.
    pub fn into_result(self) -> EsperarResult<Self> {
        if self.passed() {
            Ok(self)
        } else {
            Err(EsperarError::Verification(self))
        }
    }

    /// Serialize the report as JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> EsperarResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            write!(
                f,
                "verification of {}: all {} checks passed",
                self.page, self.checks_run
            )
        } else {
            write!(
                f,
                "verification of {}: {} of {} checks failed",
                self.page,
                self.failures.len(),
                self.checks_run
            )?;
            for failure in &self.failures {
                write!(f, "; {failure}")?;
            }
            Ok(())
        }
    }
}

/// A single declarative check against the current page state
#[derive(Debug, Clone)]
pub enum PageCheck {
    /// Every locator must match at least one element (waits for appearance)
    Presence {
        /// Locators that must all be present
        locators: Vec<Locator>,
    },
    /// The single matched element's text must fully match the pattern
    TextPattern {
        /// Locator matching exactly one element
        locator: Locator,
        /// Pattern the whole text must match
        pattern: Regex,
    },
    /// All matched elements' normalized texts must equal the sequence exactly
    OrderedText {
        /// Locator whose matches are collected in document order
        locator: Locator,
        /// Expected texts, in order
        expected: Vec<String>,
    },
    /// Every matched element's normalized text must be in the allowed set
    TextSubset {
        /// Locator whose matches are collected
        locator: Locator,
        /// Allowed texts; not all need to be observed
        allowed: Vec<String>,
    },
}

impl PageCheck {
    /// Short description used in reports
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Presence { locators } => format!("presence of {} elements", locators.len()),
            Self::TextPattern { locator, .. } => format!("text pattern of {locator}"),
            Self::OrderedText { locator, .. } => format!("ordered texts of {locator}"),
            Self::TextSubset { locator, .. } => format!("allowed texts of {locator}"),
        }
    }
}

/// Runs individual checks against the live page.
///
/// Borrows the driver; presence checks go through the [`Waiter`] so a page
/// that is still rendering gets its bounded chance to settle. All other
/// checks observe the page exactly once.
pub struct Verifier<'a> {
    driver: &'a dyn BrowserDriver,
    waiter: Waiter,
}

impl fmt::Debug for Verifier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verifier")
            .field("waiter", &self.waiter)
            .finish_non_exhaustive()
    }
}

impl<'a> Verifier<'a> {
    /// Create a verifier with a default waiter
    #[must_use]
    pub fn new(driver: &'a dyn BrowserDriver) -> Self {
        Self {
            driver,
            waiter: Waiter::new(),
        }
    }

    /// Create a verifier with a custom waiter
    #[must_use]
    pub fn with_waiter(driver: &'a dyn BrowserDriver, waiter: Waiter) -> Self {
        Self { driver, waiter }
    }

    /// Check that every locator matches at least one element.
    ///
    /// Delegates each locator to the waiter's presence wait; fails fast on
    /// the first locator that never appears, and the error names it.
    ///
    /// # Errors
    ///
    /// [`EsperarError::ConditionTimeout`] naming the missing locator.
    pub fn verify_presence(&self, locators: &[Locator]) -> EsperarResult<()> {
        for locator in locators {
            self.waiter.wait_for_presence(self.driver, locator)?;
        }
        Ok(())
    }

    /// Check that the single matched element's text fully matches the
    /// pattern.
    ///
    /// This is a full-string match, not a substring search: the pattern is
    /// anchored at both ends before matching, so the engine itself searches
    /// for a whole-string match. An alternation whose shorter branch would
    /// win a leftmost-first search still matches when a longer branch spans
    /// the text.
    ///
    /// # Errors
    ///
    /// [`EsperarError::TextMismatch`] carrying the pattern and the actual
    /// text on mismatch; locator resolution errors otherwise.
    pub fn verify_text_pattern(&self, locator: &Locator, pattern: &Regex) -> EsperarResult<()> {
        let handle = find_single(self.driver, locator)?;
        let actual = self.driver.text(&handle)?;
        let anchored = Regex::new(&format!("^(?:{})$", pattern.as_str()))?;
        if anchored.is_match(&actual) {
            Ok(())
        } else {
            Err(EsperarError::TextMismatch {
                locator: locator.to_string(),
                pattern: pattern.as_str().to_string(),
                actual,
            })
        }
    }

    /// Check that all matched elements' normalized texts equal the expected
    /// sequence exactly: same length, same order, same values.
    ///
    /// Element order is document order as returned by the driver; nothing is
    /// re-sorted. Both sides are normalized, so the comparison is
    /// case-insensitive and whitespace-tolerant.
    ///
    /// # Errors
    ///
    /// [`EsperarError::SequenceMismatch`] carrying both sequences.
    pub fn verify_ordered_sequence<S: AsRef<str>>(
        &self,
        locator: &Locator,
        expected: &[S],
    ) -> EsperarResult<()> {
        let actual = self.collect_normalized(locator)?;
        let want: Vec<String> = expected.iter().map(|s| normalize_text(s.as_ref())).collect();
        if actual == want {
            Ok(())
        } else {
            Err(EsperarError::SequenceMismatch {
                locator: locator.to_string(),
                expected: want,
                actual,
            })
        }
    }

    /// Check that every matched element's normalized text is a member of the
    /// allowed set.
    ///
    /// This is a containment check, not an equality check: allowed values
    /// that never occur are fine (status values appear in data-dependent
    /// proportions). The first observed value outside the set fails the
    /// check and is named in the error.
    ///
    /// # Errors
    ///
    /// [`EsperarError::UnexpectedValue`] naming the offending value.
    pub fn verify_subset_of<S: AsRef<str>>(
        &self,
        locator: &Locator,
        allowed: &[S],
    ) -> EsperarResult<()> {
        let allowed_set: HashSet<String> =
            allowed.iter().map(|s| normalize_text(s.as_ref())).collect();
        for value in self.collect_normalized(locator)? {
            if !allowed_set.contains(&value) {
                let mut allowed: Vec<String> = allowed_set.into_iter().collect();
                allowed.sort_unstable();
                return Err(EsperarError::UnexpectedValue {
                    locator: locator.to_string(),
                    value,
                    allowed,
                });
            }
        }
        Ok(())
    }

    /// Run one declarative check
    ///
    /// # Errors
    ///
    /// Propagates the underlying check's error.
    pub fn run_check(&self, check: &PageCheck) -> EsperarResult<()> {
        match check {
            PageCheck::Presence { locators } => self.verify_presence(locators),
            PageCheck::TextPattern { locator, pattern } => {
                self.verify_text_pattern(locator, pattern)
            }
            PageCheck::OrderedText { locator, expected } => {
                self.verify_ordered_sequence(locator, expected)
            }
            PageCheck::TextSubset { locator, allowed } => self.verify_subset_of(locator, allowed),
        }
    }

    fn collect_normalized(&self, locator: &Locator) -> EsperarResult<Vec<String>> {
        self.driver
            .find_elements(locator)?
            .iter()
            .map(|handle| Ok(normalize_text(&self.driver.text(handle)?)))
            .collect()
    }
}

/// The complete expected shape of a page, declared once and run once.
#[derive(Debug, Clone)]
pub struct VerificationSpec {
    page: String,
    checks: Vec<PageCheck>,
}

impl VerificationSpec {
    /// Create an empty spec for a named page
    #[must_use]
    pub fn new(page: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            checks: Vec::new(),
        }
    }

    /// Require every locator to be present
    #[must_use]
    pub fn presence(mut self, locators: impl IntoIterator<Item = Locator>) -> Self {
        self.checks.push(PageCheck::Presence {
            locators: locators.into_iter().collect(),
        });
        self
    }

    /// Require the locator's single element text to fully match the pattern
    #[must_use]
    pub fn text_pattern(mut self, locator: Locator, pattern: Regex) -> Self {
        self.checks.push(PageCheck::TextPattern { locator, pattern });
        self
    }

    /// Require the locator's texts to equal the sequence exactly, in order
    #[must_use]
    pub fn ordered_text<S: Into<String>>(
        mut self,
        locator: Locator,
        expected: impl IntoIterator<Item = S>,
    ) -> Self {
        self.checks.push(PageCheck::OrderedText {
            locator,
            expected: expected.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Require every one of the locator's texts to be in the allowed set
    #[must_use]
    pub fn text_subset<S: Into<String>>(
        mut self,
        locator: Locator,
        allowed: impl IntoIterator<Item = S>,
    ) -> Self {
        self.checks.push(PageCheck::TextSubset {
            locator,
            allowed: allowed.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Page name
    #[must_use]
    pub fn page(&self) -> &str {
        &self.page
    }

    /// Number of checks
    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Whether the spec has no checks
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every check and collect all failures.
    ///
    /// Checks are independent: a failure does not stop the run, so a single
    /// pass reports every broken assertion for the page.
    #[must_use]
    pub fn run(&self, verifier: &Verifier<'_>) -> VerificationReport {
        let mut report = VerificationReport::new(&self.page);
        for check in &self.checks {
            let outcome = verifier.run_check(check);
            report.observe(check.description(), outcome);
        }
        tracing::info!(
            page = %self.page,
            checks = report.checks_run(),
            failures = report.failures().len(),
            "verification finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimBrowser, SimElement, SimPage};
    use crate::wait::WaitOptions;
    use proptest::prelude::*;
    use std::time::Duration;

    fn browser_with(elements: Vec<SimElement>) -> SimBrowser {
        let mut page = SimPage::new();
        for element in elements {
            page.push(element);
        }
        let browser = SimBrowser::new();
        browser.route("https://app.test/", page);
        browser
            .navigate("https://app.test/")
            .expect("navigation should succeed");
        browser
    }

    fn fast_verifier(browser: &SimBrowser) -> Verifier<'_> {
        Verifier::with_waiter(
            browser,
            Waiter::with_options(
                WaitOptions::new()
                    .with_timeout(Duration::from_millis(150))
                    .with_poll_interval(Duration::from_millis(10)),
            ),
        )
    }

    fn menu(texts: &[&str]) -> Vec<SimElement> {
        texts
            .iter()
            .map(|text| SimElement::new("li").with_class("menu-item").with_text(*text))
            .collect()
    }

    mod normalize_tests {
        use super::*;

        #[test]
        fn test_trims_and_case_folds() {
            assert_eq!(normalize_text("  Card Types \n"), "card types");
            assert_eq!(normalize_text("COMPLETE"), "complete");
        }

        proptest! {
            #[test]
            fn normalization_is_idempotent(raw in ".*") {
                let once = normalize_text(&raw);
                prop_assert_eq!(normalize_text(&once), once);
            }
        }
    }

    mod presence_tests {
        use super::*;

        #[test]
        fn test_all_present_passes() {
            let browser = browser_with(vec![
                SimElement::new("input").with_id("username"),
                SimElement::new("input").with_id("password"),
            ]);
            let verifier = fast_verifier(&browser);
            let locators = [Locator::id("username"), Locator::id("password")];
            assert!(verifier.verify_presence(&locators).is_ok());
        }

        #[test]
        fn test_first_missing_locator_is_named() {
            let browser = browser_with(vec![SimElement::new("input").with_id("username")]);
            let verifier = fast_verifier(&browser);
            let locators = [Locator::id("username"), Locator::id("pay-now")];
            let err = verifier.verify_presence(&locators).unwrap_err();
            assert!(err.to_string().contains("id=pay-now"));
        }
    }

    mod text_pattern_tests {
        use super::*;

        const COUNTDOWN: &str = r"Your nearest branch closes in:( \d+[hms])+";

        fn countdown_browser(text: &str) -> SimBrowser {
            browser_with(vec![SimElement::new("span")
                .with_id("time-to-close")
                .with_text(text)])
        }

        #[test]
        fn test_repeating_group_full_match() {
            let browser = countdown_browser("Your nearest branch closes in: 3h 12m 5s");
            let verifier = fast_verifier(&browser);
            let pattern = Regex::new(COUNTDOWN).unwrap();
            assert!(verifier
                .verify_text_pattern(&Locator::id("time-to-close"), &pattern)
                .is_ok());
        }

        #[test]
        fn test_trailing_suffix_fails() {
            let browser = countdown_browser("Your nearest branch closes in: 3h 12m 5s (approx)");
            let verifier = fast_verifier(&browser);
            let pattern = Regex::new(COUNTDOWN).unwrap();
            let err = verifier
                .verify_text_pattern(&Locator::id("time-to-close"), &pattern)
                .unwrap_err();
            match err {
                EsperarError::TextMismatch { actual, .. } => {
                    assert!(actual.contains("(approx)"));
                }
                other => panic!("expected TextMismatch, got {other}"),
            }
        }

        #[test]
        fn test_alternation_matches_whole_text_not_leftmost_branch() {
            // "a|ab" against "ab": a leftmost-first search stops at "a",
            // but the longer branch spans the whole text and must pass.
            let browser = browser_with(vec![SimElement::new("span")
                .with_id("badge")
                .with_text("ab")]);
            let verifier = fast_verifier(&browser);
            let pattern = Regex::new("a|ab").unwrap();
            assert!(verifier
                .verify_text_pattern(&Locator::id("badge"), &pattern)
                .is_ok());
        }

        #[test]
        fn test_substring_match_is_not_enough() {
            let browser = countdown_browser("NOTE Your nearest branch closes in: 5s");
            let verifier = fast_verifier(&browser);
            let pattern = Regex::new(COUNTDOWN).unwrap();
            assert!(verifier
                .verify_text_pattern(&Locator::id("time-to-close"), &pattern)
                .is_err());
        }

        #[test]
        fn test_ambiguous_locator_is_rejected() {
            let browser = browser_with(vec![
                SimElement::new("span").with_class("clock").with_text("5s"),
                SimElement::new("span").with_class("clock").with_text("6s"),
            ]);
            let verifier = fast_verifier(&browser);
            let pattern = Regex::new(r"\d+s").unwrap();
            let err = verifier
                .verify_text_pattern(&Locator::css(".clock"), &pattern)
                .unwrap_err();
            assert!(matches!(err, EsperarError::AmbiguousLocator { .. }));
        }
    }

    mod ordered_sequence_tests {
        use super::*;

        const MENU: [&str; 6] = [
            "card types",
            "credit cards",
            "debit cards",
            "lending",
            "loans",
            "mortgages",
        ];

        #[test]
        fn test_exact_order_passes_case_insensitively() {
            let browser = browser_with(menu(&[
                " Card Types ",
                "Credit Cards",
                "Debit Cards",
                "LENDING",
                "Loans",
                "Mortgages",
            ]));
            let verifier = fast_verifier(&browser);
            assert!(verifier
                .verify_ordered_sequence(&Locator::css(".menu-item"), &MENU)
                .is_ok());
        }

        #[test]
        fn test_permuting_expected_flips_to_failure() {
            let browser = browser_with(menu(&MENU));
            let verifier = fast_verifier(&browser);
            let mut permuted = MENU;
            permuted.swap(0, 5);
            let err = verifier
                .verify_ordered_sequence(&Locator::css(".menu-item"), &permuted)
                .unwrap_err();
            assert!(matches!(err, EsperarError::SequenceMismatch { .. }));
        }

        #[test]
        fn test_length_mismatch_fails() {
            let browser = browser_with(menu(&["card types", "loans"]));
            let verifier = fast_verifier(&browser);
            assert!(verifier
                .verify_ordered_sequence(&Locator::css(".menu-item"), &MENU)
                .is_err());
        }
    }

    mod subset_tests {
        use super::*;

        const ALLOWED: [&str; 3] = ["complete", "pending", "declined"];

        fn pills(texts: &[&str]) -> Vec<SimElement> {
            texts
                .iter()
                .map(|text| {
                    SimElement::new("span")
                        .with_class("status-pill")
                        .with_text(*text)
                })
                .collect()
        }

        #[test]
        fn test_under_coverage_is_tolerated() {
            let browser = browser_with(pills(&["Pending", "Complete", "pending"]));
            let verifier = fast_verifier(&browser);
            assert!(verifier
                .verify_subset_of(&Locator::css(".status-pill"), &ALLOWED)
                .is_ok());
        }

        #[test]
        fn test_unexpected_value_is_named() {
            let browser = browser_with(pills(&["complete", "unknown"]));
            let verifier = fast_verifier(&browser);
            let err = verifier
                .verify_subset_of(&Locator::css(".status-pill"), &ALLOWED)
                .unwrap_err();
            match err {
                EsperarError::UnexpectedValue { value, .. } => assert_eq!(value, "unknown"),
                other => panic!("expected UnexpectedValue, got {other}"),
            }
        }

        #[test]
        fn test_zero_matches_is_vacuously_true() {
            let browser = browser_with(vec![]);
            let verifier = fast_verifier(&browser);
            assert!(verifier
                .verify_subset_of(&Locator::css(".status-pill"), &ALLOWED)
                .is_ok());
        }

        proptest! {
            // Containment does not care which allowed values occur, how
            // often, or in what order.
            #[test]
            fn any_sample_of_allowed_values_passes(
                picks in proptest::collection::vec(0usize..3, 0..8)
            ) {
                let texts: Vec<&str> = picks.iter().map(|&i| ALLOWED[i]).collect();
                let browser = browser_with(pills(&texts));
                let verifier = fast_verifier(&browser);
                prop_assert!(verifier
                    .verify_subset_of(&Locator::css(".status-pill"), &ALLOWED)
                    .is_ok());
            }
        }
    }

    mod spec_tests {
        use super::*;

        #[test]
        fn test_run_collects_every_failure() {
            // Menu order wrong AND one bad status value: both must be
            // reported in one run.
            let mut elements = menu(&["loans", "card types"]);
            elements.push(
                SimElement::new("span")
                    .with_class("status-pill")
                    .with_text("unknown"),
            );
            elements.push(SimElement::new("div").with_id("balance"));
            let browser = browser_with(elements);
            let verifier = fast_verifier(&browser);

            let spec = VerificationSpec::new("main page")
                .presence([Locator::id("balance")])
                .ordered_text(Locator::css(".menu-item"), ["card types", "loans"])
                .text_subset(Locator::css(".status-pill"), ["complete", "pending"]);

            let report = spec.run(&verifier);
            assert_eq!(report.checks_run(), 3);
            assert_eq!(report.failures().len(), 2);
            assert!(!report.passed());
            assert!(report.into_result().is_err());
        }

        #[test]
        fn test_passing_report_display_and_json() {
            let browser = browser_with(vec![SimElement::new("div").with_id("balance")]);
            let verifier = fast_verifier(&browser);
            let spec = VerificationSpec::new("main page").presence([Locator::id("balance")]);

            let report = spec.run(&verifier).into_result().unwrap();
            assert!(report.to_string().contains("all 1 checks passed"));
            let json = report.to_json().unwrap();
            assert!(json.contains("\"main page\""));
        }

        #[test]
        fn test_failing_report_display_lists_failures() {
            let mut report = VerificationReport::new("main page");
            report.observe("check one", Ok(()));
            report.observe(
                "check two",
                Err(EsperarError::Driver {
                    message: "boom".to_string(),
                }),
            );
            let text = report.to_string();
            assert!(text.contains("1 of 2 checks failed"));
            assert!(text.contains("check two"));
        }

        #[test]
        fn test_spec_builder_counts_checks() {
            let spec = VerificationSpec::new("page")
                .presence([Locator::id("a")])
                .ordered_text(Locator::css(".x"), ["one"])
                .text_subset(Locator::css(".y"), ["two"]);
            assert_eq!(spec.len(), 3);
            assert!(!spec.is_empty());
            assert_eq!(spec.page(), "page");
        }
    }
}
