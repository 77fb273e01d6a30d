//! Auto-retrying assertions on locators (Playwright's `expect()`).
//!
//! `expect(&home.heading()).to_be_visible().await?;`
//!
//! Every assertion polls until it holds or the expect timeout passes. Text and
//! count mismatches fail with [`E2eError::AssertionFailed`] naming the
//! locator, the page URL and both values.

use crate::locator::{duration_ms, text_matches, ElementState, Locator};
use crate::result::{E2eError, E2eResult};
use crate::wait;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Assertion builder for one locator
#[derive(Debug, Clone)]
pub struct Expect {
    locator: Locator,
}

/// Create an expectation for a locator
#[must_use]
pub fn expect(locator: &Locator) -> Expect {
    Expect {
        locator: locator.clone(),
    }
}

/// How text is compared
#[derive(Debug, Clone, Copy)]
enum TextMatch {
    Exact,
    Contains,
}

impl TextMatch {
    fn holds(self, actual: &str, expected: &str) -> bool {
        match self {
            Self::Exact => text_matches(actual, expected, true),
            Self::Contains => {
                let actual = actual.split_whitespace().collect::<Vec<_>>().join(" ");
                let expected = expected.split_whitespace().collect::<Vec<_>>().join(" ");
                actual.contains(&expected)
            }
        }
    }

    const fn describe(self) -> &'static str {
        match self {
            Self::Exact => "to have text",
            Self::Contains => "to contain text",
        }
    }
}

impl Expect {
    /// Override the expect timeout for this assertion
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.locator = self.locator.with_timeout(timeout);
        self
    }

    /// The asserted locator
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Assert the element is visible
    pub async fn to_be_visible(&self) -> E2eResult<()> {
        self.locator.wait_for(ElementState::Visible).await.map(drop)
    }

    /// Assert no matching element is visible
    pub async fn to_be_hidden(&self) -> E2eResult<()> {
        self.locator.wait_for(ElementState::Hidden).await.map(drop)
    }

    /// Assert the element's text equals `expected` (whitespace-normalized)
    pub async fn to_have_text(&self, expected: &str) -> E2eResult<()> {
        self.text_assertion(expected, TextMatch::Exact).await
    }

    /// Assert the element's text contains `expected`
    pub async fn to_contain_text(&self, expected: &str) -> E2eResult<()> {
        self.text_assertion(expected, TextMatch::Contains).await
    }

    /// Assert the locator resolves to exactly `expected` elements
    pub async fn to_have_count(&self, expected: usize) -> E2eResult<()> {
        let last = Mutex::new(0_usize);
        let outcome = wait::poll(&self.locator.options().wait_options(), || {
            let last = &last;
            async move {
                let count = self.locator.count().await?;
                *last.lock().unwrap_or_else(PoisonError::into_inner) = count;
                Ok((count == expected).then_some(()))
            }
        })
        .await?;

        if outcome.is_some() {
            return Ok(());
        }
        let actual = *last.lock().unwrap_or_else(PoisonError::into_inner);
        Err(self
            .mismatch("to have count", &expected.to_string(), &actual.to_string())
            .await)
    }

    async fn text_assertion(&self, expected: &str, mode: TextMatch) -> E2eResult<()> {
        let last: Mutex<Option<String>> = Mutex::new(None);
        let outcome = wait::poll(&self.locator.options().wait_options(), || {
            let last = &last;
            async move {
                let elements = self.locator.all().await?;
                self.locator.check_strict(&elements).await?;
                let Some(element) = elements.into_iter().next() else {
                    return Ok(None);
                };
                let holds = mode.holds(&element.text, expected);
                *last.lock().unwrap_or_else(PoisonError::into_inner) = Some(element.text);
                Ok(holds.then_some(()))
            }
        })
        .await?;

        if outcome.is_some() {
            return Ok(());
        }
        let actual = last.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(actual) = actual else {
            let state = ElementState::Attached;
            return Err(self.locator.deadline_error(state, 0).await);
        };
        Err(self.mismatch(mode.describe(), expected, &actual).await)
    }

    async fn mismatch(&self, what: &str, expected: &str, actual: &str) -> E2eError {
        let url = self.locator.page().url_or_blank().await;
        E2eError::AssertionFailed {
            message: format!(
                "expected {} {what} '{expected}' on {url}, got '{actual}' after {}ms",
                self.locator.selector(),
                duration_ms(self.locator.options().timeout),
            ),
        }
    }
}
