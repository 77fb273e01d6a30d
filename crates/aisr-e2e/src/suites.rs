//! The AISR browser suites.

use crate::assertion::expect;
use crate::fixture::{FixtureRegistry, TestScope};
use crate::harness::{TestCase, TestSuite};
use crate::page_object::PageObject;
use crate::pages::{HomePage, HOME_SUBTITLE};

/// Fixture name of the home page object
pub const HOME_PAGE: &str = "home_page";

/// Fixtures available to every AISR suite
#[must_use]
pub fn fixtures() -> FixtureRegistry {
    let mut registry = FixtureRegistry::new();
    registry.page_object::<HomePage>(HOME_PAGE);
    registry
}

/// The "Home Page" suite
#[must_use]
pub fn home_suite() -> TestSuite {
    TestSuite::new("Home Page", fixtures())
        .test(
            TestCase::new("displays the AISR heading", |scope: TestScope| async move {
                let home = scope.fixture::<HomePage>(HOME_PAGE)?;
                home.goto().await?;
                expect(&home.heading()).to_be_visible().await
            })
            .uses(HOME_PAGE),
        )
        .test(
            TestCase::new("displays the subtitle", |scope: TestScope| async move {
                let home = scope.fixture::<HomePage>(HOME_PAGE)?;
                home.goto().await?;
                expect(&home.subtitle()).to_have_text(HOME_SUBTITLE).await
            })
            .uses(HOME_PAGE),
        )
}
