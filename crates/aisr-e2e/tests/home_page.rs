//! End-to-end scenarios for the home page, run against the simulated site.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use aisr_e2e::suites::{fixtures, home_suite, HOME_PAGE};
use aisr_e2e::{
    expect, BrowserLauncher, E2eConfig, E2eError, HomePage, MockBrowser, MockDriver, MockSite,
    PageHandle, PageObject, PageState, TestRunner,
};
use std::sync::Arc;

fn config() -> E2eConfig {
    E2eConfig::new()
        .with_expect_timeout(100)
        .with_poll_interval(5)
}

fn home_page() -> HomePage {
    HomePage::from_page(PageHandle::new(
        Box::new(MockDriver::new(Arc::new(MockSite::aisr()))),
        &config(),
    ))
}

#[tokio::test]
async fn home_suite_passes() {
    let runner = TestRunner::new(config(), Arc::new(MockBrowser::aisr()));
    let results = runner.run(&home_suite(), None).await;
    assert_eq!(results.total(), 2);
    assert!(results.all_passed(), "{:?}", results.failures());
}

#[tokio::test]
async fn filter_selects_heading_case() {
    let runner = TestRunner::new(config(), Arc::new(MockBrowser::aisr()));
    let results = runner.run(&home_suite(), Some("heading")).await;
    assert_eq!(results.total(), 1);
    assert_eq!(results.results[0].name, "displays the AISR heading");
}

#[tokio::test]
async fn heading_is_visible_after_goto() {
    let home = home_page();
    home.goto().await.unwrap();
    expect(&home.heading()).to_be_visible().await.unwrap();
    expect(&home.heading()).to_have_text("AISR").await.unwrap();
}

#[tokio::test]
async fn goto_always_lands_on_root() {
    let home = home_page();
    home.goto().await.unwrap();
    assert_eq!(home.page().url().await.unwrap(), "http://localhost:5173/");
    assert!(home.is_current().await.unwrap());
}

#[tokio::test]
async fn goto_twice_equals_once() {
    let home = home_page();
    home.goto().await.unwrap();
    let once = home.state();
    home.goto().await.unwrap();
    assert_eq!(home.state(), once);
    assert_eq!(once, PageState::Attached);
}

#[tokio::test]
async fn accessors_never_touch_the_browser() {
    let page = PageHandle::new(
        Box::new(MockDriver::new(Arc::new(MockSite::aisr().unreachable()))),
        &config(),
    );
    let home = HomePage::from_page(page);
    let _ = home.heading();
    let _ = home.subtitle();
    assert_eq!(home.state(), PageState::Unattached);
    assert!(home.goto().await.is_err());
}

#[tokio::test]
async fn missing_route_has_no_heading() {
    let home = home_page();
    home.base().goto("/no-such-route").await.unwrap();
    let err = expect(&home.heading()).to_be_visible().await.unwrap_err();
    assert!(matches!(err, E2eError::ElementNotFound { .. }));
    assert!(err.to_string().contains("/no-such-route"));
}

#[tokio::test]
async fn fixtures_memoize_within_and_isolate_across_cases() {
    let registry = fixtures();
    let browser = MockBrowser::aisr();
    let first = registry.scope(PageHandle::new(
        browser.new_driver().await.unwrap(),
        &config(),
    ));
    let second = registry.scope(PageHandle::new(
        browser.new_driver().await.unwrap(),
        &config(),
    ));

    let a = first.fixture::<HomePage>(HOME_PAGE).unwrap();
    let again = first.fixture::<HomePage>(HOME_PAGE).unwrap();
    let b = second.fixture::<HomePage>(HOME_PAGE).unwrap();

    assert!(Arc::ptr_eq(&a, &again));
    assert!(!Arc::ptr_eq(&a, &b));
    assert!(!a.page().same_page(b.page()));

    first.teardown().unwrap();
    second.teardown().unwrap();
}
