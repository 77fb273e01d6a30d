//! Browser end-to-end test harness for the AISR front-end.
//!
//! Tests talk to the application through page objects ([`pages::HomePage`])
//! handed out by a per-test [`fixture::TestScope`]. Locators are deferred and
//! auto-waiting; [`assertion::expect`] retries until the configured timeout.
//!
//! ```ignore
//! let runner = TestRunner::new(E2eConfig::new(), Arc::new(MockBrowser::aisr()));
//! let results = runner.run(&suites::home_suite(), None).await;
//! assert!(results.all_passed());
//! ```
//!
//! Real browsers are driven over CDP with the `browser` feature.

#![warn(missing_docs)]

pub mod assertion;
pub mod browser;
pub mod config;
pub mod driver;
pub mod fixture;
pub mod harness;
pub mod locator;
pub mod logging;
pub mod page;
pub mod page_object;
pub mod pages;
pub mod result;
pub mod suites;
pub mod wait;

pub use assertion::{expect, Expect};
pub use browser::{launch_chromium, BrowserLauncher, MockBrowser};
pub use config::E2eConfig;
pub use driver::{BrowserDriver, ElementSnapshot, MockDriver, MockSite};
pub use fixture::{FixtureRegistry, FixtureState, TestScope};
pub use harness::{SuiteResults, TestCase, TestResult, TestRunner, TestSuite};
pub use locator::{AriaRole, ElementState, Locator, LocatorOptions, Selector};
pub use logging::{init_tracing, LogFormat};
pub use page::PageHandle;
pub use page_object::{BasePage, PageObject, PageState, UrlMatcher};
pub use pages::HomePage;
pub use result::{E2eError, E2eResult, ErrorKind};
pub use wait::WaitOptions;
