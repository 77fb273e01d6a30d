//! Test harness for running test suites.
//!
//! Every case gets its own page from the launcher and its own fixture scope.
//! Cases run concurrently on the current task, at most `workers` at a time,
//! and results come back in declaration order.

use crate::browser::BrowserLauncher;
use crate::config::E2eConfig;
use crate::fixture::{FixtureRegistry, TestScope};
use crate::locator::duration_ms;
use crate::page::PageHandle;
use crate::result::{E2eError, E2eResult, ErrorKind};
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

type TestBody = Arc<dyn Fn(TestScope) -> BoxFuture<'static, E2eResult<()>> + Send + Sync>;

/// A single test case
#[derive(Clone)]
pub struct TestCase {
    /// Test name
    pub name: String,
    /// Fixtures set up before the body runs
    pub uses: Vec<String>,
    /// Overrides the configured test timeout
    pub timeout: Option<Duration>,
    body: TestBody,
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("uses", &self.uses)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl TestCase {
    /// Create a new test case
    #[must_use]
    pub fn new<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(TestScope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = E2eResult<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            uses: Vec::new(),
            timeout: None,
            body: Arc::new(move |scope| body(scope).boxed()),
        }
    }

    /// Declare a fixture the body depends on
    #[must_use]
    pub fn uses(mut self, fixture: impl Into<String>) -> Self {
        self.uses.push(fixture.into());
        self
    }

    /// Set timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A test suite: named cases sharing one fixture registry
#[derive(Debug, Clone)]
pub struct TestSuite {
    /// Suite name
    pub name: String,
    /// Fixtures available to every case
    pub fixtures: FixtureRegistry,
    /// Tests in this suite
    pub cases: Vec<TestCase>,
}

impl TestSuite {
    /// Create a new test suite
    #[must_use]
    pub fn new(name: impl Into<String>, fixtures: FixtureRegistry) -> Self {
        Self {
            name: name.into(),
            fixtures,
            cases: Vec::new(),
        }
    }

    /// Add a test case
    #[must_use]
    pub fn test(mut self, case: TestCase) -> Self {
        self.cases.push(case);
        self
    }

    /// Get the number of tests
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.cases.len()
    }

    /// Full title of a case, as matched by filters
    #[must_use]
    pub fn title(&self, case: &TestCase) -> String {
        format!("{} {}", self.name, case.name)
    }
}

/// Result of running a single test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Suite name
    pub suite: String,
    /// Test name
    pub name: String,
    /// Whether test passed
    pub passed: bool,
    /// Failure category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Error message if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Test duration in milliseconds
    pub duration_ms: u64,
}

impl TestResult {
    /// Create a passing test result
    #[must_use]
    pub fn pass(suite: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            name: name.into(),
            passed: true,
            error_kind: None,
            error: None,
            duration_ms: 0,
        }
    }

    /// Create a failing test result
    #[must_use]
    pub fn fail(
        suite: impl Into<String>,
        name: impl Into<String>,
        kind: ErrorKind,
        error: impl Into<String>,
    ) -> Self {
        Self {
            suite: suite.into(),
            name: name.into(),
            passed: false,
            error_kind: Some(kind),
            error: Some(error.into()),
            duration_ms: 0,
        }
    }

    /// Set duration
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = duration_ms(duration);
        self
    }
}

/// Results from running a test suite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteResults {
    /// Suite name
    pub suite_name: String,
    /// Individual test results, in declaration order
    pub results: Vec<TestResult>,
    /// Total duration in milliseconds
    pub duration_ms: u64,
}

impl SuiteResults {
    /// Check if all tests passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Count passed tests
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Count failed tests
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    /// Get total test count
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Get failed tests
    #[must_use]
    pub fn failures(&self) -> Vec<&TestResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }
}

type Failure = (ErrorKind, String);

fn failure(e: &E2eError) -> Failure {
    (e.kind(), e.to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "test body panicked".to_string())
}

/// Set up the fixtures a case declares; a panicking factory is a setup error
fn set_up_declared(scope: &TestScope, uses: &[String]) -> E2eResult<()> {
    for name in uses {
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| scope.ensure(name)));
        outcome.map_err(|payload| {
            let message = panic_message(payload.as_ref());
            E2eError::setup(name.as_str(), format!("factory panicked: {message}"))
        })??;
    }
    Ok(())
}

/// Runs suites against pages from a [`BrowserLauncher`]
#[derive(Debug, Clone)]
pub struct TestRunner {
    config: E2eConfig,
    launcher: Arc<dyn BrowserLauncher>,
}

impl TestRunner {
    /// Create a runner
    #[must_use]
    pub fn new(config: E2eConfig, launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self { config, launcher }
    }

    /// Runner configuration
    #[must_use]
    pub const fn config(&self) -> &E2eConfig {
        &self.config
    }

    /// Run every case whose title contains `filter` (all cases when `None`)
    pub async fn run(&self, suite: &TestSuite, filter: Option<&str>) -> SuiteResults {
        let start = Instant::now();
        let workers = self.config.effective_workers().max(1);
        let selected: Vec<(usize, &TestCase)> = suite
            .cases
            .iter()
            .enumerate()
            .filter(|(_, case)| filter.map_or(true, |f| suite.title(case).contains(f)))
            .collect();

        tracing::info!(
            suite = %suite.name,
            cases = selected.len(),
            workers,
            "running suite"
        );

        let mut results: Vec<(usize, TestResult)> = futures::stream::iter(selected)
            .map(|(index, case)| async move { (index, self.run_case(suite, case).await) })
            .buffer_unordered(workers)
            .collect()
            .await;
        results.sort_by_key(|(index, _)| *index);

        SuiteResults {
            suite_name: suite.name.clone(),
            results: results.into_iter().map(|(_, result)| result).collect(),
            duration_ms: duration_ms(start.elapsed()),
        }
    }

    async fn run_case(&self, suite: &TestSuite, case: &TestCase) -> TestResult {
        let start = Instant::now();
        let result = match self.execute(suite, case).await {
            Ok(()) => TestResult::pass(&suite.name, &case.name),
            Err((kind, message)) => TestResult::fail(&suite.name, &case.name, kind, message),
        }
        .with_duration(start.elapsed());

        tracing::info!(
            suite = %suite.name,
            test = %case.name,
            passed = result.passed,
            duration_ms = result.duration_ms,
            error = result.error.as_deref().unwrap_or(""),
            "test finished"
        );
        result
    }

    async fn execute(&self, suite: &TestSuite, case: &TestCase) -> Result<(), Failure> {
        let driver = self.launcher.new_driver().await;
        let page = PageHandle::new(driver.map_err(|e| failure(&e))?, &self.config);
        let scope = suite.fixtures.scope(page.clone());
        let timeout = case.timeout.unwrap_or_else(|| self.config.test_timeout());

        let body = async {
            set_up_declared(&scope, &case.uses)?;
            (case.body)(scope.clone()).await
        };

        let guarded = AssertUnwindSafe(body).catch_unwind();
        let outcome = match tokio::time::timeout(timeout, guarded).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) => Err(failure(&e)),
            Ok(Err(payload)) => Err((ErrorKind::Panic, panic_message(payload.as_ref()))),
            Err(_) => Err(failure(&E2eError::Timeout {
                operation: format!("test '{}'", suite.title(case)),
                ms: duration_ms(timeout),
            })),
        };

        let teardown = scope.teardown();
        drop(scope);
        if let Err(e) = page.close().await {
            tracing::warn!(test = %case.name, error = %e, "failed to close page");
        }

        outcome?;
        teardown.map_err(|e| failure(&e))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::browser::MockBrowser;
    use crate::driver::MockSite;
    use crate::page_object::PageObject;
    use crate::pages::HomePage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn runner() -> (TestRunner, Arc<MockBrowser>) {
        let browser = Arc::new(MockBrowser::new(MockSite::aisr()));
        let config = E2eConfig::new()
            .with_expect_timeout(50)
            .with_poll_interval(5)
            .with_test_timeout(2_000)
            .with_workers(2);
        (TestRunner::new(config, browser.clone()), browser)
    }

    fn fixtures() -> FixtureRegistry {
        let mut registry = FixtureRegistry::new();
        registry.page_object::<HomePage>("home_page");
        registry
    }

    mod outcome_tests {
        use super::*;

        struct Tracked;

        fn tracked_fixtures(torn: &Arc<AtomicUsize>) -> FixtureRegistry {
            let mut registry = fixtures();
            let torn = Arc::clone(torn);
            registry.register_with_teardown(
                "tracked",
                |_: &PageHandle| Ok(Tracked),
                move |_: &Tracked| {
                    torn.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
            );
            registry
        }

        async fn explode_after_setup() -> E2eResult<()> {
            panic!("after setup")
        }

        #[tokio::test]
        async fn test_cleanup_runs_on_every_exit_path() {
            let torn = Arc::new(AtomicUsize::new(0));
            let browser = Arc::new(MockBrowser::aisr());
            let config = E2eConfig::new()
                .with_expect_timeout(50)
                .with_poll_interval(5)
                .with_workers(4);
            let runner = TestRunner::new(config, browser.clone());

            let suite = TestSuite::new("Cleanup", tracked_fixtures(&torn))
                .test(
                    TestCase::new("fails", |_| async {
                        Err(E2eError::AssertionFailed {
                            message: "wrong text".to_string(),
                        })
                    })
                    .uses("tracked"),
                )
                .test(
                    TestCase::new("panics", |_| explode_after_setup()).uses("tracked"),
                )
                .test(
                    TestCase::new("hangs", |_| async {
                        tokio::time::sleep(Duration::from_secs(5)).await;
                        Ok(())
                    })
                    .uses("tracked")
                    .with_timeout(Duration::from_millis(20)),
                )
                .test(TestCase::new("lazy", |scope: TestScope| async move {
                    let _tracked = scope.fixture::<Tracked>("tracked")?;
                    Err::<(), _>(E2eError::PageClosed)
                }));

            let results = runner.run(&suite, None).await;
            let kinds: Vec<Option<ErrorKind>> =
                results.results.iter().map(|r| r.error_kind).collect();
            assert_eq!(
                kinds,
                vec![
                    Some(ErrorKind::Assertion),
                    Some(ErrorKind::Panic),
                    Some(ErrorKind::Timeout),
                    Some(ErrorKind::Browser),
                ]
            );
            assert_eq!(torn.load(Ordering::SeqCst), 4);
            assert_eq!(browser.pages_opened(), 4);
            assert_eq!(browser.pages_closed(), 4);
        }

        #[tokio::test]
        async fn test_panicking_factory_is_setup_failure() {
            let (runner, browser) = runner();
            let ran = Arc::new(AtomicUsize::new(0));
            let mut registry = fixtures();
            registry.register("exploding", |_: &PageHandle| -> E2eResult<Tracked> {
                panic!("factory blew up")
            });
            let counter = Arc::clone(&ran);
            let suite = TestSuite::new("Setup", registry).test(
                TestCase::new("uses exploding", move |_| {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                })
                .uses("exploding"),
            );

            let results = runner.run(&suite, None).await;
            let result = &results.results[0];
            assert_eq!(result.error_kind, Some(ErrorKind::Setup));
            let message = result.error.as_deref().unwrap();
            assert!(message.contains("exploding"));
            assert!(message.contains("factory blew up"));
            assert_eq!(ran.load(Ordering::SeqCst), 0);
            assert_eq!(browser.pages_closed(), 1);
        }

        #[tokio::test]
        async fn test_pass_and_fail() {
            let (runner, _) = runner();
            let suite = TestSuite::new("Outcomes", fixtures())
                .test(TestCase::new("passes", |_| async { Ok(()) }))
                .test(TestCase::new("fails", |_| async {
                    Err(E2eError::AssertionFailed {
                        message: "nope".to_string(),
                    })
                }));

            let results = runner.run(&suite, None).await;
            assert_eq!(results.total(), 2);
            assert_eq!(results.passed_count(), 1);
            assert!(!results.all_passed());
            let failed = results.failures()[0];
            assert_eq!(failed.name, "fails");
            assert_eq!(failed.error_kind, Some(ErrorKind::Assertion));
        }

        #[tokio::test]
        async fn test_panic_is_failure() {
            let (runner, _) = runner();
            async fn explode() -> E2eResult<()> {
                panic!("kaboom")
            }

            let suite =
                TestSuite::new("Panics", fixtures()).test(TestCase::new("panics", |_| explode()));
            let results = runner.run(&suite, None).await;
            let result = &results.results[0];
            assert!(!result.passed);
            assert_eq!(result.error_kind, Some(ErrorKind::Panic));
            assert_eq!(result.error.as_deref(), Some("kaboom"));
        }

        #[tokio::test]
        async fn test_timeout_is_failure() {
            let (runner, _) = runner();
            let suite = TestSuite::new("Slow", fixtures()).test(
                TestCase::new("sleeps", |_| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(())
                })
                .with_timeout(Duration::from_millis(20)),
            );
            let results = runner.run(&suite, None).await;
            assert_eq!(results.results[0].error_kind, Some(ErrorKind::Timeout));
        }

        #[tokio::test]
        async fn test_setup_failure_skips_body() {
            let (runner, _) = runner();
            let ran = Arc::new(AtomicUsize::new(0));
            let mut registry = fixtures();
            registry.register("broken", |_: &PageHandle| -> E2eResult<()> {
                Err(E2eError::driver("unavailable"))
            });
            let counter = Arc::clone(&ran);
            let suite = TestSuite::new("Setup", registry).test(
                TestCase::new("uses broken", move |_| {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                })
                .uses("broken"),
            );

            let results = runner.run(&suite, None).await;
            assert_eq!(results.results[0].error_kind, Some(ErrorKind::Setup));
            assert_eq!(ran.load(Ordering::SeqCst), 0);
        }
    }

    mod scheduling_tests {
        use super::*;

        #[tokio::test]
        async fn test_filter_and_order() {
            let (runner, browser) = runner();
            let mut suite = TestSuite::new("Order", fixtures());
            for (i, delay) in [30_u64, 1, 15].into_iter().enumerate() {
                suite = suite.test(TestCase::new(format!("case {i}"), move |_| async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    Ok(())
                }));
            }
            suite = suite.test(TestCase::new("other", |_| async { Ok(()) }));

            let results = runner.run(&suite, Some("case")).await;
            let names: Vec<&str> = results.results.iter().map(|r| r.name.as_str()).collect();
            assert_eq!(names, vec!["case 0", "case 1", "case 2"]);
            assert_eq!(browser.pages_opened(), 3);
        }

        #[tokio::test]
        async fn test_each_case_gets_its_own_page() {
            let (runner, _) = runner();
            let suite = TestSuite::new("Isolation", fixtures())
                .test(
                    TestCase::new("navigates", |scope: TestScope| async move {
                        let home = scope.fixture::<HomePage>("home_page")?;
                        home.goto().await
                    })
                    .uses("home_page"),
                )
                .test(TestCase::new("fresh page", |scope: TestScope| async move {
                    let url = scope.page().url().await?;
                    if url == "about:blank" {
                        Ok(())
                    } else {
                        Err(E2eError::AssertionFailed { message: url })
                    }
                }));
            assert!(runner.run(&suite, None).await.all_passed());
        }
    }

    #[test]
    fn test_results_serialize() {
        let result = TestResult::fail("Home Page", "x", ErrorKind::Timeout, "slow")
            .with_duration(Duration::from_millis(12));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["error_kind"], "timeout");
        assert_eq!(json["duration_ms"], 12);
        let pass = serde_json::to_value(TestResult::pass("s", "y")).unwrap();
        assert!(pass.get("error").is_none());
    }
}
