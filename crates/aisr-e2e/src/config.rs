//! Harness configuration.
//!
//! Values are layered: defaults, then an optional YAML file, then
//! `AISR_E2E_*` environment variables. The CLI applies its flags last.

use crate::result::{E2eError, E2eResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Base URL of the Vite dev server that serves the front-end
pub const DEFAULT_BASE_URL: &str = "http://localhost:5173";

/// Default navigation timeout (30 seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Default timeout for `expect` assertions (5 seconds)
pub const DEFAULT_EXPECT_TIMEOUT_MS: u64 = 5_000;

/// Default timeout for a whole test case (30 seconds)
pub const DEFAULT_TEST_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval for auto-waiting (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Prefix of the environment variables read by [`E2eConfig::apply_env`]
pub const ENV_PREFIX: &str = "AISR_E2E_";

/// Configuration for browser sessions and test execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct E2eConfig {
    /// URL that relative navigation paths resolve against
    pub base_url: String,
    /// Run the browser without a window
    pub headless: bool,
    /// Deadline for a single navigation
    pub navigation_timeout_ms: u64,
    /// Deadline for `expect` assertions and locator auto-waiting
    pub expect_timeout_ms: u64,
    /// Deadline for a whole test case
    pub test_timeout_ms: u64,
    /// Polling interval for auto-waiting
    pub poll_interval_ms: u64,
    /// Concurrent test cases (0 = one per CPU)
    pub workers: usize,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for E2eConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            headless: true,
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            expect_timeout_ms: DEFAULT_EXPECT_TIMEOUT_MS,
            test_timeout_ms: DEFAULT_TEST_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            workers: 0,
            viewport_width: 1280,
            viewport_height: 720,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl E2eConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML document; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> E2eResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load a YAML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> E2eResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| E2eError::config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_yaml_str(&content)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> E2eResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Apply `AISR_E2E_*` overrides from the process environment
    pub fn apply_env(self) -> E2eResult<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply `AISR_E2E_*` overrides from an arbitrary lookup
    pub fn apply_env_from<F>(mut self, lookup: F) -> E2eResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(url) = var("BASE_URL") {
            self.base_url = url;
        }
        if let Some(value) = var("HEADLESS") {
            self.headless = parse_env("HEADLESS", &value)?;
        }
        if let Some(value) = var("NAVIGATION_TIMEOUT_MS") {
            self.navigation_timeout_ms = parse_env("NAVIGATION_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = var("EXPECT_TIMEOUT_MS") {
            self.expect_timeout_ms = parse_env("EXPECT_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = var("TEST_TIMEOUT_MS") {
            self.test_timeout_ms = parse_env("TEST_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = var("POLL_INTERVAL_MS") {
            self.poll_interval_ms = parse_env("POLL_INTERVAL_MS", &value)?;
        }
        if let Some(value) = var("WORKERS") {
            self.workers = parse_env("WORKERS", &value)?;
        }
        if let Some(value) = var("VIEWPORT_WIDTH") {
            self.viewport_width = parse_env("VIEWPORT_WIDTH", &value)?;
        }
        if let Some(value) = var("VIEWPORT_HEIGHT") {
            self.viewport_height = parse_env("VIEWPORT_HEIGHT", &value)?;
        }
        if let Some(path) = var("CHROMIUM_PATH") {
            self.chromium_path = Some(path);
        }
        if let Some(value) = var("SANDBOX") {
            self.sandbox = parse_env("SANDBOX", &value)?;
        }
        Ok(self)
    }

    /// Reject configurations that cannot drive a browser
    pub fn validate(&self) -> E2eResult<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| E2eError::config(format!("invalid base_url '{}': {e}", self.base_url)))?;
        if url.cannot_be_a_base() {
            return Err(E2eError::config(format!(
                "base_url '{}' cannot be used as a base",
                self.base_url
            )));
        }
        for (name, value) in [
            ("navigation_timeout_ms", self.navigation_timeout_ms),
            ("expect_timeout_ms", self.expect_timeout_ms),
            ("test_timeout_ms", self.test_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
        ] {
            if value == 0 {
                let message = format!("{name} must be greater than zero");
                return Err(E2eError::config(message));
            }
        }
        Ok(())
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the navigation timeout
    #[must_use]
    pub const fn with_navigation_timeout(mut self, timeout_ms: u64) -> Self {
        self.navigation_timeout_ms = timeout_ms;
        self
    }

    /// Set the expect timeout
    #[must_use]
    pub const fn with_expect_timeout(mut self, timeout_ms: u64) -> Self {
        self.expect_timeout_ms = timeout_ms;
        self
    }

    /// Set the per-test timeout
    #[must_use]
    pub const fn with_test_timeout(mut self, timeout_ms: u64) -> Self {
        self.test_timeout_ms = timeout_ms;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval_ms: u64) -> Self {
        self.poll_interval_ms = interval_ms;
        self
    }

    /// Set the number of workers
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Navigation timeout as a duration
    #[must_use]
    pub const fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    /// Expect timeout as a duration
    #[must_use]
    pub const fn expect_timeout(&self) -> Duration {
        Duration::from_millis(self.expect_timeout_ms)
    }

    /// Test timeout as a duration
    #[must_use]
    pub const fn test_timeout(&self) -> Duration {
        Duration::from_millis(self.test_timeout_ms)
    }

    /// Poll interval as a duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Get effective number of workers
    #[must_use]
    #[allow(clippy::redundant_closure_for_method_calls)]
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            self.workers
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> E2eResult<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| {
        E2eError::config(format!("{ENV_PREFIX}{name}='{value}' is invalid: {e}"))
    })
}
