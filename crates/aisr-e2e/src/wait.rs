//! Wait Mechanisms
//!
//! Deadline-bounded polling used by locators and assertions. Polling yields
//! to the runtime between attempts so other test cases keep running.

use crate::result::E2eResult;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: crate::config::DEFAULT_EXPECT_TIMEOUT_MS,
            poll_interval_ms: crate::config::DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Run `attempt` until it yields a value or the deadline passes.
///
/// The attempt runs at least once, even with a zero timeout. Errors from an
/// attempt end the wait immediately. `Ok(None)` means the deadline passed.
pub async fn poll<T, F, Fut>(options: &WaitOptions, mut attempt: F) -> E2eResult<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = E2eResult<Option<T>>>,
{
    let deadline = Instant::now() + options.timeout();
    loop {
        if let Some(value) = attempt().await? {
            return Ok(Some(value));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        let pause = options.poll_interval().max(Duration::from_millis(1));
        tokio::time::sleep(pause.min(deadline - now)).await;
    }
}
