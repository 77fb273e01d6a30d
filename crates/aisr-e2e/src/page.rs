//! Page handle: one isolated browser page owned by one test case.

use crate::config::E2eConfig;
use crate::driver::{BrowserDriver, ElementSnapshot};
use crate::locator::{duration_ms, AriaRole, Locator, Selector};
use crate::result::{E2eError, E2eResult};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

struct PageInner {
    id: Uuid,
    driver: Box<dyn BrowserDriver>,
    base_url: String,
    navigation_timeout: Duration,
    expect_timeout: Duration,
    poll_interval: Duration,
    closed: AtomicBool,
}

/// Shared handle to a browser page.
///
/// Clones refer to the same page. Once [`PageHandle::close`] has run, every
/// operation on any clone fails with [`E2eError::PageClosed`].
#[derive(Clone)]
pub struct PageHandle {
    inner: Arc<PageInner>,
}

impl fmt::Debug for PageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageHandle")
            .field("id", &self.inner.id)
            .field("base_url", &self.inner.base_url)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl PageHandle {
    /// Wrap a driver with the timeouts and base URL from `config`
    #[must_use]
    pub fn new(driver: Box<dyn BrowserDriver>, config: &E2eConfig) -> Self {
        Self {
            inner: Arc::new(PageInner {
                id: Uuid::new_v4(),
                driver,
                base_url: config.base_url.clone(),
                navigation_timeout: config.navigation_timeout(),
                expect_timeout: config.expect_timeout(),
                poll_interval: config.poll_interval(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Unique page identifier, used in logs
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Base URL relative paths resolve against
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Default timeout for locators created on this page
    #[must_use]
    pub fn expect_timeout(&self) -> Duration {
        self.inner.expect_timeout
    }

    /// Polling interval for locators created on this page
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.inner.poll_interval
    }

    /// Whether the page has been closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Whether two handles refer to the same page
    #[must_use]
    pub fn same_page(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn ensure_open(&self) -> E2eResult<()> {
        if self.is_closed() {
            Err(E2eError::PageClosed)
        } else {
            Ok(())
        }
    }

    /// Resolve `path` against the base URL; `""` is the base URL itself
    pub fn resolve_url(&self, path: &str) -> E2eResult<String> {
        let base = Url::parse(&self.inner.base_url).map_err(|e| {
            E2eError::config(format!("invalid base_url '{}': {e}", self.inner.base_url))
        })?;
        let resolved = base.join(path).map_err(|e| E2eError::Navigation {
            url: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(resolved.to_string())
    }

    /// Navigate to `path` and wait for the load to complete
    pub async fn goto(&self, path: &str) -> E2eResult<()> {
        self.ensure_open()?;
        let url = self.resolve_url(path)?;
        tracing::debug!(page = %self.inner.id, %url, "navigating");

        let timeout = self.inner.navigation_timeout;
        let navigation = self.inner.driver.navigate(&url);
        match tokio::time::timeout(timeout, navigation).await {
            Ok(result) => result,
            Err(_) => Err(E2eError::Timeout {
                operation: format!("navigating to {url}"),
                ms: duration_ms(timeout),
            }),
        }
    }

    /// Current URL of the page
    pub async fn url(&self) -> E2eResult<String> {
        self.ensure_open()?;
        self.inner.driver.current_url().await
    }

    pub(crate) async fn url_or_blank(&self) -> String {
        self.url()
            .await
            .unwrap_or_else(|_| "about:blank".to_string())
    }

    /// Snapshot the elements matching `selector` right now
    pub async fn query(&self, selector: &Selector) -> E2eResult<Vec<ElementSnapshot>> {
        self.ensure_open()?;
        self.inner.driver.locate(selector).await
    }

    pub(crate) async fn click_element(
        &self,
        selector: &Selector,
        element: &ElementSnapshot,
    ) -> E2eResult<()> {
        self.ensure_open()?;
        self.inner.driver.click(selector, element).await
    }

    /// Deferred locator for an arbitrary selector
    #[must_use]
    pub fn locator(&self, selector: Selector) -> Locator {
        Locator::new(self.clone(), selector)
    }

    /// Deferred locator by role and accessible name
    #[must_use]
    pub fn get_by_role(&self, role: AriaRole, name: impl Into<String>) -> Locator {
        self.locator(Selector::role(role).with_name(name))
    }

    /// Deferred locator by text content
    #[must_use]
    pub fn get_by_text(&self, text: impl Into<String>) -> Locator {
        self.locator(Selector::text(text))
    }

    /// Deferred locator by `data-testid`
    #[must_use]
    pub fn get_by_test_id(&self, id: impl Into<String>) -> Locator {
        self.locator(Selector::test_id(id))
    }

    /// Close the page. Idempotent; only the first call reaches the driver.
    pub async fn close(&self) -> E2eResult<()> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        tracing::debug!(page = %self.inner.id, "closing page");
        self.inner.driver.close().await
    }
}
