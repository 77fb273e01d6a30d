//! Browser automation seam.
//!
//! [`BrowserDriver`] is everything the page objects need from a browser:
//! navigate, locate elements, click, read the URL and close. The Chromium
//! implementation lives in [`crate::browser`]; [`MockDriver`] serves a
//! [`MockSite`] from memory for unit tests and offline runs.

use crate::locator::{AriaRole, Selector};
use crate::result::{E2eError, E2eResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use url::Url;

/// What a driver reports about one element at the time of the query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementSnapshot {
    /// Position among the page's candidate elements, used to act on it later
    pub index: usize,
    /// Lowercase tag name
    pub tag: String,
    /// `id` attribute
    pub id: Option<String>,
    /// Class list
    pub classes: Vec<String>,
    /// Explicit `role` attribute
    pub role: Option<String>,
    /// Accessible name (`aria-label` or text content)
    pub name: String,
    /// Full text content, trimmed
    pub text: String,
    /// Text of the element's own text nodes, trimmed
    pub own_text: String,
    /// `data-testid` attribute
    pub test_id: Option<String>,
    /// Rendered with a non-empty box and not hidden by style
    pub visible: bool,
}

impl ElementSnapshot {
    /// Create a visible element with the given tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            visible: true,
            ..Self::default()
        }
    }

    /// Set text content; also becomes the accessible name
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.name.clone_from(&text);
        self.own_text.clone_from(&text);
        self.text = text;
        self
    }

    /// Override the accessible name (`aria-label`)
    #[must_use]
    pub fn with_aria_label(mut self, label: impl Into<String>) -> Self {
        self.name = label.into();
        self
    }

    /// Set the `id` attribute
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a class
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Set an explicit role
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Set the `data-testid` attribute
    #[must_use]
    pub fn with_test_id(mut self, id: impl Into<String>) -> Self {
        self.test_id = Some(id.into());
        self
    }

    /// Mark the element as not rendered
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Computed ARIA role: explicit attribute first, then the tag's implicit role
    #[must_use]
    pub fn aria_role(&self) -> Option<AriaRole> {
        self.role
            .as_deref()
            .and_then(|role| role.split_whitespace().find_map(|r| r.parse().ok()))
            .or_else(|| AriaRole::implicit_for_tag(&self.tag))
    }
}

/// Abstract driver trait for browser automation.
///
/// One driver is bound to one isolated page for the duration of a test case.
#[async_trait]
pub trait BrowserDriver: Send + Sync + std::fmt::Debug {
    /// Navigate to an absolute URL and wait for the load to finish
    async fn navigate(&self, url: &str) -> E2eResult<()>;

    /// Snapshot every element matching the selector, in document order
    async fn locate(&self, selector: &Selector) -> E2eResult<Vec<ElementSnapshot>>;

    /// Click a previously located element
    async fn click(&self, selector: &Selector, element: &ElementSnapshot) -> E2eResult<()>;

    /// Get current URL
    async fn current_url(&self) -> E2eResult<String>;

    /// Release the page and its browser context
    async fn close(&self) -> E2eResult<()>;
}

/// In-memory website served by [`MockDriver`]
#[derive(Debug, Clone, Default)]
pub struct MockSite {
    routes: HashMap<String, Vec<ElementSnapshot>>,
    not_found: Vec<ElementSnapshot>,
    unreachable: bool,
    navigation_delay: Option<Duration>,
}

impl MockSite {
    /// Create an empty site
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The AISR front-end: one screen with the heading and subtitle on `/`
    #[must_use]
    pub fn aisr() -> Self {
        Self::new()
            .with_route(
                "/",
                vec![
                    ElementSnapshot::new("div")
                        .with_class("flex")
                        .with_class("min-h-screen"),
                    ElementSnapshot::new("div").with_class("text-center"),
                    ElementSnapshot::new("h1")
                        .with_class("text-4xl")
                        .with_class("font-bold")
                        .with_text("AISR"),
                    ElementSnapshot::new("p")
                        .with_class("mt-2")
                        .with_class("text-neutral-400")
                        .with_text("AI Spaced Repetition"),
                ],
            )
            .with_not_found(vec![ElementSnapshot::new("pre").with_text("Cannot GET")])
    }

    /// Serve `elements` at `path`
    #[must_use]
    pub fn with_route(mut self, path: impl Into<String>, elements: Vec<ElementSnapshot>) -> Self {
        let _ = self.routes.insert(normalize_path(&path.into()), elements);
        self
    }

    /// Page served for unknown routes
    #[must_use]
    pub fn with_not_found(mut self, elements: Vec<ElementSnapshot>) -> Self {
        self.not_found = elements;
        self
    }

    /// Fail every navigation as if the server were down
    #[must_use]
    pub const fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Delay every navigation
    #[must_use]
    pub const fn with_navigation_delay(mut self, delay: Duration) -> Self {
        self.navigation_delay = Some(delay);
        self
    }

    /// Elements rendered at `path`
    #[must_use]
    pub fn elements_for(&self, path: &str) -> &[ElementSnapshot] {
        self.routes
            .get(&normalize_path(path))
            .map_or(self.not_found.as_slice(), Vec::as_slice)
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[derive(Debug, Default)]
struct MockState {
    url: Option<Url>,
    call_history: Vec<String>,
    closed: bool,
}

/// Mock driver for unit testing
#[derive(Debug)]
pub struct MockDriver {
    site: Arc<MockSite>,
    state: Mutex<MockState>,
    close_counter: Option<Arc<AtomicUsize>>,
}

impl MockDriver {
    /// Create a driver serving `site`
    #[must_use]
    pub fn new(site: Arc<MockSite>) -> Self {
        Self {
            site,
            state: Mutex::new(MockState::default()),
            close_counter: None,
        }
    }

    /// Bump `counter` when the page is closed
    #[must_use]
    pub fn with_close_counter(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.close_counter = Some(counter);
        self
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().call_history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.lock()
            .call_history
            .iter()
            .any(|c| c.starts_with(method))
    }

    /// Whether `close` has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn navigate(&self, url: &str) -> E2eResult<()> {
        self.lock().call_history.push(format!("navigate:{url}"));

        if let Some(delay) = self.site.navigation_delay {
            tokio::time::sleep(delay).await;
        }
        if self.site.unreachable {
            return Err(E2eError::Navigation {
                url: url.to_string(),
                message: "net::ERR_CONNECTION_REFUSED".to_string(),
            });
        }
        let parsed = Url::parse(url).map_err(|e| E2eError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        self.lock().url = Some(parsed);
        Ok(())
    }

    async fn locate(&self, selector: &Selector) -> E2eResult<Vec<ElementSnapshot>> {
        let state = self.lock();
        let Some(url) = state.url.as_ref() else {
            return Ok(Vec::new());
        };
        Ok(self
            .site
            .elements_for(url.path())
            .iter()
            .enumerate()
            .filter(|(_, element)| selector.matches(element))
            .map(|(index, element)| ElementSnapshot {
                index,
                ..element.clone()
            })
            .collect())
    }

    async fn click(&self, selector: &Selector, element: &ElementSnapshot) -> E2eResult<()> {
        self.lock()
            .call_history
            .push(format!("click:{selector}#{}", element.index));
        Ok(())
    }

    async fn current_url(&self) -> E2eResult<String> {
        Ok(self
            .lock()
            .url
            .as_ref()
            .map_or_else(|| "about:blank".to_string(), Url::to_string))
    }

    async fn close(&self) -> E2eResult<()> {
        let mut state = self.lock();
        state.call_history.push("close".to_string());
        state.closed = true;
        if let Some(ref counter) = self.close_counter {
            let _ = counter.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }
}
