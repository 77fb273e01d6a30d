//! Page Object Model Support
//!
//! A page object wraps one logical screen behind named accessors, so tests
//! say "go to the home page, get the heading" instead of juggling selectors.
//!
//! Concrete pages compose a [`BasePage`] (one level, no deeper hierarchy) and
//! implement [`PageObject`], which pins their canonical route.

use crate::page::PageHandle;
use crate::result::E2eResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use url::Url;

/// Navigation state of a page object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// Never navigated
    Unattached,
    /// A navigation has been issued
    Attached,
}

/// Shared capability of every page object: hold the page, navigate it.
#[derive(Debug)]
pub struct BasePage {
    page: PageHandle,
    attached: AtomicBool,
}

impl BasePage {
    /// Wrap a page handle. Does not touch the browser.
    #[must_use]
    pub fn new(page: PageHandle) -> Self {
        Self {
            page,
            attached: AtomicBool::new(false),
        }
    }

    /// The wrapped page
    #[must_use]
    pub const fn page(&self) -> &PageHandle {
        &self.page
    }

    /// Current navigation state
    #[must_use]
    pub fn state(&self) -> PageState {
        if self.attached.load(Ordering::Acquire) {
            PageState::Attached
        } else {
            PageState::Unattached
        }
    }

    /// Navigate to `path` relative to the base URL.
    ///
    /// The page object counts as attached as soon as the navigation is
    /// issued, even if the browser later reports a failure.
    pub async fn goto(&self, path: &str) -> E2eResult<()> {
        self.attached.store(true, Ordering::Release);
        self.page.goto(path).await
    }
}

/// Trait for page objects representing one screen of the application.
///
/// # Example
///
/// ```ignore
/// struct CardsPage {
///     base: BasePage,
/// }
///
/// impl PageObject for CardsPage {
///     const ROUTE: &'static str = "/cards";
///
///     fn from_page(page: PageHandle) -> Self {
///         Self { base: BasePage::new(page) }
///     }
///
///     fn base(&self) -> &BasePage {
///         &self.base
///     }
/// }
/// ```
#[async_trait]
pub trait PageObject: Send + Sync + Sized + 'static {
    /// Canonical route of this page (e.g., "/", "/users/:id")
    const ROUTE: &'static str;

    /// Construct the page object around a page handle
    fn from_page(page: PageHandle) -> Self;

    /// Shared base capabilities
    fn base(&self) -> &BasePage;

    /// The wrapped page
    fn page(&self) -> &PageHandle {
        self.base().page()
    }

    /// Get the page name for logging/debugging
    fn page_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Navigate to the canonical route
    async fn goto(&self) -> E2eResult<()> {
        self.base().goto(Self::ROUTE).await
    }

    /// Navigation state
    fn state(&self) -> PageState {
        self.base().state()
    }

    /// Whether a navigation has been issued
    fn is_attached(&self) -> bool {
        self.state() == PageState::Attached
    }

    /// Whether the browser currently shows this page's route
    async fn is_current(&self) -> E2eResult<bool> {
        let url = self.page().url().await?;
        let path = Url::parse(&url)
            .map_or_else(|_| url.clone(), |u| u.path().to_string());
        Ok(UrlMatcher::new(Self::ROUTE).matches(&path))
    }
}

/// URL pattern matcher for page objects
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    pattern: String,
    segments: Vec<UrlSegment>,
}

#[derive(Debug, Clone)]
enum UrlSegment {
    Literal(String),
    Wildcard,
    Parameter(String),
}

impl UrlMatcher {
    /// Create a new URL matcher from a pattern
    ///
    /// Patterns support:
    /// - Literal segments: `/login`
    /// - Wildcards: `/users/*`
    /// - Named parameters: `/users/:id`
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s == "*" {
                    UrlSegment::Wildcard
                } else if let Some(name) = s.strip_prefix(':') {
                    UrlSegment::Parameter(name.to_string())
                } else {
                    UrlSegment::Literal(s.to_string())
                }
            })
            .collect();

        Self {
            pattern: pattern.to_string(),
            segments,
        }
    }

    /// Check if a URL path matches the pattern
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        // wildcards and parameters each consume exactly one segment
        if path_segments.len() != self.segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(&path_segments)
            .all(|(segment, actual)| match segment {
                UrlSegment::Literal(lit) => lit == actual,
                UrlSegment::Wildcard | UrlSegment::Parameter(_) => true,
            })
    }

    /// Extract parameters from a URL path
    #[must_use]
    pub fn extract_params(&self, path: &str) -> HashMap<String, String> {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        self.segments
            .iter()
            .zip(&path_segments)
            .filter_map(|(segment, value)| match segment {
                UrlSegment::Parameter(name) => Some((name.clone(), (*value).to_string())),
                _ => None,
            })
            .collect()
    }

    /// Get the original pattern
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::E2eConfig;
    use crate::driver::{MockDriver, MockSite};
    use std::sync::Arc;

    mod url_matcher_tests {
        use super::*;

        #[test]
        fn test_root_pattern() {
            let matcher = UrlMatcher::new("/");
            assert!(matcher.matches("/"));
            assert!(matcher.matches(""));
            assert!(!matcher.matches("/cards"));
        }

        #[test]
        fn test_literal_match() {
            let matcher = UrlMatcher::new("/login");
            assert!(matcher.matches("/login"));
            assert!(!matcher.matches("/register"));
            assert!(!matcher.matches("/login/extra"));
        }

        #[test]
        fn test_wildcard_match() {
            let matcher = UrlMatcher::new("/users/*");
            assert!(matcher.matches("/users/123"));
            assert!(!matcher.matches("/users"));
            assert!(!matcher.matches("/other/123"));
        }

        #[test]
        fn test_extract_params() {
            let matcher = UrlMatcher::new("/decks/:deck/cards/:card");
            let params = matcher.extract_params("/decks/7/cards/42");

            assert_eq!(params.get("deck"), Some(&"7".to_string()));
            assert_eq!(params.get("card"), Some(&"42".to_string()));
            assert_eq!(matcher.pattern(), "/decks/:deck/cards/:card");
        }
    }

    mod page_object_trait_tests {
        use super::*;

        #[derive(Debug)]
        struct DeckPage {
            base: BasePage,
        }

        impl PageObject for DeckPage {
            const ROUTE: &'static str = "/decks/:id";

            fn from_page(page: PageHandle) -> Self {
                Self {
                    base: BasePage::new(page),
                }
            }

            fn base(&self) -> &BasePage {
                &self.base
            }
        }

        fn page() -> PageHandle {
            PageHandle::new(
                Box::new(MockDriver::new(Arc::new(MockSite::aisr()))),
                &E2eConfig::new(),
            )
        }

        #[test]
        fn test_construction_is_unattached() {
            let deck = DeckPage::from_page(page());
            assert_eq!(deck.state(), PageState::Unattached);
            assert!(!deck.is_attached());
            assert!(deck.page_name().contains("DeckPage"));
        }

        #[tokio::test]
        async fn test_base_goto_attaches() {
            let deck = DeckPage::from_page(page());
            deck.base().goto("/decks/3").await.unwrap();
            assert!(deck.is_attached());
            assert!(deck.is_current().await.unwrap());
        }

        #[tokio::test]
        async fn test_failed_navigation_still_attached() {
            let page = PageHandle::new(
                Box::new(MockDriver::new(Arc::new(MockSite::aisr().unreachable()))),
                &E2eConfig::new(),
            );
            let deck = DeckPage::from_page(page);
            assert!(deck.base().goto("/decks/3").await.is_err());
            assert_eq!(deck.state(), PageState::Attached);
        }
    }
}
