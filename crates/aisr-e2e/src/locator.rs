//! Locator abstraction for element selection.
//!
//! A [`Locator`] is a deferred description of how to find an element on a
//! page. Building one never talks to the browser; resolution happens only
//! when it is queried, waited on, clicked or asserted against.
//!
//! # Design Philosophy
//!
//! - **Auto-Waiting**: single-element operations poll until the element is actionable
//! - **Strict Selection**: fails if multiple elements match
//! - **Accessible Queries**: role and accessible-name selectors mirror what users perceive

use crate::driver::ElementSnapshot;
use crate::page::PageHandle;
use crate::result::{E2eError, E2eResult};
use crate::wait::{self, WaitOptions};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// ARIA roles the harness can query by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AriaRole {
    /// `alert`
    Alert,
    /// `article`
    Article,
    /// `banner`
    Banner,
    /// `button`
    Button,
    /// `checkbox`
    Checkbox,
    /// `dialog`
    Dialog,
    /// `heading`
    Heading,
    /// `img`
    Img,
    /// `link`
    Link,
    /// `list`
    List,
    /// `listitem`
    ListItem,
    /// `main`
    Main,
    /// `navigation`
    Navigation,
    /// `paragraph`
    Paragraph,
    /// `textbox`
    Textbox,
}

impl AriaRole {
    const ALL: [Self; 15] = [
        Self::Alert,
        Self::Article,
        Self::Banner,
        Self::Button,
        Self::Checkbox,
        Self::Dialog,
        Self::Heading,
        Self::Img,
        Self::Link,
        Self::List,
        Self::ListItem,
        Self::Main,
        Self::Navigation,
        Self::Paragraph,
        Self::Textbox,
    ];

    /// ARIA name of the role
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Article => "article",
            Self::Banner => "banner",
            Self::Button => "button",
            Self::Checkbox => "checkbox",
            Self::Dialog => "dialog",
            Self::Heading => "heading",
            Self::Img => "img",
            Self::Link => "link",
            Self::List => "list",
            Self::ListItem => "listitem",
            Self::Main => "main",
            Self::Navigation => "navigation",
            Self::Paragraph => "paragraph",
            Self::Textbox => "textbox",
        }
    }

    /// Implicit role of an HTML tag
    #[must_use]
    pub fn implicit_for_tag(tag: &str) -> Option<Self> {
        let role = match tag.to_ascii_lowercase().as_str() {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Self::Heading,
            "button" => Self::Button,
            "a" => Self::Link,
            "img" => Self::Img,
            "ul" | "ol" => Self::List,
            "li" => Self::ListItem,
            "main" => Self::Main,
            "nav" => Self::Navigation,
            "p" => Self::Paragraph,
            "article" => Self::Article,
            "header" => Self::Banner,
            "dialog" => Self::Dialog,
            "input" | "textarea" => Self::Textbox,
            _ => return None,
        };
        Some(role)
    }
}

impl fmt::Display for AriaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AriaRole {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == wanted)
            .ok_or_else(|| E2eError::config(format!("unknown ARIA role '{s}'")))
    }
}

/// Whitespace-normalized text comparison.
///
/// Exact matching compares whole strings; otherwise the expected text is a
/// case-insensitive substring.
#[must_use]
pub fn text_matches(actual: &str, expected: &str, exact: bool) -> bool {
    let actual = normalize_whitespace(actual);
    let expected = normalize_whitespace(expected);
    if exact {
        actual == expected
    } else {
        actual.to_lowercase().contains(&expected.to_lowercase())
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// Text content selector
    Text {
        /// Text to match
        text: String,
        /// Require a whole-string, case-sensitive match
        exact: bool,
    },
    /// Test ID selector (data-testid attribute)
    TestId(String),
    /// Role selector with optional accessible name
    Role {
        /// ARIA role
        role: AriaRole,
        /// Accessible name to match
        name: Option<String>,
        /// Require a whole-string, case-sensitive name match
        exact: bool,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            exact: false,
        }
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create a role selector
    #[must_use]
    pub const fn role(role: AriaRole) -> Self {
        Self::Role {
            role,
            name: None,
            exact: false,
        }
    }

    /// Restrict a role selector to an accessible name
    #[must_use]
    pub fn with_name(self, name: impl Into<String>) -> Self {
        match self {
            Self::Role { role, exact, .. } => Self::Role {
                role,
                name: Some(name.into()),
                exact,
            },
            other => other,
        }
    }

    /// Require exact text or name matching
    #[must_use]
    pub fn exact(self) -> Self {
        match self {
            Self::Text { text, .. } => Self::Text { text, exact: true },
            Self::Role { role, name, .. } => Self::Role {
                role,
                name,
                exact: true,
            },
            other => other,
        }
    }

    /// Whether an element snapshot satisfies this selector.
    ///
    /// CSS support is limited to compound selectors of tag, `#id` and
    /// `.class` parts; real browsers evaluate CSS themselves.
    #[must_use]
    pub fn matches(&self, element: &ElementSnapshot) -> bool {
        match self {
            Self::Css(css) => simple_css_matches(css, element),
            Self::Text { text, exact } => {
                !element.own_text.is_empty() && text_matches(&element.own_text, text, *exact)
            }
            Self::TestId(id) => element.test_id.as_deref() == Some(id.as_str()),
            Self::Role { role, name, exact } => {
                element.aria_role() == Some(*role)
                    && name
                        .as_deref()
                        .map_or(true, |name| text_matches(&element.name, name, *exact))
            }
        }
    }
}

fn simple_css_matches(css: &str, element: &ElementSnapshot) -> bool {
    let css = css.trim();
    if css.is_empty() || css.contains([' ', '>', '[', ':', ',', '+', '~']) {
        return false;
    }

    let mut tag = String::new();
    let mut parts: Vec<(char, String)> = Vec::new();
    for ch in css.chars() {
        match ch {
            '#' | '.' => parts.push((ch, String::new())),
            c => match parts.last_mut() {
                Some((_, value)) => value.push(c),
                None => tag.push(c),
            },
        }
    }

    let tag_ok = tag.is_empty() || tag == "*" || tag.eq_ignore_ascii_case(&element.tag);
    tag_ok
        && parts.iter().all(|(kind, value)| match kind {
            '#' => element.id.as_deref() == Some(value.as_str()),
            _ => element.classes.iter().any(|c| c == value),
        })
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => write!(f, "locator('{css}')"),
            Self::Text { text, exact: false } => write!(f, "getByText('{text}')"),
            Self::Text { text, exact: true } => {
                write!(f, "getByText('{text}', {{ exact: true }})")
            }
            Self::TestId(id) => write!(f, "getByTestId('{id}')"),
            Self::Role {
                role, name: None, ..
            } => write!(f, "getByRole('{role}')"),
            Self::Role {
                role,
                name: Some(name),
                exact,
            } => {
                write!(f, "getByRole('{role}', {{ name: '{name}'")?;
                if *exact {
                    f.write_str(", exact: true")?;
                }
                f.write_str(" })")
            }
        }
    }
}

/// States a locator can wait for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    /// At least one element matches
    Attached,
    /// A matching element is visible
    Visible,
    /// No matching element is visible
    Hidden,
    /// Nothing matches
    Detached,
}

impl ElementState {
    /// `None` while the state does not hold yet; otherwise the element the
    /// state was observed on, if any.
    fn observe(self, elements: Vec<ElementSnapshot>) -> Option<Option<ElementSnapshot>> {
        match self {
            Self::Attached => elements.into_iter().next().map(Some),
            Self::Visible => elements.into_iter().find(|e| e.visible).map(Some),
            Self::Hidden => {
                if elements.iter().any(|e| e.visible) {
                    None
                } else {
                    Some(elements.into_iter().next())
                }
            }
            Self::Detached => elements.is_empty().then_some(None),
        }
    }
}

impl fmt::Display for ElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Attached => "attached",
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::Detached => "detached",
        })
    }
}

/// Locator options for customizing behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatorOptions {
    /// Timeout for auto-waiting
    pub timeout: Duration,
    /// Polling interval for auto-waiting
    pub poll_interval: Duration,
    /// Whether to require strict single-element match
    pub strict: bool,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(crate::config::DEFAULT_EXPECT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(crate::config::DEFAULT_POLL_INTERVAL_MS),
            strict: true,
        }
    }
}

impl LocatorOptions {
    pub(crate) fn wait_options(&self) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(duration_ms(self.timeout))
            .with_poll_interval(duration_ms(self.poll_interval))
    }
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// A locator for finding and interacting with elements on one page.
#[derive(Debug, Clone)]
pub struct Locator {
    page: PageHandle,
    selector: Selector,
    options: LocatorOptions,
}

impl Locator {
    /// Bind a selector to a page; nothing is resolved yet
    #[must_use]
    pub fn new(page: PageHandle, selector: Selector) -> Self {
        let options = LocatorOptions {
            timeout: page.expect_timeout(),
            poll_interval: page.poll_interval(),
            strict: true,
        };
        Self {
            page,
            selector,
            options,
        }
    }

    /// Set a custom timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Disable strict mode (allow multiple matches)
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the options
    #[must_use]
    pub const fn options(&self) -> &LocatorOptions {
        &self.options
    }

    /// Page this locator resolves against
    #[must_use]
    pub const fn page(&self) -> &PageHandle {
        &self.page
    }

    /// Snapshot all current matches without waiting
    pub async fn all(&self) -> E2eResult<Vec<ElementSnapshot>> {
        self.page.query(&self.selector).await
    }

    /// Number of current matches without waiting
    pub async fn count(&self) -> E2eResult<usize> {
        Ok(self.all().await?.len())
    }

    /// Whether the single matching element is visible right now
    pub async fn is_visible(&self) -> E2eResult<bool> {
        let elements = self.all().await?;
        self.check_strict(&elements).await?;
        Ok(elements.first().is_some_and(|e| e.visible))
    }

    /// Wait until the locator reaches `state`.
    ///
    /// Returns the element the state was observed on (`None` for
    /// [`ElementState::Detached`] and for hidden-because-absent).
    pub async fn wait_for(&self, state: ElementState) -> E2eResult<Option<ElementSnapshot>> {
        let matched = AtomicUsize::new(0);
        let outcome = wait::poll(&self.options.wait_options(), || {
            let matched = &matched;
            async move {
                let elements = self.all().await?;
                matched.store(elements.len(), Ordering::Relaxed);
                self.check_strict(&elements).await?;
                Ok(state.observe(elements))
            }
        })
        .await?;

        match outcome {
            Some(element) => Ok(element),
            None => Err(self
                .deadline_error(state, matched.load(Ordering::Relaxed))
                .await),
        }
    }

    /// Text content of the single matching element, waiting for it to attach
    pub async fn text_content(&self) -> E2eResult<String> {
        let element = self.require(ElementState::Attached).await?;
        Ok(element.text)
    }

    /// Click the single matching element once it is visible
    pub async fn click(&self) -> E2eResult<()> {
        let element = self.require(ElementState::Visible).await?;
        self.page.click_element(&self.selector, &element).await
    }

    async fn require(&self, state: ElementState) -> E2eResult<ElementSnapshot> {
        match self.wait_for(state).await? {
            Some(element) => Ok(element),
            None => Err(self.deadline_error(state, 0).await),
        }
    }

    pub(crate) async fn check_strict(&self, elements: &[ElementSnapshot]) -> E2eResult<()> {
        if self.options.strict && elements.len() > 1 {
            return Err(E2eError::StrictModeViolation {
                selector: self.selector.to_string(),
                url: self.page.url_or_blank().await,
                count: elements.len(),
            });
        }
        Ok(())
    }

    pub(crate) async fn deadline_error(
        &self,
        state: ElementState,
        last_matched: usize,
    ) -> E2eError {
        let timeout_ms = duration_ms(self.options.timeout);
        let url = self.page.url_or_blank().await;
        if last_matched == 0 && matches!(state, ElementState::Attached | ElementState::Visible) {
            E2eError::ElementNotFound {
                selector: self.selector.to_string(),
                url,
                timeout_ms,
            }
        } else {
            E2eError::Timeout {
                operation: format!("waiting for {} to be {state} on {url}", self.selector),
                ms: timeout_ms,
            }
        }
    }
}
