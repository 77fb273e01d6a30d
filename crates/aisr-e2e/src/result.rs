//! Result and error types for the AISR end-to-end harness.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for harness operations
pub type E2eResult<T> = Result<T, E2eError>;

/// Errors that can occur while driving the browser or running a test case
#[derive(Debug, Error)]
pub enum E2eError {
    /// Navigation target unreachable or browser-level failure
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Locator matched nothing before its deadline
    #[error("Element not found: {selector} on {url} (waited {timeout_ms}ms)")]
    ElementNotFound {
        /// Locator description
        selector: String,
        /// Page URL at the time of the failure
        url: String,
        /// How long the locator waited
        timeout_ms: u64,
    },

    /// An awaited condition exceeded its deadline
    #[error("Timed out after {ms}ms: {operation}")]
    Timeout {
        /// What was being awaited
        operation: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Fixture construction failed
    #[error("Fixture '{fixture}' setup failed: {message}")]
    Setup {
        /// Fixture name
        fixture: String,
        /// Error message
        message: String,
    },

    /// Fixture teardown failed
    #[error("Fixture '{fixture}' teardown failed: {message}")]
    Teardown {
        /// Fixture name
        fixture: String,
        /// Error message
        message: String,
    },

    /// A single-element operation resolved to several elements
    #[error("Strict mode violation: {selector} resolved to {count} elements on {url}")]
    StrictModeViolation {
        /// Locator description
        selector: String,
        /// Page URL at the time of the failure
        url: String,
        /// Number of matches
        count: usize,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Operation on a page that has already been closed
    #[error("Page has been closed")]
    PageClosed,

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Browser protocol error outside navigation
    #[error("Browser driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

/// Coarse error category used in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Navigation failed
    Navigation,
    /// Element not found
    ElementNotFound,
    /// Deadline exceeded
    Timeout,
    /// Fixture setup or teardown failed
    Setup,
    /// Assertion or strictness failure
    Assertion,
    /// Browser or driver failure
    Browser,
    /// Configuration or I/O failure
    Config,
    /// Test body panicked
    Panic,
}

impl E2eError {
    /// Create a setup error for a fixture
    #[must_use]
    pub fn setup(fixture: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Setup {
            fixture: fixture.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Report category of this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Navigation { .. } => ErrorKind::Navigation,
            Self::ElementNotFound { .. } => ErrorKind::ElementNotFound,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Setup { .. } | Self::Teardown { .. } => ErrorKind::Setup,
            Self::StrictModeViolation { .. } | Self::AssertionFailed { .. } => {
                ErrorKind::Assertion
            }
            Self::PageClosed | Self::BrowserLaunch { .. } | Self::Driver { .. } => {
                ErrorKind::Browser
            }
            Self::Config { .. } | Self::Io(_) | Self::Json(_) | Self::Yaml(_) => ErrorKind::Config,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_element_not_found_names_selector_and_page() {
        let err = E2eError::ElementNotFound {
            selector: "getByRole('heading', { name: 'AISR' })".to_string(),
            url: "http://localhost:5173/missing".to_string(),
            timeout_ms: 5000,
        };
        let message = err.to_string();
        assert!(message.contains("getByRole('heading'"));
        assert!(message.contains("/missing"));
        assert!(message.contains("5000ms"));
        assert_eq!(err.kind(), ErrorKind::ElementNotFound);
    }

    #[test]
    fn test_setup_constructor() {
        let err = E2eError::setup("home_page", "boom");
        assert_eq!(err.to_string(), "Fixture 'home_page' setup failed: boom");
        assert_eq!(err.kind(), ErrorKind::Setup);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(E2eError::PageClosed.kind(), ErrorKind::Browser);
        assert_eq!(
            E2eError::StrictModeViolation {
                selector: "p".to_string(),
                url: "about:blank".to_string(),
                count: 2
            }
            .kind(),
            ErrorKind::Assertion
        );
        assert_eq!(E2eError::config("bad").kind(), ErrorKind::Config);
        assert_eq!(
            E2eError::Timeout {
                operation: "navigation".to_string(),
                ms: 10
            }
            .kind(),
            ErrorKind::Timeout
        );
    }

    #[test]
    fn test_io_conversion() {
        let err: E2eError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, E2eError::Io(_)));
    }
}
