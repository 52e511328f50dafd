//! Result and error types for ats-probe.

use thiserror::Error;

/// Result type for ats-probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving the application under test
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Wait condition did not hold within the timeout
    #[error("Element not ready: {query} was not {condition} after {waited_ms}ms{}", last_error_suffix(.last_error.as_deref()))]
    ElementNotReady {
        /// Locator description
        query: String,
        /// Condition that was polled for
        condition: String,
        /// Time spent polling
        waited_ms: u64,
        /// Last driver error observed while polling
        last_error: Option<String>,
    },

    /// Every interaction strategy for an action failed
    #[error("Interaction failed on {target}: {message}")]
    InteractionFailed {
        /// Locator or element description
        target: String,
        /// Last underlying error
        message: String,
    },

    /// Post-action verification of the page did not hold
    #[error("Navigation failed: expected {expected}, current URL {actual}")]
    NavigationFailed {
        /// What the page should have shown
        expected: String,
        /// URL (or title) last observed
        actual: String,
    },

    /// Raw driver error
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Session used after it was closed
    #[error("Browser session is closed")]
    SessionClosed,

    /// Soft or hard assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
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

fn last_error_suffix(last_error: Option<&str>) -> String {
    last_error.map_or_else(String::new, |e| format!(" (last error: {e})"))
}

impl ProbeError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create an interaction failure
    #[must_use]
    pub fn interaction(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InteractionFailed {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a navigation failure
    #[must_use]
    pub fn navigation(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::NavigationFailed {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// True for `ElementNotReady`
    #[must_use]
    pub const fn is_not_ready(&self) -> bool {
        matches!(self, Self::ElementNotReady { .. })
    }

    /// True for `InteractionFailed`
    #[must_use]
    pub const fn is_interaction_failure(&self) -> bool {
        matches!(self, Self::InteractionFailed { .. })
    }

    /// True for `NavigationFailed`
    #[must_use]
    pub const fn is_navigation_failure(&self) -> bool {
        matches!(self, Self::NavigationFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_message_includes_last_error() {
        let err = ProbeError::ElementNotReady {
            query: "By.id: login-button".to_string(),
            condition: "clickable".to_string(),
            waited_ms: 1500,
            last_error: Some("node detached".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("By.id: login-button"));
        assert!(msg.contains("1500ms"));
        assert!(msg.contains("last error: node detached"));
        assert!(err.is_not_ready());
    }

    #[test]
    fn test_not_ready_message_without_last_error() {
        let err = ProbeError::ElementNotReady {
            query: "q".to_string(),
            condition: "present".to_string(),
            waited_ms: 10,
            last_error: None,
        };
        assert!(!err.to_string().contains("last error"));
    }

    #[test]
    fn test_taxonomy_predicates() {
        assert!(ProbeError::interaction("x", "boom").is_interaction_failure());
        assert!(ProbeError::navigation("dashboard", "/login").is_navigation_failure());
        assert!(!ProbeError::driver("x").is_not_ready());
    }
}
