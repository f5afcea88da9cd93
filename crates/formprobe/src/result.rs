//! Result and error types for formprobe.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for formprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// One failed attempt recorded by the resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyFailure {
    /// Zero-based position of the strategy in its chain
    pub index: usize,
    /// Human-readable strategy description
    pub strategy: String,
    /// Why the attempt failed
    pub reason: String,
}

impl std::fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {} => {}", self.index + 1, self.strategy, self.reason)
    }
}

fn render_attempts(attempts: &[StrategyFailure]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur while driving the form
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A polled condition never became true
    #[error("Timed out after {ms}ms waiting for {target} to be {condition}")]
    WaitTimeout {
        /// Selector or logical name that was polled
        target: String,
        /// Condition that never held
        condition: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Every candidate strategy for a logical target failed
    #[error(
        "No strategy resolved \"{target}\" ({} attempted): {}",
        attempts.len(),
        render_attempts(attempts)
    )]
    ResolutionExhausted {
        /// Logical target name
        target: String,
        /// Every attempt with its failure reason, in order
        attempts: Vec<StrategyFailure>,
    },

    /// Confirmation read-back differs from the submitted record
    #[error("Assertion failed for \"{field}\": expected '{expected}' but got '{actual}'")]
    AssertionMismatch {
        /// Confirmation label or field name
        field: String,
        /// Expected value
        expected: String,
        /// Value read back
        actual: String,
    },

    /// Browser could not be launched
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page-level failure (page creation, script evaluation)
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// The page or its browser went away; nothing more can run on it
    #[error("Page closed: {message}")]
    PageClosed {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// An interaction with a resolved element raised
    #[error("Interaction with {selector} failed: {message}")]
    InteractionError {
        /// Selector the interaction targeted
        selector: String,
        /// Error message
        message: String,
    },

    /// Invalid input data (empty strategy chain, unknown enum value)
    #[error("Invalid data: {message}")]
    InvalidData {
        /// Error message
        message: String,
    },

    /// Configuration error
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

impl ProbeError {
    /// Create an interaction error
    #[must_use]
    pub fn interaction(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InteractionError {
            selector: selector.into(),
            message: message.into(),
        }
    }

    /// Create an invalid data error
    #[must_use]
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
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

    /// Whether the page is gone, so no later attempt on it can succeed
    #[must_use]
    pub const fn is_page_closed(&self) -> bool {
        matches!(self, Self::PageClosed { .. })
    }

    /// Whether this is a wait timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::WaitTimeout { .. })
    }
}
