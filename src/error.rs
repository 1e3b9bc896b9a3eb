// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for the Mustekala interception layer
//!
//! Provides detailed error context for debugging mock setups.
//! Programming errors (double resolution, bad patterns) fail loudly with
//! the originating URL/method so broken tests are caught in development.

use thiserror::Error;

/// Result type alias for Mustekala operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the interception layer
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Route pattern could not be compiled
    #[error("Invalid pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    /// A terminal operation was called on an already-resolved route
    #[error("Route for {method} {url} already resolved as '{first}', cannot {second}")]
    AlreadyResolved {
        method: String,
        url: String,
        first: &'static str,
        second: &'static str,
    },

    /// A route handler failed before resolving its request
    #[error("Handler failed for {method} {url}: {message}")]
    HandlerFailed {
        method: String,
        url: String,
        message: String,
    },

    /// Timeout error
    #[error("Operation timed out after {duration_ms}ms: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
    },

    /// The router (or its owning scope) has been closed
    #[error("Interception layer has been closed")]
    Closed,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a pattern error
    pub fn pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Pattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration_ms: u64) -> Self {
        Error::Timeout {
            operation: operation.into(),
            duration_ms,
        }
    }

    /// Create a handler failure error
    pub fn handler_failed(
        method: impl Into<String>,
        url: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::HandlerFailed {
            method: method.into(),
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Check if this is a network-level error
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Http(_))
    }

    /// Check if this is a double-resolution programming error
    pub fn is_already_resolved(&self) -> bool {
        matches!(self, Error::AlreadyResolved { .. })
    }

    /// Check if this is a handler failure
    pub fn is_handler_failure(&self) -> bool {
        matches!(self, Error::HandlerFailed { .. })
    }

    /// Get the originating URL if available
    pub fn url(&self) -> Option<&str> {
        match self {
            Error::AlreadyResolved { url, .. } => Some(url),
            Error::HandlerFailed { url, .. } => Some(url),
            _ => None,
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add operation context to error
    fn context(self, msg: &str) -> Result<T>;
}

impl<T, E: Into<Error>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            Error::Other(format!("{}: {}", msg, err))
        })
    }
}
