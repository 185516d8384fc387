//! Error types for profile-card
//!
//! This module provides the error taxonomy of the library:
//! - [`ErrorKind`] classifies every failure of a profile fetch
//! - [`FetchError`] pairs a kind with the fixed, user-facing message for it
//! - [`Error`] is the crate-wide error, which also covers input validation and configuration
//!
//! Only the data source produces [`FetchError`]s. The controller turns every
//! [`Error`] into a message via [`Error::user_message`] and never lets one escape
//! a load operation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for profile-card operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown when a handle fails validation before any request is made
pub const VALIDATION_MESSAGE: &str = "Please enter a valid username.";

/// Classification of a failed profile fetch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// HTTP 404: no profile exists for the handle
    NotFound,
    /// HTTP 403: the upstream API refused the request (rate limit)
    RateLimited,
    /// HTTP 5xx
    ServerError,
    /// Transport failure: connection refused, DNS failure, timeout, offline
    NetworkUnreachable,
    /// Any other HTTP status, or a success body that could not be decoded
    Unknown,
}

impl ErrorKind {
    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::ServerError => "server_error",
            ErrorKind::NetworkUnreachable => "network_unreachable",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// The fixed descriptive message carried by errors of this kind
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "User not found. Please try again.",
            ErrorKind::RateLimited => "API rate limit exceeded. Please try again later.",
            ErrorKind::ServerError => "Server error. Please try again later.",
            ErrorKind::NetworkUnreachable => {
                "Network error. Please check your internet connection."
            }
            ErrorKind::Unknown => "Failed to load profile. Please try again.",
        }
    }

    /// Map a non-success HTTP status code to a kind
    ///
    /// 404 → NotFound, 403 → RateLimited, 5xx → ServerError, anything else → Unknown.
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => ErrorKind::NotFound,
            403 => ErrorKind::RateLimited,
            500..=599 => ErrorKind::ServerError,
            _ => ErrorKind::Unknown,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A classified fetch failure with its human-readable message
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct FetchError {
    /// Failure classification
    pub kind: ErrorKind,
    /// Human-readable message, suitable for display to end users
    pub message: String,
}

impl FetchError {
    /// Create an error of the given kind carrying its fixed message
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: kind.default_message().to_string(),
        }
    }

    /// Create an error from a non-success HTTP status code
    pub fn from_status(status: u16) -> Self {
        Self::new(ErrorKind::from_status(status))
    }

    /// Transport-level failure
    pub fn network() -> Self {
        Self::new(ErrorKind::NetworkUnreachable)
    }
}

/// Main error type for profile-card
#[derive(Debug, Error)]
pub enum Error {
    /// The handle was empty or malformed; no request was made
    #[error("invalid handle: {0}")]
    Validation(String),

    /// The profile fetch failed
    #[error("fetch failed ({}): {}", .0.kind, .0.message)]
    Fetch(#[from] FetchError),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api.base_url")
        key: Option<String>,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// The fetch classification, if this is a fetch failure
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Fetch(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::Fetch(e) => e.kind.code(),
            Error::Config { .. } => "config_error",
            Error::Other(_) => "internal_error",
        }
    }

    /// The message to surface to the user for this error
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(_) => VALIDATION_MESSAGE.to_string(),
            Error::Fetch(e) => e.message.clone(),
            Error::Config { .. } | Error::Other(_) => {
                ErrorKind::Unknown.default_message().to_string()
            }
        }
    }
}
