//! List Error Types
//!
//! This module defines the error taxonomy of the saved-list data layer.
//!
//! # Error Categories
//!
//! - `Unauthenticated` - a mutation was attempted with no active session
//! - `RemoteUnavailable` - network or HTTP failure talking to the list backend
//! - `MalformedRecord` - a backend record has no usable content id or kind
//!
//! Only `Unauthenticated` is a caller mistake. Remote failures are always
//! recoverable: the engine rolls back and the caller may retry.
//!
//! # Usage
//!
//! ```rust
//! use flixlist::shared::error::ListError;
//!
//! let error = ListError::remote(Some(503), "Service Unavailable");
//! assert!(error.is_retryable());
//! ```
use thiserror::Error;

/// Errors surfaced by the list engine and the list backend client
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListError {
    /// Mutation attempted without a signed-in user
    #[error("Must be signed in to change My List")]
    Unauthenticated,

    /// Transport or HTTP failure
    #[error("List service unavailable{}: {message}", status_suffix(.status))]
    RemoteUnavailable {
        /// HTTP status, if the server answered
        status: Option<u16>,
        /// Human-readable error message
        message: String,
    },

    /// Backend record lacking a usable id or kind
    #[error("Malformed list record: {message}")]
    MalformedRecord {
        /// Human-readable error message
        message: String,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

impl ListError {
    /// Create a new remote error
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::RemoteUnavailable {
            status,
            message: message.into(),
        }
    }

    /// Create a new malformed record error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            message: message.into(),
        }
    }

    /// Whether invoking the same operation again may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RemoteUnavailable { .. })
    }

    /// Whether the backend refused the bearer credential
    pub fn is_auth_rejected(&self) -> bool {
        matches!(
            self,
            Self::RemoteUnavailable {
                status: Some(401 | 403),
                ..
            }
        )
    }
}

impl From<reqwest::Error> for ListError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        if err.is_timeout() {
            return Self::remote(status, format!("request timed out: {}", err));
        }
        if err.is_decode() {
            return Self::remote(status, format!("failed to parse response: {}", err));
        }
        Self::remote(status, format!("network error: {}", err))
    }
}

impl From<serde_json::Error> for ListError {
    fn from(err: serde_json::Error) -> Self {
        Self::remote(None, format!("failed to parse response: {}", err))
    }
}
