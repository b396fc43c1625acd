//! Error types for memo-core

use thiserror::Error;

/// Result type alias using memo-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the remote services.
///
/// Variants carry rendered messages rather than source errors so they stay
/// cheaply cloneable into state snapshots.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Input rejected before any network call, or a remote 400
    #[error("{message}")]
    Validation {
        /// Field the message refers to, when known (e.g. "title")
        field: Option<String>,
        message: String,
    },

    /// Remote 404
    #[error("{0}")]
    NotFound(String),

    /// Remote 5xx
    #[error("Server error: {0}")]
    Server(String),

    /// Timeout or connectivity failure
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

/// Uniform error classification applied by the orchestrators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    NotFound,
    Server,
    Network,
    Other,
}

impl ErrorClass {
    /// Whether a list read failing with this classification may be retried.
    ///
    /// Mutations are never auto-retried: replaying a non-idempotent write
    /// without a dedup token risks duplicate side effects.
    pub const fn is_retryable_for_list(self) -> bool {
        matches!(self, Self::Network | Self::Server)
    }
}

impl Error {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub const fn classification(&self) -> ErrorClass {
        match self {
            Self::Validation { .. } => ErrorClass::Validation,
            Self::NotFound(_) => ErrorClass::NotFound,
            Self::Server(_) => ErrorClass::Server,
            Self::Network(_) => ErrorClass::Network,
            Self::InvalidConfiguration(_) | Self::Other(_) => ErrorClass::Other,
        }
    }

    /// Field name for field-level validation errors, when known.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Network("request timed out".to_string())
        } else if error.is_connect() {
            Self::Network("connection failed".to_string())
        } else if error.is_decode() {
            Self::Other(format!("invalid response payload: {error}"))
        } else {
            Self::Other(error.to_string())
        }
    }
}
