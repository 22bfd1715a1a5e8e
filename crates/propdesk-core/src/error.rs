//! Error types for the PropDesk admin dashboard

use crate::types::{ListingAction, ListingStatus};
use thiserror::Error;
use uuid::Uuid;

/// Main error type shared by the client, the web app and the CLI
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// Validation error, either local form validation or reported by the API
    #[error("Validation error: {field} - {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// An authenticated operation was attempted without a session
    #[error("Not signed in")]
    Unauthenticated,

    /// The session could not be refreshed and has been discarded
    #[error("Session expired, please sign in again")]
    SessionExpired,

    /// Credentials, OTP code or reset token were rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The listing's current status does not allow the requested action
    #[error("Listing {id} cannot be {} while {status}", .action.past_tense())]
    InvalidTransition {
        /// Listing identifier
        id: Uuid,
        /// Requested action
        action: ListingAction,
        /// Status the listing was in
        status: ListingStatus,
    },

    /// Not found error
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Resource that was not found
        resource: String,
    },

    /// Rate limit error
    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Rate limit message
        message: String,
    },

    /// Any other non-success response from the API
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// The request never produced a response
    #[error("Request failed: {0}")]
    Transport(String),

    /// Session persistence error
    #[error("Session storage error: {0}")]
    Storage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a validation error on a single field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the caller must send the user back to the sign-in screen
    #[must_use]
    pub const fn is_session_failure(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::SessionExpired)
    }

    /// Whether retrying the same request later may succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::RateLimitExceeded { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
