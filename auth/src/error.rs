//! Error types for session and credential operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Error taxonomy for the session subsystem.
///
/// Each variant carries a distinct propagation policy: some are shown inline
/// to the user, some degrade silently, and one triggers session teardown.
/// See [`SessionError::user_message`] for the strings that reach the UI.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionError {
    /// Wrong username or password. User-correctable, shown inline.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Field-level validation failure, shown next to the offending field.
    #[error("Validation failed for {field}: {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// The validation message for that field.
        message: String,
    },

    /// Transport-level failure. Transient, safe to retry.
    #[error("Network error: {0}")]
    Network(String),

    /// 5xx-class backend failure. Not retried automatically.
    #[error("Server error (status {status})")]
    Server {
        /// HTTP status code returned by the backend.
        status: u16,
    },

    /// Malformed stored session record. Recovered silently by clearing
    /// storage; never shown to the user.
    #[error("Stored session data is corrupt")]
    CorruptSessionData,

    /// The presented access token is no longer valid. Triggers silent
    /// teardown and a redirect to login, not an in-page error.
    #[error("Authorization expired")]
    AuthorizationExpired,

    /// Credential storage I/O failure. Internal only: restore degrades to
    /// an anonymous session and saves roll back, so this never reaches
    /// `SessionState.error`.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl SessionError {
    /// Returns `true` if the operation that produced this error is safe to
    /// retry as-is.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// The human-readable string mapped into `SessionState.error`.
    ///
    /// Internal variants still produce a generic message so a misrouted
    /// error never leaks storage details into the UI.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Invalid username or password".to_string(),
            Self::Validation { field, message } => format!("{field}: {message}"),
            Self::Network(_) => "Network error, please try again".to_string(),
            Self::AuthorizationExpired => {
                "Your session has expired, please sign in again".to_string()
            },
            Self::Server { .. } | Self::CorruptSessionData | Self::Storage(_) => {
                "Something went wrong, please try again later".to_string()
            },
        }
    }
}
