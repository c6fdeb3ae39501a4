//! Error types for the remote sync client.

use daystack_core::sync::{RemoteRetryClass, RemoteStoreError};
use thiserror::Error;

/// Result type alias for remote sync operations.
pub type Result<T> = std::result::Result<T, RemoteSyncError>;

/// Errors that can occur talking to the remote store.
#[derive(Debug, Error)]
pub enum RemoteSyncError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API error response from the backend
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Authentication error (missing or invalid token)
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl RemoteSyncError {
    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Classify error for retry policy.
    pub fn retry_class(&self) -> RemoteRetryClass {
        match self {
            Self::Api { status, .. } => match *status {
                401 | 403 => RemoteRetryClass::ReauthRequired,
                408 | 409 | 423 | 425 | 429 => RemoteRetryClass::Retryable,
                500..=599 => RemoteRetryClass::Retryable,
                _ => RemoteRetryClass::Permanent,
            },
            Self::Http(_) => RemoteRetryClass::Retryable,
            Self::Json(_) => RemoteRetryClass::Permanent,
            Self::Auth(_) => RemoteRetryClass::ReauthRequired,
        }
    }
}

impl From<RemoteSyncError> for RemoteStoreError {
    fn from(err: RemoteSyncError) -> Self {
        RemoteStoreError {
            retry_class: err.retry_class(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        assert_eq!(
            RemoteSyncError::api(503, "unavailable").retry_class(),
            RemoteRetryClass::Retryable
        );
        assert_eq!(
            RemoteSyncError::api(429, "slow down").retry_class(),
            RemoteRetryClass::Retryable
        );
    }

    #[test]
    fn auth_errors_require_reauth() {
        assert_eq!(
            RemoteSyncError::api(401, "unauthorized").retry_class(),
            RemoteRetryClass::ReauthRequired
        );
        assert_eq!(
            RemoteSyncError::auth("no token").retry_class(),
            RemoteRetryClass::ReauthRequired
        );
    }

    #[test]
    fn client_errors_are_permanent() {
        assert_eq!(
            RemoteSyncError::api(400, "bad request").retry_class(),
            RemoteRetryClass::Permanent
        );
    }

    #[test]
    fn conversion_preserves_message_and_class() {
        let converted: RemoteStoreError = RemoteSyncError::api(500, "boom").into();
        assert_eq!(converted.retry_class, RemoteRetryClass::Retryable);
        assert!(converted.message.contains("boom"));
    }
}
