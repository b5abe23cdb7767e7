use std::time::Duration;

use thiserror::Error;

/// Failures surfaced by the Messages API, classified by how the caller
/// should react. `is_transient` errors are worth retrying; the rest are not.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Rate limiting (429) or a server-side failure (5xx).
    #[error("transient API error ({status}): {message}")]
    Transient { status: u16, message: String },

    /// The API key was rejected (401/403).
    #[error("authentication failed ({status}): {message}")]
    Authentication { status: u16, message: String },

    /// The request itself was malformed or rejected (other 4xx).
    #[error("invalid request ({status}): {message}")]
    InvalidRequest { status: u16, message: String },

    /// The per-call deadline elapsed before a response arrived.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection-level failure before any HTTP status was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The model returned no text content.
    #[error("no text content in model response")]
    EmptyResponse,
}

impl ApiError {
    /// Whether a retry has a chance of succeeding.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::Transient { .. } | ApiError::Timeout(_) | ApiError::Transport(_)
        )
    }

    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            429 | 500..=599 => ApiError::Transient { status, message },
            401 | 403 => ApiError::Authentication { status, message },
            _ => ApiError::InvalidRequest { status, message },
        }
    }
}
