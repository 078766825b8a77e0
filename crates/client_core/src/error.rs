//! Retrieval failures surfaced to the session and its shell.

use shared::error::{ApiError, ResponseValidationError};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalErrorCategory {
    Transport,
    Status,
    Malformed,
}

/// Why a retrieval call did not produce a usable `SearchResponse`.
///
/// Stored in session state, so it carries rendered messages rather than the
/// underlying client errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrievalError {
    #[error("invalid search url: {0}")]
    InvalidUrl(String),
    #[error("search request failed: {0}")]
    Transport(String),
    #[error("search request timed out")]
    Timeout,
    #[error("search backend returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed search response: {0}")]
    Malformed(String),
}

impl RetrievalError {
    pub fn category(&self) -> RetrievalErrorCategory {
        match self {
            RetrievalError::InvalidUrl(_)
            | RetrievalError::Transport(_)
            | RetrievalError::Timeout => RetrievalErrorCategory::Transport,
            RetrievalError::Status { .. } => RetrievalErrorCategory::Status,
            RetrievalError::Malformed(_) => RetrievalErrorCategory::Malformed,
        }
    }

    /// Builds a status failure, preferring the backend's structured error body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<ApiError>(body) {
            Ok(api_error) => api_error.message,
            Err(_) if body.trim().is_empty() => "no response body".to_string(),
            Err(_) => body.trim().to_string(),
        };
        RetrievalError::Status { status, message }
    }
}

impl From<reqwest::Error> for RetrievalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RetrievalError::Timeout
        } else if err.is_decode() {
            RetrievalError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            RetrievalError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            RetrievalError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RetrievalError {
    fn from(err: serde_json::Error) -> Self {
        RetrievalError::Malformed(err.to_string())
    }
}

impl From<ResponseValidationError> for RetrievalError {
    fn from(err: ResponseValidationError) -> Self {
        RetrievalError::Malformed(err.to_string())
    }
}

impl From<url::ParseError> for RetrievalError {
    fn from(err: url::ParseError) -> Self {
        RetrievalError::InvalidUrl(err.to_string())
    }
}
