//! Hacker News client error types.

use std::sync::Arc;

/// Errors from the Hacker News API client.
#[derive(Debug, thiserror::Error)]
pub enum HnError {
    /// The item does not exist (the API answers `null`).
    #[error("item not found")]
    NotFound,

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for HnError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { HnError::Timeout } else { HnError::Network(Arc::new(err)) }
    }
}
