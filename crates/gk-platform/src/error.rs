//! Platform API error types.

use thiserror::Error;

/// Errors that can occur when talking to a git-hosting platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The token was rejected.
    #[error("token rejected ({status}): {message}")]
    Unauthorized {
        status: u16,
        message: String,
    },

    /// The key (or endpoint) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The platform returned another non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
    },

    /// The platform returned a 429 Too Many Requests response.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        retry_after_secs: u64,
    },

    /// Failed to parse a response body.
    #[error("parse error: {0}")]
    Parse(String),
}
