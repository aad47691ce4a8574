//! Error types for fetch tasks.
//!
//! Errors are split by where they arise: the transport ([`NetworkError`]) or
//! the payload ([`DecodeError`]). Cancellation is not an error and is carried
//! by [`FetchOutcome::Cancelled`](super::FetchOutcome::Cancelled) instead.

use std::time::Duration;
use thiserror::Error;

/// Terminal failure of a single fetch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// The request did not produce a usable response
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// The response body could not be turned into an image
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl FetchError {
    /// Returns true if the fetch failed because the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Network(NetworkError::Timeout(_)))
    }
}

/// Transport-level failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    /// Connection, TLS or body-read failure
    #[error("request failed: {0}")]
    Transport(String),

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// No response within the configured interval
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

/// Payload-level failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// Response body had no bytes
    #[error("empty image data")]
    Empty,

    /// Response body is not a decodable image
    #[error("invalid image data: {0}")]
    Malformed(String),
}
