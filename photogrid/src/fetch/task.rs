//! The cancellable unit of work: one HTTP fetch plus decode.
//!
//! A [`FetchTask`] issues exactly one request and yields exactly one
//! [`FetchOutcome`]. It polls its [`CancellationToken`] at three points:
//!
//! 1. before the request is issued,
//! 2. while the request is in flight (the request future is raced against the
//!    token and dropped on cancellation, which aborts the transport request),
//! 3. when the response body has arrived.
//!
//! Decoding happens after the last checkpoint and always runs to completion.

use super::decode::{decode_image, DecodedImage};
use super::error::{DecodeError, FetchError, NetworkError};
use super::http::AsyncHttpClient;
use crate::key::PositionKey;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Lifecycle of a fetch task.
///
/// `Pending` and `Running` are visible in the in-flight table; the terminal
/// states are only reached as the entry leaves the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Admitted, waiting for a worker slot
    Pending,
    /// Holding a worker slot
    Running,
    /// Produced a success or failure outcome
    Completed,
    /// Cancelled before or while running
    Cancelled,
}

impl TaskState {
    /// Returns true for `Completed` and `Cancelled`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Cancelled)
    }
}

/// Terminal result of a fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The payload decoded into an image
    Success(DecodedImage),
    /// Network or decode failure
    Failed(FetchError),
    /// The task was cancelled
    Cancelled,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchOutcome::Cancelled)
    }

    /// The lifecycle state this outcome ends in.
    pub fn terminal_state(&self) -> TaskState {
        match self {
            FetchOutcome::Cancelled => TaskState::Cancelled,
            _ => TaskState::Completed,
        }
    }

    /// Returns the image on success.
    pub fn image(&self) -> Option<&DecodedImage> {
        match self {
            FetchOutcome::Success(image) => Some(image),
            _ => None,
        }
    }

    /// Returns the error on failure.
    pub fn error(&self) -> Option<&FetchError> {
        match self {
            FetchOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// One fetch of one URL for one grid position.
#[derive(Debug, Clone)]
pub struct FetchTask {
    key: PositionKey,
    source: String,
    token: CancellationToken,
}

impl FetchTask {
    /// Creates a task with a fresh cancellation token.
    pub fn new(key: PositionKey, source: impl Into<String>) -> Self {
        Self::with_token(key, source, CancellationToken::new())
    }

    /// Creates a task bound to an existing token.
    pub fn with_token(key: PositionKey, source: impl Into<String>, token: CancellationToken) -> Self {
        Self {
            key,
            source: source.into(),
            token,
        }
    }

    pub fn key(&self) -> PositionKey {
        self.key
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The token observed by [`run`](Self::run).
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Requests cancellation. Safe from any thread, idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Performs the fetch and returns its single outcome.
    ///
    /// A request that does not finish within `timeout` fails with
    /// [`NetworkError::Timeout`]. Cancellation observed at any checkpoint wins
    /// over whatever the transport produced.
    pub async fn run<C: AsyncHttpClient>(&self, client: &C, timeout: Duration) -> FetchOutcome {
        if self.token.is_cancelled() {
            trace!(key = %self.key, "Fetch cancelled before start");
            return FetchOutcome::Cancelled;
        }

        trace!(key = %self.key, url = %self.source, "Fetch starting");

        let response = tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                debug!(key = %self.key, "Fetch cancelled in flight, request aborted");
                return FetchOutcome::Cancelled;
            }
            response = tokio::time::timeout(timeout, client.get(&self.source)) => response,
        };

        if self.token.is_cancelled() {
            debug!(key = %self.key, "Fetch cancelled after response");
            return FetchOutcome::Cancelled;
        }

        let data = match response {
            Err(_elapsed) => {
                debug!(key = %self.key, timeout = ?timeout, "Fetch timed out");
                return FetchOutcome::Failed(NetworkError::Timeout(timeout).into());
            }
            Ok(Err(e)) => return FetchOutcome::Failed(e.into()),
            Ok(Ok(data)) => data,
        };

        // Past the last checkpoint; decode on the blocking pool.
        let decoded = tokio::task::spawn_blocking(move || decode_image(&data)).await;
        match decoded {
            Ok(Ok(image)) => FetchOutcome::Success(image),
            Ok(Err(e)) => FetchOutcome::Failed(e.into()),
            Err(join_error) => FetchOutcome::Failed(
                DecodeError::Malformed(format!("decoder task failed: {}", join_error)).into(),
            ),
        }
    }
}
