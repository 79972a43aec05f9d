//! Error types for the order service client.

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to the order service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP client itself could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// The request never produced a response (connect failure, timeout, ...).
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// The service answered with a non-success status.
    #[error("remote service returned HTTP {status} for {url}: {body}")]
    Remote {
        url: String,
        status: u16,
        body: String,
    },

    /// The response body could not be decoded into the expected shape.
    #[error("could not decode the response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl ClientError {
    /// Whether retrying the same request can plausibly succeed.
    ///
    /// Decode failures are not retried: the service answered, the answer is
    /// just not something this client understands.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Remote { .. })
    }
}
