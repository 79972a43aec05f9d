//! CLI error types.

use std::fmt;

use plotorder::client::ClientError;
use plotorder::download::DownloadError;

/// Errors surfaced to the user by the CLI.
#[derive(Debug)]
pub enum CliError {
    /// Configuration is missing or invalid.
    Config(String),

    /// The order service could not be reached (retries already exhausted).
    Client(ClientError),

    /// The download stack could not be set up.
    Download(DownloadError),

    /// A required directory or file could not be prepared.
    Io(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "configuration error: {}", msg),
            CliError::Client(err) => write!(f, "order service error: {}", err),
            CliError::Download(err) => write!(f, "download error: {}", err),
            CliError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Client(err) => Some(err),
            CliError::Download(err) => Some(err),
            CliError::Config(_) | CliError::Io(_) => None,
        }
    }
}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        CliError::Client(err)
    }
}

impl From<DownloadError> for CliError {
    fn from(err: DownloadError) -> Self {
        CliError::Download(err)
    }
}
