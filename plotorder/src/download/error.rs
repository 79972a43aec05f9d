//! Error types for plot file transfers.

use std::path::PathBuf;

use thiserror::Error;

use crate::plot::PlotState;

/// Result type for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

/// Errors that can occur while transferring a plot file.
///
/// Errors inside a running transfer task never cross the task boundary; the
/// task logs them and exits with the plot's download state left as-is, which
/// the reconciler treats as a resumable failure.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The HTTP client itself could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// The plot has no download URL yet.
    #[error("plot has no download URL")]
    MissingUrl,

    /// Only published plots can be downloaded.
    #[error("plot is not published (state is {0})")]
    NotPublished(PlotState),

    /// No file name could be derived from the download URL.
    #[error("cannot derive a file name from URL {0}")]
    BadFileName(String),

    /// The transfer request or stream failed.
    #[error("transfer from {url} failed: {reason}")]
    Transfer { url: String, reason: String },

    /// The server did not report a content length, so the expected total
    /// size cannot be determined.
    #[error("server did not report a content length")]
    UnknownSize,

    /// Reading or writing the destination file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The on-disk length does not match the expected plot size after the
    /// stream was exhausted; the download stays resumable.
    #[error("on-disk length {actual} does not match expected length {expected}")]
    Incomplete { expected: u64, actual: u64 },
}
