//! The plot entity and its orders.
//!
//! A [`Plot`] is the central entity of the client: a remotely produced file
//! that must eventually be downloaded once published. Lifecycle fields are
//! owned by the reconciler; the download-side fields live in a shared
//! [`TransferProgress`] written by the plot's transfer task.

mod progress;
mod state;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use progress::TransferProgress;
pub use state::{DownloadState, PlotState, StateCodeError};

/// A grouping of plots a client is authorized to process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    /// Remote identifier of the order.
    pub id: String,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order {}", self.id)
    }
}

/// A remotely produced plot file tracked by this client.
#[derive(Clone, Debug)]
pub struct Plot {
    id: String,
    state: PlotState,
    plotting_progress: u8,
    url: Option<String>,
    progress: Arc<TransferProgress>,
}

impl Plot {
    /// Creates a plot from remote-reported fields.
    pub fn new(
        id: String,
        state: PlotState,
        plotting_progress: u8,
        url: Option<String>,
        download_state: DownloadState,
    ) -> Self {
        Self {
            id,
            state,
            plotting_progress,
            url,
            progress: Arc::new(TransferProgress::new(download_state)),
        }
    }

    /// Remote identifier, stable for the plot's lifetime.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Lifecycle stage as last reported by the order service.
    pub fn state(&self) -> PlotState {
        self.state
    }

    /// Moves the lifecycle stage. Only the reconciler calls this, and only
    /// to mirror the remote service (or to record a confirmed expiry).
    pub fn set_state(&mut self, state: PlotState) {
        self.state = state;
    }

    /// Remote plotting completion percentage (0-100).
    pub fn plotting_progress(&self) -> u8 {
        self.plotting_progress
    }

    /// Download source URL; absent until the plot is published.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Shared download-side state, co-owned by the transfer task.
    pub fn progress(&self) -> &Arc<TransferProgress> {
        &self.progress
    }

    /// Current download state (shorthand for the shared progress value).
    pub fn download_state(&self) -> DownloadState {
        self.progress.download_state()
    }

    /// Overwrites the remote-reported fields from a freshly fetched copy,
    /// leaving the local download-side fields untouched.
    pub fn update_remote(&mut self, fresh: &Plot) {
        self.state = fresh.state;
        self.plotting_progress = fresh.plotting_progress;
        if fresh.url.is_some() {
            self.url = fresh.url.clone();
        }
    }

    /// File name for the plot, taken from the last path segment of its URL.
    pub fn local_filename(&self) -> Option<String> {
        let url = self.url.as_deref()?;
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let name = path.rsplit('/').next().unwrap_or("");
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }

    /// Absolute destination path inside the given output directory.
    pub fn file_path(&self, output_dir: &Path) -> Option<PathBuf> {
        self.local_filename().map(|name| output_dir.join(name))
    }

    /// Whether a (partially) downloaded file for this plot already exists.
    pub fn file_exists(&self, output_dir: &Path) -> bool {
        self.file_path(output_dir)
            .map(|path| path.exists())
            .unwrap_or(false)
    }
}

impl fmt::Display for Plot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plot {} ({})", self.id, self.state)
    }
}
