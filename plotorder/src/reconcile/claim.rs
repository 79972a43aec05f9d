//! Ownership heuristic for multi-client orders.
//!
//! Several clients may poll the same order. A plot the service already
//! reports as downloading is presumed claimed by another process, unless
//! this process can see on-disk evidence (its own partial file) that it is
//! the owner. This is best-effort, not a distributed lock: two processes
//! starting at the same moment with no file on disk yet can both claim a
//! plot.

use std::path::Path;

use crate::plot::{DownloadState, Plot};

/// Decides whether this process should claim the plot for download.
///
/// True when the download has not been started by anyone, when a (partially)
/// downloaded local file for the plot already exists, or when
/// `force_download` overrides the check entirely.
pub fn should_claim(plot: &Plot, output_dir: &Path, force_download: bool) -> bool {
    if force_download {
        return true;
    }
    plot.download_state() == DownloadState::NotStarted || plot.file_exists(output_dir)
}
