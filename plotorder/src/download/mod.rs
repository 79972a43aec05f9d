//! Resumable, cancellable downloads of plot files.
//!
//! [`DownloadEngine::start`] launches one transfer task per plot and returns
//! a [`TransferHandle`] immediately; the task owns the plot's shared
//! [`TransferProgress`](crate::plot::TransferProgress) for the duration of
//! the transfer. A partial file left behind by a failed or cancelled task is
//! picked up as the resume offset by the next attempt.
//!
//! A transfer is only marked downloaded after a completion check: the
//! expected size is re-probed with a fresh request and compared against the
//! on-disk length. This also holds on the already-fully-served sentinel
//! path, so a stale partial file can never be declared complete.

mod error;
mod source;
mod speed;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::task::JoinHandle;
use tokio_util::io::StreamReader;
use tracing::{debug, info, warn};

pub use error::{DownloadError, DownloadResult};
pub use source::{HttpSource, SourceResponse, TransferSource};
pub use speed::{format_speed, SpeedEstimator};

#[cfg(test)]
pub use source::tests::MockSource;

use crate::config::DownloadConfig;
use crate::plot::{DownloadState, Plot, PlotState, TransferProgress};

/// Handle to a running transfer task.
///
/// Stored by the reconciler next to the plot it belongs to; the reconciler
/// checks [`TransferHandle::is_running`] before ever starting a second
/// transfer for the same plot.
#[derive(Debug)]
pub struct TransferHandle {
    task: JoinHandle<()>,
    progress: Arc<TransferProgress>,
}

impl TransferHandle {
    /// Whether the transfer task is still running.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Asks the task to stop at the next chunk boundary. Never blocks; the
    /// caller polls [`TransferHandle::is_running`] or awaits
    /// [`TransferHandle::join`] to observe the exit.
    pub fn request_cancel(&self) {
        self.progress.request_cancel();
    }

    /// Waits for the transfer task to exit.
    pub async fn join(self) {
        if let Err(err) = self.task.await {
            if err.is_panic() {
                warn!("transfer task panicked");
            }
        }
    }
}

/// Launches and supervises plot file transfers.
pub struct DownloadEngine<S: TransferSource> {
    source: Arc<S>,
    output_dir: PathBuf,
    chunk_size: usize,
    speed_window: Duration,
}

impl<S: TransferSource> DownloadEngine<S> {
    /// Creates an engine writing into `output_dir`.
    pub fn new(source: Arc<S>, output_dir: PathBuf, config: &DownloadConfig) -> Self {
        Self {
            source,
            output_dir,
            chunk_size: config.chunk_size,
            speed_window: config.speed_window,
        }
    }

    /// The underlying transfer source, for test assertions.
    #[cfg(test)]
    pub(crate) fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Starts a transfer task for the plot and returns its handle.
    ///
    /// The caller guarantees that no live transfer exists for this plot id.
    /// Returns an error without spawning anything when the plot is not
    /// published or has no usable URL.
    pub fn start(&self, plot: &Plot) -> DownloadResult<TransferHandle> {
        if plot.state() != PlotState::Published {
            return Err(DownloadError::NotPublished(plot.state()));
        }
        let url = plot.url().ok_or(DownloadError::MissingUrl)?.to_string();
        let file_name = plot
            .local_filename()
            .ok_or_else(|| DownloadError::BadFileName(url.clone()))?;

        let path = self.output_dir.join(file_name);
        let progress = Arc::clone(plot.progress());
        let source = Arc::clone(&self.source);
        let plot_id = plot.id().to_string();
        let chunk_size = self.chunk_size;
        let speed_window = self.speed_window;

        let task_progress = Arc::clone(&progress);
        let task = tokio::spawn(async move {
            info!(plot_id = %plot_id, url = %url, "transfer task starting");
            match run_transfer(
                source,
                &url,
                &path,
                &task_progress,
                chunk_size,
                speed_window,
            )
            .await
            {
                Ok(TransferOutcome::Complete) => {
                    info!(plot_id = %plot_id, "transfer complete");
                }
                Ok(TransferOutcome::Cancelled) => {
                    info!(plot_id = %plot_id, "transfer stopped on request");
                }
                Err(err) => {
                    warn!(
                        plot_id = %plot_id,
                        error = %err,
                        "transfer failed; it will be resumed on a later pass"
                    );
                }
            }
        });

        Ok(TransferHandle { task, progress })
    }
}

enum TransferOutcome {
    Complete,
    Cancelled,
}

async fn run_transfer<S: TransferSource>(
    source: Arc<S>,
    url: &str,
    path: &Path,
    progress: &TransferProgress,
    chunk_size: usize,
    speed_window: Duration,
) -> DownloadResult<TransferOutcome> {
    progress.set_download_state(DownloadState::Downloading);

    let file = tokio::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .await
        .map_err(|e| DownloadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
    let offset = file
        .metadata()
        .await
        .map_err(|e| DownloadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?
        .len();
    if offset > 0 {
        info!(offset, "resuming from existing partial file");
    }

    let response = source.fetch(url, offset).await?;

    if response.is_already_served() {
        debug!(offset, "server reports nothing left to download");
        return verify_complete(source.as_ref(), url, path, progress)
            .await
            .map(|_| TransferOutcome::Complete);
    }

    let remaining = response.remaining_bytes.ok_or(DownloadError::UnknownSize)?;
    let total = offset + remaining;
    progress.record_bytes(offset, total);

    let mut reader = StreamReader::new(response.body);
    let mut writer = BufWriter::new(file);
    let mut chunk = vec![0u8; chunk_size];
    let mut downloaded = offset;
    let mut estimator = SpeedEstimator::new(speed_window, Instant::now());
    let mut cancelled = false;
    let mut failure: Option<DownloadError> = None;

    loop {
        let read = match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                failure = Some(DownloadError::Transfer {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
                break;
            }
        };

        if let Err(e) = writer.write_all(&chunk[..read]).await {
            failure = Some(DownloadError::Io {
                path: path.to_path_buf(),
                source: e,
            });
            break;
        }
        downloaded += read as u64;
        progress.record_bytes(downloaded, total);

        if progress.cancel_requested() {
            cancelled = true;
            break;
        }

        if let Some(speed) = estimator.record(read as u64, Instant::now()) {
            progress.set_speed(speed);
        }
    }

    // Flush whatever made it into the buffer even after a failure, so a
    // resume starts from the true on-disk length.
    if let Err(e) = writer.flush().await {
        failure.get_or_insert(DownloadError::Io {
            path: path.to_path_buf(),
            source: e,
        });
    }
    if let Some(err) = failure {
        return Err(err);
    }

    progress.clear_cancel();
    if cancelled {
        // Partial file and the downloading state stay in place for a resume.
        return Ok(TransferOutcome::Cancelled);
    }

    verify_complete(source.as_ref(), url, path, progress).await?;
    Ok(TransferOutcome::Complete)
}

/// Completion check: the plot is downloaded only when a fresh size probe
/// matches the on-disk length exactly.
async fn verify_complete<S: TransferSource>(
    source: &S,
    url: &str,
    path: &Path,
    progress: &TransferProgress,
) -> DownloadResult<()> {
    let expected = source.content_length(url).await?;
    let actual = tokio::fs::metadata(path)
        .await
        .map(|m| m.len())
        .unwrap_or(0);
    debug!(expected, actual, "verifying download length");

    if actual != expected {
        return Err(DownloadError::Incomplete { expected, actual });
    }

    progress.record_bytes(actual, expected);
    progress.set_download_state(DownloadState::Downloaded);
    Ok(())
}
