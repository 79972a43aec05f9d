//! Shared transfer-side state of a plot.
//!
//! While a transfer task is running it is the only writer of the fields in
//! here; the reconciler and the reporter only read them. Counters are plain
//! atomics so no lock is held across chunk writes; the human-readable speed
//! string is the one field behind a mutex.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

use parking_lot::Mutex;

use super::state::DownloadState;

/// Download-side state shared between a plot and its transfer task.
#[derive(Debug)]
pub struct TransferProgress {
    /// Wire code of the current [`DownloadState`]; only ever written through
    /// [`TransferProgress::set_download_state`].
    download_state: AtomicU8,
    bytes_downloaded: AtomicU64,
    /// Total expected size in bytes; 0 until learned from transfer headers.
    total_bytes: AtomicU64,
    percent: AtomicU8,
    speed: Mutex<String>,
    cancel_requested: AtomicBool,
}

impl TransferProgress {
    /// Creates progress state starting in the given download state.
    pub fn new(initial: DownloadState) -> Self {
        Self {
            download_state: AtomicU8::new(initial.as_wire()),
            bytes_downloaded: AtomicU64::new(0),
            total_bytes: AtomicU64::new(0),
            percent: AtomicU8::new(0),
            speed: Mutex::new(String::new()),
            cancel_requested: AtomicBool::new(false),
        }
    }

    /// Current download state.
    pub fn download_state(&self) -> DownloadState {
        let raw = self.download_state.load(Ordering::SeqCst);
        // The stored value always comes from `as_wire`, so decoding cannot
        // actually fail here.
        DownloadState::from_wire(raw).unwrap_or(DownloadState::NotStarted)
    }

    /// Moves the download state; callers uphold the
    /// `NotStarted → Downloading → Downloaded` ordering.
    pub fn set_download_state(&self, state: DownloadState) {
        self.download_state.store(state.as_wire(), Ordering::SeqCst);
    }

    /// Records the absolute byte count and expected total of the transfer,
    /// deriving the completion percentage.
    pub fn record_bytes(&self, bytes: u64, total: u64) {
        self.bytes_downloaded.store(bytes, Ordering::SeqCst);
        self.total_bytes.store(total, Ordering::SeqCst);
        let percent = if total == 0 {
            0
        } else {
            ((bytes as u128 * 100) / total as u128).min(100) as u8
        };
        self.percent.store(percent, Ordering::SeqCst);
    }

    /// Bytes written to disk so far (including any resumed prefix).
    pub fn bytes_downloaded(&self) -> u64 {
        self.bytes_downloaded.load(Ordering::SeqCst)
    }

    /// Expected total size, once learned from the transfer headers.
    pub fn total_bytes(&self) -> Option<u64> {
        match self.total_bytes.load(Ordering::SeqCst) {
            0 => None,
            n => Some(n),
        }
    }

    /// Completion percentage (0-100).
    pub fn percent(&self) -> u8 {
        self.percent.load(Ordering::SeqCst)
    }

    /// Stores a freshly estimated human-readable speed string.
    pub fn set_speed(&self, speed: String) {
        *self.speed.lock() = speed;
    }

    /// The last estimated speed string; empty until the first estimate.
    pub fn speed(&self) -> String {
        self.speed.lock().clone()
    }

    /// Asks the owning transfer task to stop at the next chunk boundary.
    pub fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    /// Whether a cancellation was requested and not yet consumed.
    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    /// Clears the cancellation flag so a later attempt starts clean.
    pub fn clear_cancel(&self) {
        self.cancel_requested.store(false, Ordering::SeqCst);
    }
}
