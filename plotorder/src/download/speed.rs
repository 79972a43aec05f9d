//! Rolling-window throughput estimation for transfers.
//!
//! The estimate is recomputed once per wall-clock window, independent of how
//! many bytes each chunk carried, so slow links with big chunks and fast
//! links with small chunks both produce a stable reading.

use std::time::{Duration, Instant};

/// Accumulates byte counts and produces a speed string once per window.
#[derive(Debug)]
pub struct SpeedEstimator {
    window: Duration,
    window_start: Instant,
    bytes: u64,
}

impl SpeedEstimator {
    /// Creates an estimator with the given window length, starting now.
    pub fn new(window: Duration, now: Instant) -> Self {
        Self {
            window,
            window_start: now,
            bytes: 0,
        }
    }

    /// Records `bytes` transferred at time `now`.
    ///
    /// Returns a fresh human-readable estimate when a full window has
    /// elapsed, `None` otherwise.
    pub fn record(&mut self, bytes: u64, now: Instant) -> Option<String> {
        self.bytes += bytes;
        let elapsed = now.duration_since(self.window_start);
        if elapsed < self.window {
            return None;
        }
        let rate = self.bytes as f64 / elapsed.as_secs_f64();
        self.bytes = 0;
        self.window_start = now;
        Some(format_speed(rate))
    }
}

/// Formats a byte rate as a human-readable string ("3.4 MB/s").
pub fn format_speed(bytes_per_second: f64) -> String {
    const KB: f64 = 1_000.0;
    const MB: f64 = 1_000_000.0;
    const GB: f64 = 1_000_000_000.0;

    let rate = bytes_per_second.max(0.0);
    if rate < KB {
        format!("{:.0} B/s", rate)
    } else if rate < MB {
        format!("{:.1} kB/s", rate / KB)
    } else if rate < GB {
        format!("{:.1} MB/s", rate / MB)
    } else {
        format!("{:.1} GB/s", rate / GB)
    }
}
