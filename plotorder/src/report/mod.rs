//! Free-form progress reporting.
//!
//! A [`ReportSnapshot`] is a point-in-time copy of the reconciler's registry,
//! rendered into the human-readable report that is printed to the console
//! and rewritten into the progress file on every pass. The format is for
//! people, not for machine parsing.

use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::plot::{DownloadState, Plot, PlotState};

/// One plot currently being produced remotely.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlottingRow {
    pub id: String,
    pub progress: u8,
}

/// One published plot on its way to disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadRow {
    pub id: String,
    /// False until the transfer has started at least once.
    pub started: bool,
    pub percent: u8,
    pub speed: String,
}

/// Point-in-time view of the registry.
#[derive(Clone, Debug)]
pub struct ReportSnapshot {
    pub generated_at: DateTime<Local>,
    /// Tracked plots plus plots handled by other clients.
    pub total: usize,
    pub other_clients: usize,
    pub pending: usize,
    pub plotting: Vec<PlottingRow>,
    pub downloading: Vec<DownloadRow>,
    pub expired: usize,
    pub cancelled: usize,
}

impl ReportSnapshot {
    /// Builds a snapshot from the tracked plots.
    pub fn collect<'a>(plots: impl Iterator<Item = &'a Plot>, other_clients: usize) -> Self {
        let mut snapshot = Self {
            generated_at: Local::now(),
            total: other_clients,
            other_clients,
            pending: 0,
            plotting: Vec::new(),
            downloading: Vec::new(),
            expired: 0,
            cancelled: 0,
        };

        for plot in plots {
            snapshot.total += 1;
            match plot.state() {
                PlotState::Pending => snapshot.pending += 1,
                PlotState::Plotting => snapshot.plotting.push(PlottingRow {
                    id: plot.id().to_string(),
                    progress: plot.plotting_progress(),
                }),
                PlotState::Published => {
                    let progress = plot.progress();
                    snapshot.downloading.push(DownloadRow {
                        id: plot.id().to_string(),
                        started: progress.download_state() != DownloadState::NotStarted,
                        percent: progress.percent(),
                        speed: progress.speed(),
                    });
                }
                PlotState::Expired => snapshot.expired += 1,
                PlotState::Cancelled => snapshot.cancelled += 1,
            }
        }
        snapshot
    }

    /// Renders the report.
    pub fn render(&self, elapsed: Duration) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Report generated at {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(out, "All plots: {}", self.total);
        let _ = writeln!(out, "Handled by other clients: {}", self.other_clients);
        let _ = writeln!(out, "Pending plots: {}", self.pending);

        let _ = writeln!(out, "Plotting: {}", self.plotting.len());
        for row in &self.plotting {
            let _ = writeln!(out, "    * {}: plotting {:>3}%", row.id, row.progress);
        }

        let _ = writeln!(out, "Downloading: {}", self.downloading.len());
        for row in &self.downloading {
            if row.started {
                let _ = writeln!(
                    out,
                    "    * {}: downloaded {:>3}% {:>16}",
                    row.id, row.percent, row.speed
                );
            } else {
                let _ = writeln!(out, "    * {}: download is going to start", row.id);
            }
        }

        let _ = writeln!(out, "Expired plots: {}", self.expired);
        let _ = writeln!(out, "Cancelled plots: {}", self.cancelled);
        let _ = writeln!(out, "Time elapsed: {}", elapsed_string(elapsed));
        out
    }
}

/// Formats a duration as `2 h 31 m 24 s`, omitting leading zero units.
pub fn elapsed_string(elapsed: Duration) -> String {
    let total_seconds = elapsed.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds / 60) % 60;
    let seconds = total_seconds % 60;

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{} h ", hours);
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{} m ", minutes);
    }
    let _ = write!(out, "{} s", seconds);
    out
}
