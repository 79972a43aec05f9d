//! PlotOrder - automated download client for remotely plotted files.
//!
//! This library tracks the plots of a remote order, polls the order service
//! for their lifecycle state, and drives every published plot through a
//! resumable download until the file is complete and the plot can be expired
//! remotely.
//!
//! # Architecture
//!
//! ```text
//! Reconciler ──► ApiClient ──► order service (HTTP + JSON)
//!     │
//!     ├──► DownloadEngine ──► TransferSource (HTTP range requests)
//!     │         │
//!     │         └──► one transfer task per plot (tokio)
//!     │
//!     └──► ReportSnapshot ──► console / progress file
//! ```
//!
//! The reconciler owns the registry of tracked plots and is the only writer
//! of their lifecycle fields. A running transfer task is the only writer of
//! its plot's download progress fields, shared through
//! [`plot::TransferProgress`].

pub mod client;
pub mod config;
pub mod disk;
pub mod download;
pub mod plot;
pub mod reconcile;
pub mod report;

/// Library version string, taken from the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
