//! Configuration for the plotorder client.
//!
//! All settings live in one [`AppConfig`] value, constructed once at startup
//! from CLI flags, the optional INI config file and built-in defaults, and
//! passed by reference into the components that need it. There is no global
//! mutable configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::client::RetryPolicy;

/// Default seconds between two reconciliation passes.
pub const DEFAULT_REFRESH_SECS: u64 = 30;

/// Default transfer chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Default window for the download speed estimate.
pub const DEFAULT_SPEED_WINDOW_SECS: u64 = 5;

/// Default HTTP connect/read timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default minimum free space in the output directory before new downloads
/// are deferred (1 GB).
pub const DEFAULT_MIN_FREE_BYTES: u64 = 1_000_000_000;

/// Errors raised while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },
}

/// Transfer tuning knobs.
#[derive(Clone, Debug)]
pub struct DownloadConfig {
    /// Size of the chunks streamed to disk.
    pub chunk_size: usize,
    /// Wall-clock window for the rolling speed estimate.
    pub speed_window: Duration,
    /// HTTP connect/read timeout for API and transfer requests.
    pub request_timeout: Duration,
    /// Minimum free space in the output directory before new downloads are
    /// deferred.
    pub min_free_bytes: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            speed_window: Duration::from_secs(DEFAULT_SPEED_WINDOW_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            min_free_bytes: DEFAULT_MIN_FREE_BYTES,
        }
    }
}

impl DownloadConfig {
    /// Sets the transfer chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets the speed estimation window.
    pub fn with_speed_window(mut self, window: Duration) -> Self {
        self.speed_window = window;
        self
    }

    /// Sets the HTTP connect/read timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the free-space threshold for the output directory.
    pub fn with_min_free_bytes(mut self, bytes: u64) -> Self {
        self.min_free_bytes = bytes;
        self
    }
}

/// Top-level application configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Base URL of the order service API.
    pub api_url: String,
    /// Personal API key, sent as `Authorization: Token <key>`.
    pub api_key: String,
    /// Directory where downloaded plot files are stored.
    pub output_dir: PathBuf,
    /// Path of the progress report file rewritten every pass.
    pub progress_file: PathBuf,
    /// Directory where log files are written.
    pub logs_dir: PathBuf,
    /// Time between two reconciliation passes.
    pub refresh_interval: Duration,
    /// Claim plots even when another client appears to be handling them.
    pub force_download: bool,
    /// Transfer tuning.
    pub download: DownloadConfig,
    /// Retry policy for order API calls.
    pub retry: RetryPolicy,
}

impl AppConfig {
    /// Creates a configuration with defaults for everything but the
    /// endpoint, key and output directory.
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        output_dir: PathBuf,
    ) -> Self {
        let progress_file = output_dir.join("progress.txt");
        let logs_dir = output_dir.join("logs");
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            output_dir,
            progress_file,
            logs_dir,
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            force_download: false,
            download: DownloadConfig::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Sets the refresh interval.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Enables claiming plots handled by other clients.
    pub fn with_force_download(mut self, force: bool) -> Self {
        self.force_download = force;
        self
    }

    /// Sets the progress report file path.
    pub fn with_progress_file(mut self, path: PathBuf) -> Self {
        self.progress_file = path;
        self
    }

    /// Sets the log directory.
    pub fn with_logs_dir(mut self, path: PathBuf) -> Self {
        self.logs_dir = path;
        self
    }

    /// The API key with everything but the last four characters masked,
    /// for logging.
    pub fn masked_key(&self) -> String {
        if self.api_key.len() <= 4 {
            "****".to_string()
        } else {
            format!("****{}", &self.api_key[self.api_key.len() - 4..])
        }
    }
}

/// Default location of the config file.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("plotorder")
        .join("config.ini")
}

/// Settings read from the INI config file; every field is optional and CLI
/// flags take precedence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigFile {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub plot_dir: Option<PathBuf>,
    pub progress_file: Option<PathBuf>,
    pub logs_dir: Option<PathBuf>,
}

impl ConfigFile {
    /// Loads the config file from its default location. A missing file is
    /// not an error, just an empty configuration.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Loads the config file from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let api = ini.section(Some("api"));
        let local = ini.section(Some("local"));

        Ok(Self {
            api_url: api.and_then(|s| s.get("url")).map(str::to_string),
            api_key: api.and_then(|s| s.get("key")).map(str::to_string),
            plot_dir: local.and_then(|s| s.get("plot_dir")).map(PathBuf::from),
            progress_file: local
                .and_then(|s| s.get("progress_file"))
                .map(PathBuf::from),
            logs_dir: local.and_then(|s| s.get("logs_dir")).map(PathBuf::from),
        })
    }
}
