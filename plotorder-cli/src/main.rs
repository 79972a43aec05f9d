//! plotorder - automates the download of plot files for an order.
//!
//! The binary wires the library components together: it resolves the
//! configuration from CLI flags and the optional config file, sets up
//! file-based logging, and runs the reconciliation loop until interrupted.
//! The console is reserved for the rendered progress report; everything else
//! goes to the log file.

mod error;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use console::{style, Term};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use plotorder::client::{ApiClient, HttpTransport, ReqwestTransport};
use plotorder::config::{config_file_path, AppConfig, ConfigFile, DEFAULT_REFRESH_SECS};
use plotorder::download::{DownloadEngine, HttpSource, TransferSource};
use plotorder::reconcile::Reconciler;

use error::CliError;

/// Automates the download of plot files from a remote plotting service.
#[derive(Debug, Parser)]
#[command(name = "plotorder", version = plotorder::VERSION)]
struct Cli {
    /// The id of the order to process plots for
    #[arg(long)]
    order_id: Option<String>,

    /// Your personal API key for the plotting service
    #[arg(long)]
    api_key: Option<String>,

    /// Base URL of the plotting service API
    #[arg(long)]
    api_url: Option<String>,

    /// Directory where downloaded plot files are stored
    #[arg(long)]
    plot_dir: Option<PathBuf>,

    /// Path of the progress report file rewritten on every pass
    #[arg(long)]
    progress_file: Option<PathBuf>,

    /// Directory where log files are written
    #[arg(long)]
    logs_dir: Option<PathBuf>,

    /// Seconds between two reconciliation passes
    #[arg(long, default_value_t = DEFAULT_REFRESH_SECS)]
    refresh_period: u64,

    /// Also claim plots that appear to be handled by another client
    #[arg(long)]
    force_download: bool,

    /// List the account's orders and exit
    #[arg(long)]
    list_orders: bool,

    /// Use the given config file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose (DEBUG) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", style(&err).red().bold());
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = ensure_dir(&config.output_dir).and_then(|_| ensure_dir(&config.logs_dir)) {
        eprintln!("{}", style(&err).red().bold());
        return ExitCode::FAILURE;
    }

    // The guard must outlive the run so buffered log lines are flushed.
    let _guard = init_logging(&config.logs_dir, cli.verbose);

    info!(
        version = plotorder::VERSION,
        api_url = %config.api_url,
        api_key = %config.masked_key(),
        output_dir = %config.output_dir.display(),
        refresh_secs = config.refresh_interval.as_secs(),
        force_download = config.force_download,
        "starting plotorder"
    );

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!();
            eprintln!(
                "{}",
                style(format!("Giving up: {}", err)).red().bold()
            );
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: AppConfig) -> Result<(), CliError> {
    let transport = ReqwestTransport::new(config.download.request_timeout)?;
    let client = ApiClient::new(
        transport,
        config.api_url.clone(),
        config.api_key.clone(),
        config.retry.clone(),
    );

    if cli.list_orders {
        return list_orders(&client).await;
    }

    let order_id = cli
        .order_id
        .ok_or_else(|| CliError::Config("--order-id is required".to_string()))?;

    let source = HttpSource::new(config.download.request_timeout)?;
    let engine = DownloadEngine::new(
        Arc::new(source),
        config.output_dir.clone(),
        &config.download,
    );
    let mut reconciler = Reconciler::new(client, engine, &config);

    println!("Loading plots, please wait...");
    let result = drive(&mut reconciler, &order_id, &config).await;

    // Wind down cooperatively in every case, so no partial file is cut off
    // mid-write.
    println!();
    println!("{}", style("   Stopping downloads ...").red().bold());
    reconciler.shutdown().await;

    result
}

/// The reconciliation loop; returns on interrupt or on a fatal error from
/// the order service (retries already exhausted inside the client).
async fn drive<T, S>(
    reconciler: &mut Reconciler<T, S>,
    order_id: &str,
    config: &AppConfig,
) -> Result<(), CliError>
where
    T: HttpTransport,
    S: TransferSource,
{
    let started = Instant::now();
    let mut interval = tokio::time::interval(config.refresh_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received; shutting down");
                return Ok(());
            }
            _ = interval.tick() => {
                reconciler.reconcile_order(order_id).await?;
                reconciler.tick().await?;

                let report = reconciler.snapshot().render(started.elapsed());
                render_console(&report);
                if let Err(err) = tokio::fs::write(&config.progress_file, &report).await {
                    warn!(
                        path = %config.progress_file.display(),
                        error = %err,
                        "could not write the progress file"
                    );
                }
            }
        }
    }
}

async fn list_orders<T: HttpTransport>(client: &ApiClient<T>) -> Result<(), CliError> {
    let orders = client.list_orders().await?;
    if orders.is_empty() {
        println!("No orders found.");
        return Ok(());
    }
    println!("Orders:");
    for order in orders {
        println!("  {}", order.id);
    }
    Ok(())
}

/// Builds the effective configuration: CLI flags win over the config file,
/// which wins over built-in defaults.
fn resolve_config(cli: &Cli) -> Result<AppConfig, CliError> {
    let file = match &cli.config {
        Some(path) => ConfigFile::load_from(path).map_err(|e| CliError::Config(e.to_string()))?,
        None => ConfigFile::load().map_err(|e| CliError::Config(e.to_string()))?,
    };

    let api_url = cli.api_url.clone().or(file.api_url).ok_or_else(|| {
        CliError::Config(format!(
            "no API URL configured; pass --api-url or set [api] url in {}",
            config_file_path().display()
        ))
    })?;
    let api_key = cli.api_key.clone().or(file.api_key).ok_or_else(|| {
        CliError::Config(format!(
            "no API key configured; pass --api-key or set [api] key in {}",
            config_file_path().display()
        ))
    })?;

    let output_dir = cli
        .plot_dir
        .clone()
        .or(file.plot_dir)
        .unwrap_or_else(|| PathBuf::from("plots"));

    let mut config = AppConfig::new(api_url, api_key, output_dir)
        .with_refresh_interval(Duration::from_secs(cli.refresh_period.max(1)))
        .with_force_download(cli.force_download);

    if let Some(path) = cli.progress_file.clone().or(file.progress_file) {
        config = config.with_progress_file(path);
    }
    if let Some(path) = cli.logs_dir.clone().or(file.logs_dir) {
        config = config.with_logs_dir(path);
    }
    Ok(config)
}

fn ensure_dir(path: &Path) -> Result<(), CliError> {
    if path.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(path)
        .map_err(|e| CliError::Io(format!("could not create {}: {}", path.display(), e)))
}

/// Installs the file-based log sink. INFO by default, DEBUG for this crate
/// and the library with `--verbose`; HTTP client noise stays at WARN.
fn init_logging(logs_dir: &Path, verbose: bool) -> tracing_appender::non_blocking::WorkerGuard {
    let directives = if verbose {
        "debug,hyper=warn,reqwest=warn"
    } else {
        "info,hyper=warn,reqwest=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    let appender = tracing_appender::rolling::daily(logs_dir, "plotorder.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    guard
}

fn render_console(report: &str) {
    let term = Term::stdout();
    let _ = term.clear_screen();
    println!("{}", report);
    println!(
        "{}",
        style("Press Ctrl+C to stop; downloads resume on restart.").dim()
    );
}
