//! Periodic reconciliation of tracked plots against the order service.
//!
//! The [`Reconciler`] owns the registry of tracked plots. Each pass consists
//! of [`Reconciler::reconcile_order`] (diff the registry against the fresh
//! remote list) followed by [`Reconciler::tick`] (advance every plot's state
//! machine, starting, resuming or expiring downloads as needed).
//!
//! Within one pass plots are processed in registry order. The reconciler is
//! the only writer of lifecycle fields; transfer tasks write only their
//! plot's shared progress fields.

mod claim;

use std::path::PathBuf;

pub use claim::should_claim;

use tracing::{debug, info, warn};

use crate::client::{ApiClient, ClientResult, HttpTransport};
use crate::config::AppConfig;
use crate::disk;
use crate::download::{DownloadEngine, TransferHandle, TransferSource};
use crate::plot::{DownloadState, Plot, PlotState};
use crate::report::ReportSnapshot;

/// A registry entry: a plot and, while one is running, its transfer task.
struct TrackedPlot {
    plot: Plot,
    transfer: Option<TransferHandle>,
}

impl TrackedPlot {
    fn new(plot: Plot) -> Self {
        Self {
            plot,
            transfer: None,
        }
    }

    /// Whether a transfer task for this plot is currently running.
    fn transfer_is_live(&self) -> bool {
        self.transfer.as_ref().is_some_and(|h| h.is_running())
    }
}

/// Reconciles local plot state with the order service and drives downloads.
pub struct Reconciler<T: HttpTransport, S: TransferSource> {
    client: ApiClient<T>,
    engine: DownloadEngine<S>,
    output_dir: PathBuf,
    force_download: bool,
    min_free_bytes: u64,
    plots: Vec<TrackedPlot>,
    other_clients: usize,
}

impl<T: HttpTransport, S: TransferSource> Reconciler<T, S> {
    /// Creates a reconciler with an empty registry.
    pub fn new(client: ApiClient<T>, engine: DownloadEngine<S>, config: &AppConfig) -> Self {
        Self {
            client,
            engine,
            output_dir: config.output_dir.clone(),
            force_download: config.force_download,
            min_free_bytes: config.download.min_free_bytes,
            plots: Vec::new(),
            other_clients: 0,
        }
    }

    /// Fetches the order's current plot list and diffs it against the
    /// registry.
    ///
    /// Known plots get their remote-reported fields refreshed; unknown plots
    /// are added when the ownership heuristic claims them; tracked plots that
    /// disappeared remotely are removed unless a transfer is still live or
    /// the plot is still marked downloading.
    pub async fn reconcile_order(&mut self, order_id: &str) -> ClientResult<()> {
        let fresh = self.client.list_plots(order_id).await?;
        debug!(order_id = %order_id, count = fresh.len(), "fetched remote plot list");

        let fresh_ids: Vec<String> = fresh.iter().map(|p| p.id().to_string()).collect();
        let mut other_clients = 0;

        for incoming in fresh {
            match self
                .plots
                .iter_mut()
                .find(|t| t.plot.id() == incoming.id())
            {
                Some(tracked) => tracked.plot.update_remote(&incoming),
                None => {
                    if should_claim(&incoming, &self.output_dir, self.force_download) {
                        info!(
                            plot_id = %incoming.id(),
                            order_id = %order_id,
                            "new plot appeared on the order"
                        );
                        self.plots.push(TrackedPlot::new(incoming));
                    } else {
                        debug!(
                            plot_id = %incoming.id(),
                            "skipping plot handled by another client"
                        );
                        other_clients += 1;
                    }
                }
            }
        }
        self.other_clients = other_clients;

        self.plots.retain(|tracked| {
            if fresh_ids.iter().any(|id| id == tracked.plot.id()) {
                return true;
            }
            if tracked.transfer_is_live()
                || tracked.plot.download_state() == DownloadState::Downloading
            {
                warn!(
                    plot_id = %tracked.plot.id(),
                    "plot disappeared from the order but its download is still active; keeping it"
                );
                true
            } else {
                info!(plot_id = %tracked.plot.id(), "plot disappeared from the order; removing");
                false
            }
        });

        Ok(())
    }

    /// One pass over the registry, advancing every plot's state machine.
    pub async fn tick(&mut self) -> ClientResult<()> {
        let allow_new_downloads = self.check_free_space();

        for i in 0..self.plots.len() {
            match self.plots[i].plot.state() {
                PlotState::Pending | PlotState::Plotting => self.refresh_plot(i).await,
                PlotState::Published => self.advance_published(i, allow_new_downloads).await?,
                PlotState::Cancelled | PlotState::Expired => {}
            }
        }
        Ok(())
    }

    /// Re-fetches a plot, keeping the previous state when the refresh fails.
    async fn refresh_plot(&mut self, i: usize) {
        let id = self.plots[i].plot.id().to_string();
        match self.client.get_plot(&id).await {
            Ok(fresh) => self.plots[i].plot = fresh,
            Err(err) => warn!(
                plot_id = %id,
                error = %err,
                "failed to refresh plot; keeping previous state"
            ),
        }
    }

    async fn advance_published(&mut self, i: usize, allow_new_downloads: bool) -> ClientResult<()> {
        let id = self.plots[i].plot.id().to_string();
        match self.plots[i].plot.download_state() {
            DownloadState::NotStarted => {
                if !allow_new_downloads {
                    warn!(plot_id = %id, "deferring download start: output directory is low on space");
                    return Ok(());
                }
                self.start_download(i).await
            }
            DownloadState::Downloading => {
                if self.plots[i].transfer_is_live() {
                    debug!(plot_id = %id, "download in progress");
                    return Ok(());
                }
                // Download marked in progress but no task is running: either
                // a previous task died, or another process reported it.
                warn!(plot_id = %id, "download is not running; re-fetching the plot to resume");
                match self.client.get_plot(&id).await {
                    Ok(fresh) => {
                        self.plots[i].plot = fresh;
                        self.plots[i].transfer = None;
                        if allow_new_downloads {
                            self.start_download(i).await?;
                        }
                    }
                    Err(err) => warn!(
                        plot_id = %id,
                        error = %err,
                        "failed to refresh plot before resuming; keeping previous state"
                    ),
                }
                Ok(())
            }
            DownloadState::Downloaded => {
                info!(plot_id = %id, "download finished; expiring the plot remotely");
                self.client
                    .mark_expired(&id, DownloadState::Downloaded)
                    .await?;
                self.plots[i].plot.set_state(PlotState::Expired);
                self.plots[i].transfer = None;
                Ok(())
            }
        }
    }

    /// Starts (or resumes) the download of the plot at registry index `i`.
    ///
    /// The transition into the downloading state is reported to the service
    /// only the first time; a resume of an already-reported download stays
    /// silent.
    async fn start_download(&mut self, i: usize) -> ClientResult<()> {
        let id = self.plots[i].plot.id().to_string();
        if self.plots[i].transfer_is_live() {
            warn!(plot_id = %id, "a transfer is already running; not starting another");
            return Ok(());
        }

        let first_report = self.plots[i].plot.download_state() != DownloadState::Downloading;

        match self.engine.start(&self.plots[i].plot) {
            Ok(handle) => self.plots[i].transfer = Some(handle),
            Err(err) => {
                // Not fatal: e.g. the plot lost its published state on a
                // refresh, or the URL is unusable. The next pass re-judges.
                warn!(plot_id = %id, error = %err, "cannot start download; skipping");
                return Ok(());
            }
        }

        if first_report {
            self.client.set_downloading(&id).await?;
        }
        Ok(())
    }

    fn check_free_space(&self) -> bool {
        match disk::available_space(&self.output_dir) {
            Some(available) if available < self.min_free_bytes => {
                warn!(
                    available,
                    min_free = self.min_free_bytes,
                    output_dir = %self.output_dir.display(),
                    "output directory is running out of space"
                );
                false
            }
            _ => true,
        }
    }

    /// Asks every live transfer to stop at its next chunk boundary.
    pub fn request_shutdown(&self) {
        for tracked in &self.plots {
            if let Some(handle) = &tracked.transfer {
                if handle.is_running() {
                    handle.request_cancel();
                }
            }
        }
    }

    /// Cooperative shutdown: cancels every live transfer, then waits for all
    /// transfer tasks to exit so no partial file is cut off mid-write.
    pub async fn shutdown(&mut self) {
        self.request_shutdown();
        for tracked in &mut self.plots {
            if let Some(handle) = tracked.transfer.take() {
                handle.join().await;
            }
        }
        info!("all transfer tasks stopped");
    }

    /// Point-in-time snapshot of the registry for rendering.
    pub fn snapshot(&self) -> ReportSnapshot {
        ReportSnapshot::collect(self.plots.iter().map(|t| &t.plot), self.other_clients)
    }

    #[cfg(test)]
    pub(crate) fn tracked_ids(&self) -> Vec<String> {
        self.plots.iter().map(|t| t.plot.id().to_string()).collect()
    }

    #[cfg(test)]
    pub(crate) fn tracked_plot(&self, id: &str) -> Option<&Plot> {
        self.plots
            .iter()
            .find(|t| t.plot.id() == id)
            .map(|t| &t.plot)
    }

    #[cfg(test)]
    pub(crate) fn transfer_live(&self, id: &str) -> bool {
        self.plots
            .iter()
            .find(|t| t.plot.id() == id)
            .map(|t| t.transfer_is_live())
            .unwrap_or(false)
    }

    #[cfg(test)]
    pub(crate) async fn wait_for_transfers(&mut self) {
        for tracked in &mut self.plots {
            if let Some(handle) = tracked.transfer.take() {
                handle.join().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiMethod, MockTransport, RetryPolicy};
    use crate::config::DownloadConfig;
    use crate::download::MockSource;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    const BASE: &str = "http://api.test/v1";
    const ORDER_URL: &str = "http://api.test/v1/plot_orders/o1/";

    fn plot_record(id: &str, state: &str, download_state: u8, with_url: bool) -> String {
        let url = if with_url {
            format!(r#", "url": "https://host/files/{}.dat""#, id)
        } else {
            String::new()
        };
        format!(
            r#"{{"id": "{}", "state": "{}", "progress": 100, "download_state": {}{}}}"#,
            id, state, download_state, url
        )
    }

    fn order_body(records: &[String]) -> String {
        format!(r#"{{"plots": [{}]}}"#, records.join(", "))
    }

    struct Fixture {
        dir: TempDir,
        reconciler: Reconciler<MockTransport, MockSource>,
    }

    impl Fixture {
        fn new(source: MockSource) -> Self {
            let dir = TempDir::new().unwrap();
            let config = AppConfig::new(BASE, "secret", dir.path().to_path_buf());
            Self::with_config(source, dir, config)
        }

        fn with_config(source: MockSource, dir: TempDir, mut config: AppConfig) -> Self {
            config.retry = RetryPolicy::None;
            config.download = DownloadConfig::default()
                .with_chunk_size(128)
                .with_speed_window(Duration::from_millis(50))
                .with_min_free_bytes(0);
            let client = ApiClient::new(
                MockTransport::new(),
                config.api_url.clone(),
                config.api_key.clone(),
                config.retry.clone(),
            );
            let engine = DownloadEngine::new(
                Arc::new(source),
                config.output_dir.clone(),
                &config.download,
            );
            let reconciler = Reconciler::new(client, engine, &config);
            Self { dir, reconciler }
        }

        fn transport(&self) -> &MockTransport {
            self.reconciler.client.transport()
        }

        fn source(&self) -> &MockSource {
            self.reconciler.engine.source()
        }
    }

    fn test_data(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[tokio::test]
    async fn test_reconcile_adds_new_and_keeps_known() {
        let mut fixture = Fixture::new(MockSource::new(vec![]));
        fixture.transport().stub(
            ApiMethod::Get,
            ORDER_URL,
            200,
            &order_body(&[plot_record("a1", "R", 0, false)]),
        );
        fixture.reconciler.reconcile_order("o1").await.unwrap();
        assert_eq!(fixture.reconciler.tracked_ids(), vec!["a1"]);

        // Locally mark a1 as downloading, then a second pass brings a new
        // plot and fresher remote fields for the known one.
        fixture
            .reconciler
            .tracked_plot("a1")
            .unwrap()
            .progress()
            .set_download_state(DownloadState::Downloading);
        fixture.transport().stub(
            ApiMethod::Get,
            ORDER_URL,
            200,
            &order_body(&[
                plot_record("a1", "D", 0, true),
                plot_record("a2", "P", 0, false),
            ]),
        );
        fixture.reconciler.reconcile_order("o1").await.unwrap();

        assert_eq!(fixture.reconciler.tracked_ids(), vec!["a1", "a2"]);
        let known = fixture.reconciler.tracked_plot("a1").unwrap();
        // Remote-reported fields updated, local download state untouched.
        assert_eq!(known.state(), PlotState::Published);
        assert_eq!(known.url(), Some("https://host/files/a1.dat"));
        assert_eq!(known.download_state(), DownloadState::Downloading);
    }

    #[tokio::test]
    async fn test_reconcile_skips_plots_of_other_clients() {
        let fixture = Fixture::new(MockSource::new(vec![]));
        fixture.transport().stub(
            ApiMethod::Get,
            ORDER_URL,
            200,
            &order_body(&[
                plot_record("a1", "D", 1, true), // downloading elsewhere, no local file
                plot_record("a2", "P", 0, false),
            ]),
        );
        let mut reconciler = fixture.reconciler;
        reconciler.reconcile_order("o1").await.unwrap();

        assert_eq!(reconciler.tracked_ids(), vec!["a2"]);
        assert_eq!(reconciler.snapshot().other_clients, 1);
    }

    #[tokio::test]
    async fn test_reconcile_claims_downloading_plot_with_local_file() {
        let fixture = Fixture::new(MockSource::new(vec![]));
        std::fs::write(fixture.dir.path().join("a1.dat"), b"partial").unwrap();
        fixture.transport().stub(
            ApiMethod::Get,
            ORDER_URL,
            200,
            &order_body(&[plot_record("a1", "D", 1, true)]),
        );
        let mut reconciler = fixture.reconciler;
        reconciler.reconcile_order("o1").await.unwrap();

        assert_eq!(reconciler.tracked_ids(), vec!["a1"]);
    }

    #[tokio::test]
    async fn test_reconcile_removes_vanished_idle_plot() {
        let mut fixture = Fixture::new(MockSource::new(vec![]));
        fixture.transport().stub(
            ApiMethod::Get,
            ORDER_URL,
            200,
            &order_body(&[plot_record("a1", "P", 0, false)]),
        );
        fixture.reconciler.reconcile_order("o1").await.unwrap();
        assert_eq!(fixture.reconciler.tracked_ids(), vec!["a1"]);

        fixture
            .transport()
            .stub(ApiMethod::Get, ORDER_URL, 200, &order_body(&[]));
        fixture.reconciler.reconcile_order("o1").await.unwrap();
        assert!(fixture.reconciler.tracked_ids().is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_keeps_vanished_plot_with_live_transfer() {
        // Slow source keeps the transfer alive across the second pass.
        let data = test_data(64 * 200);
        let source = MockSource::new(data).with_throttle(Duration::from_millis(5));
        let mut fixture = Fixture::new(source);

        fixture.transport().stub(
            ApiMethod::Get,
            ORDER_URL,
            200,
            &order_body(&[plot_record("a1", "D", 0, true)]),
        );
        fixture.transport().stub(
            ApiMethod::Put,
            "http://api.test/v1/plots/a1/",
            200,
            &plot_record("a1", "D", 1, true),
        );
        fixture.reconciler.reconcile_order("o1").await.unwrap();
        fixture.reconciler.tick().await.unwrap();
        assert!(fixture.reconciler.transfer_live("a1"));

        fixture
            .transport()
            .stub(ApiMethod::Get, ORDER_URL, 200, &order_body(&[]));
        fixture.reconciler.reconcile_order("o1").await.unwrap();

        // Still tracked despite being absent remotely.
        assert_eq!(fixture.reconciler.tracked_ids(), vec!["a1"]);

        fixture.reconciler.request_shutdown();
        fixture.reconciler.wait_for_transfers().await;
    }

    #[tokio::test]
    async fn test_tick_starts_download_and_reports_it() {
        let data = test_data(1000);
        let mut fixture = Fixture::new(MockSource::new(data.clone()));

        fixture.transport().stub(
            ApiMethod::Get,
            ORDER_URL,
            200,
            &order_body(&[plot_record("a1", "D", 0, true)]),
        );
        fixture.transport().stub(
            ApiMethod::Put,
            "http://api.test/v1/plots/a1/",
            200,
            &plot_record("a1", "D", 1, true),
        );

        fixture.reconciler.reconcile_order("o1").await.unwrap();
        fixture.reconciler.tick().await.unwrap();
        fixture.reconciler.wait_for_transfers().await;

        // The download completed and the start was reported exactly once.
        let plot = fixture.reconciler.tracked_plot("a1").unwrap();
        assert_eq!(plot.download_state(), DownloadState::Downloaded);
        assert_eq!(
            fixture
                .transport()
                .request_count(ApiMethod::Put, "http://api.test/v1/plots/a1/"),
            1
        );
        let written = std::fs::read(fixture.dir.path().join("a1.dat")).unwrap();
        assert_eq!(written, data);
    }

    #[tokio::test]
    async fn test_tick_never_starts_second_transfer() {
        let data = test_data(64 * 200);
        let source = MockSource::new(data).with_throttle(Duration::from_millis(5));
        let mut fixture = Fixture::new(source);

        fixture.transport().stub(
            ApiMethod::Get,
            ORDER_URL,
            200,
            &order_body(&[plot_record("a1", "D", 0, true)]),
        );
        fixture.transport().stub(
            ApiMethod::Put,
            "http://api.test/v1/plots/a1/",
            200,
            &plot_record("a1", "D", 1, true),
        );

        fixture.reconciler.reconcile_order("o1").await.unwrap();
        fixture.reconciler.tick().await.unwrap();
        assert!(fixture.reconciler.transfer_live("a1"));

        // Further ticks while the transfer is live must not fetch again.
        fixture.reconciler.tick().await.unwrap();
        fixture.reconciler.tick().await.unwrap();
        assert_eq!(fixture.source().fetch_count(), 1);

        fixture.reconciler.request_shutdown();
        fixture.reconciler.wait_for_transfers().await;
    }

    #[tokio::test]
    async fn test_tick_resumes_dead_download() {
        let data = test_data(1000);
        let mut fixture = Fixture::new(MockSource::new(data.clone()));
        // 400 bytes already on disk from a previous (crashed) run.
        std::fs::write(fixture.dir.path().join("a1.dat"), &data[..400]).unwrap();

        fixture.transport().stub(
            ApiMethod::Get,
            ORDER_URL,
            200,
            &order_body(&[plot_record("a1", "D", 1, true)]),
        );
        fixture.transport().stub(
            ApiMethod::Get,
            "http://api.test/v1/plots/a1/",
            200,
            &plot_record("a1", "D", 1, true),
        );

        fixture.reconciler.reconcile_order("o1").await.unwrap();
        fixture.reconciler.tick().await.unwrap();
        fixture.reconciler.wait_for_transfers().await;

        // The dead download was detected, the plot re-fetched and the
        // transfer resumed from byte 400.
        assert_eq!(
            fixture
                .transport()
                .request_count(ApiMethod::Get, "http://api.test/v1/plots/a1/"),
            1
        );
        assert_eq!(fixture.source().fetch_offsets(), vec![400]);
        let plot = fixture.reconciler.tracked_plot("a1").unwrap();
        assert_eq!(plot.download_state(), DownloadState::Downloaded);
        let written = std::fs::read(fixture.dir.path().join("a1.dat")).unwrap();
        assert_eq!(written, data);
        // No second report: the remote already knows it is downloading.
        assert_eq!(
            fixture
                .transport()
                .request_count(ApiMethod::Put, "http://api.test/v1/plots/a1/"),
            0
        );
    }

    #[tokio::test]
    async fn test_tick_expires_downloaded_plot() {
        let mut fixture = Fixture::new(MockSource::new(vec![]));
        fixture.transport().stub(
            ApiMethod::Get,
            ORDER_URL,
            200,
            &order_body(&[plot_record("a1", "D", 0, true)]),
        );
        fixture.reconciler.reconcile_order("o1").await.unwrap();
        // Simulate a finished download.
        fixture
            .reconciler
            .tracked_plot("a1")
            .unwrap()
            .progress()
            .set_download_state(DownloadState::Downloaded);

        fixture.transport().stub(
            ApiMethod::Put,
            "http://api.test/v1/plots/a1/",
            200,
            &plot_record("a1", "X", 2, true),
        );
        fixture.reconciler.tick().await.unwrap();

        let plot = fixture.reconciler.tracked_plot("a1").unwrap();
        assert_eq!(plot.state(), PlotState::Expired);
        let requests = fixture.transport().requests();
        let expire = requests
            .iter()
            .find(|r| r.method == ApiMethod::Put)
            .unwrap();
        assert_eq!(
            expire.body.as_deref().unwrap(),
            r#"{"id":"a1","state":"X","download_state":2}"#
        );
    }

    #[tokio::test]
    async fn test_mark_expired_only_after_downloaded() {
        let mut fixture = Fixture::new(MockSource::new(test_data(64 * 200)));
        fixture.transport().stub(
            ApiMethod::Get,
            ORDER_URL,
            200,
            &order_body(&[plot_record("a1", "D", 0, true)]),
        );
        fixture.transport().stub(
            ApiMethod::Put,
            "http://api.test/v1/plots/a1/",
            200,
            &plot_record("a1", "D", 1, true),
        );
        fixture.reconciler.reconcile_order("o1").await.unwrap();
        fixture.reconciler.tick().await.unwrap();
        fixture.reconciler.wait_for_transfers().await;

        // The only PUT so far is the downloading report, not an expiry.
        let requests = fixture.transport().requests();
        let puts: Vec<_> = requests
            .iter()
            .filter(|r| r.method == ApiMethod::Put)
            .collect();
        assert_eq!(puts.len(), 1);
        assert!(!puts[0].body.as_deref().unwrap().contains(r#""state":"X""#));
    }

    #[tokio::test]
    async fn test_tick_refreshes_pending_and_plotting() {
        let mut fixture = Fixture::new(MockSource::new(vec![]));
        fixture.transport().stub(
            ApiMethod::Get,
            ORDER_URL,
            200,
            &order_body(&[plot_record("a1", "P", 0, false)]),
        );
        fixture.reconciler.reconcile_order("o1").await.unwrap();

        fixture.transport().stub(
            ApiMethod::Get,
            "http://api.test/v1/plots/a1/",
            200,
            &plot_record("a1", "R", 0, false),
        );
        fixture.reconciler.tick().await.unwrap();

        let plot = fixture.reconciler.tracked_plot("a1").unwrap();
        assert_eq!(plot.state(), PlotState::Plotting);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_state() {
        let mut fixture = Fixture::new(MockSource::new(vec![]));
        fixture.transport().stub(
            ApiMethod::Get,
            ORDER_URL,
            200,
            &order_body(&[plot_record("a1", "R", 0, false)]),
        );
        fixture.reconciler.reconcile_order("o1").await.unwrap();

        // No stub for the plot refresh: the call fails, the plot stays.
        fixture.reconciler.tick().await.unwrap();
        let plot = fixture.reconciler.tracked_plot("a1").unwrap();
        assert_eq!(plot.state(), PlotState::Plotting);
    }

    #[tokio::test]
    async fn test_shutdown_stops_all_transfers() {
        let data = test_data(64 * 400);
        let source = MockSource::new(data).with_throttle(Duration::from_millis(5));
        let mut fixture = Fixture::new(source);

        fixture.transport().stub(
            ApiMethod::Get,
            ORDER_URL,
            200,
            &order_body(&[plot_record("a1", "D", 0, true)]),
        );
        fixture.transport().stub(
            ApiMethod::Put,
            "http://api.test/v1/plots/a1/",
            200,
            &plot_record("a1", "D", 1, true),
        );
        fixture.reconciler.reconcile_order("o1").await.unwrap();
        fixture.reconciler.tick().await.unwrap();
        assert!(fixture.reconciler.transfer_live("a1"));

        fixture.reconciler.shutdown().await;
        assert!(!fixture.reconciler.transfer_live("a1"));
        // Cancelled mid-stream: partial file, still resumable.
        let plot = fixture.reconciler.tracked_plot("a1").unwrap();
        assert_eq!(plot.download_state(), DownloadState::Downloading);
    }

    #[tokio::test]
    async fn test_terminal_plots_are_left_alone() {
        let mut fixture = Fixture::new(MockSource::new(vec![]));
        fixture.transport().stub(
            ApiMethod::Get,
            ORDER_URL,
            200,
            &order_body(&[
                plot_record("a1", "C", 0, false),
                plot_record("a2", "X", 0, false),
            ]),
        );
        fixture.reconciler.reconcile_order("o1").await.unwrap();
        fixture.reconciler.tick().await.unwrap();

        // No plot refreshes, no downloads, no updates: only the list fetch.
        assert_eq!(fixture.transport().requests().len(), 1);
    }
}
