//! Typed client for the remote order service.
//!
//! [`ApiClient`] wraps the HTTP+JSON order API behind typed operations. Every
//! operation issues one logical request, wrapped by the configured
//! [`RetryPolicy`]: transient failures are retried with a fixed backoff and
//! the final error is returned as a value once the budget is exhausted.
//!
//! The client is generic over [`HttpTransport`] so tests can script the
//! service's behavior without a network.

mod error;
mod http;
mod responses;
mod retry;

use tracing::{debug, warn};

pub use error::{ClientError, ClientResult};
pub use http::{ApiMethod, ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
pub use retry::{RetryPolicy, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY_SECS};

#[cfg(test)]
pub use http::tests::MockTransport;

use crate::plot::{DownloadState, Order, Plot, PlotState};
use responses::{OrderListResponse, PlotListResponse, PlotRecord, UpdatePlotRequest};

/// Typed client for the order service.
pub struct ApiClient<T: HttpTransport> {
    transport: T,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl<T: HttpTransport> ApiClient<T> {
    /// Creates a client for the service at `base_url`.
    pub fn new(
        transport: T,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            api_key: api_key.into(),
            retry,
        }
    }

    /// The underlying transport, for test assertions.
    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    /// Composes an endpoint URL from path segments, normalizing slashes the
    /// way the service expects (every endpoint ends in `/`).
    fn endpoint(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.trim_end_matches('/').to_string();
        for segment in segments {
            url.push('/');
            url.push_str(segment.trim_matches('/'));
        }
        url.push('/');
        url
    }

    /// Lists all orders for the account.
    pub async fn list_orders(&self) -> ClientResult<Vec<Order>> {
        let url = self.endpoint(&["plot_orders"]);
        let body = self.request_with_retry(ApiMethod::Get, &url, None).await?;
        let response: OrderListResponse = decode(&url, &body)?;
        Ok(response
            .results
            .into_iter()
            .map(|record| Order { id: record.id })
            .collect())
    }

    /// Lists all plots of the given order.
    pub async fn list_plots(&self, order_id: &str) -> ClientResult<Vec<Plot>> {
        let url = self.endpoint(&["plot_orders", order_id]);
        let body = self.request_with_retry(ApiMethod::Get, &url, None).await?;
        let response: PlotListResponse = decode(&url, &body)?;
        response
            .plots
            .into_iter()
            .map(|record| {
                record.into_plot().map_err(|e| ClientError::Decode {
                    url: url.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    /// Fetches a single plot.
    pub async fn get_plot(&self, plot_id: &str) -> ClientResult<Plot> {
        let url = self.endpoint(&["plots", plot_id]);
        debug!(plot_id = %plot_id, "fetching plot");
        let body = self.request_with_retry(ApiMethod::Get, &url, None).await?;
        let record: PlotRecord = decode(&url, &body)?;
        record.into_plot().map_err(|e| ClientError::Decode {
            url,
            reason: e.to_string(),
        })
    }

    /// Reports to the service that this client started downloading the plot.
    pub async fn set_downloading(&self, plot_id: &str) -> ClientResult<()> {
        debug!(plot_id = %plot_id, "reporting download start");
        self.update_plot(plot_id, None, DownloadState::Downloading)
            .await
    }

    /// Asks the service to expire (delete) the plot. Callers only do this
    /// once the download state is `Downloaded`.
    pub async fn mark_expired(
        &self,
        plot_id: &str,
        download_state: DownloadState,
    ) -> ClientResult<()> {
        debug!(plot_id = %plot_id, "expiring plot remotely");
        self.update_plot(plot_id, Some(PlotState::Expired), download_state)
            .await
    }

    async fn update_plot(
        &self,
        plot_id: &str,
        state: Option<PlotState>,
        download_state: DownloadState,
    ) -> ClientResult<()> {
        let url = self.endpoint(&["plots", plot_id]);
        let payload = UpdatePlotRequest {
            id: plot_id,
            state: state.map(|s| s.as_wire()),
            download_state: download_state.as_wire(),
        };
        let body = serde_json::to_string(&payload).map_err(|e| ClientError::Decode {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        let response_body = self
            .request_with_retry(ApiMethod::Put, &url, Some(body))
            .await?;

        // The service echoes the updated record; a mismatched id means the
        // update landed somewhere unexpected.
        let echoed: PlotRecord = decode(&url, &response_body)?;
        if echoed.id != plot_id {
            warn!(
                plot_id = %plot_id,
                echoed_id = %echoed.id,
                "update response does not carry the requested plot id"
            );
        }
        Ok(())
    }

    /// Executes one request, retrying per the configured policy.
    async fn request_with_retry(
        &self,
        method: ApiMethod,
        url: &str,
        body: Option<String>,
    ) -> ClientResult<String> {
        let mut attempt = 1;
        loop {
            match self.request(method, url, body.clone()).await {
                Ok(response_body) => return Ok(response_body),
                Err(err) if err.is_retryable() => match self.retry.delay_for_attempt(attempt) {
                    Some(delay) => {
                        warn!(
                            url = %url,
                            attempt,
                            delay_secs = delay.as_secs_f64(),
                            error = %err,
                            "remote call failed; will retry"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        warn!(url = %url, attempt, error = %err, "remote call failed; retries exhausted");
                        return Err(err);
                    }
                },
                Err(err) => return Err(err),
            }
        }
    }

    async fn request(
        &self,
        method: ApiMethod,
        url: &str,
        body: Option<String>,
    ) -> ClientResult<String> {
        let response = self
            .transport
            .execute(ApiRequest {
                method,
                url: url.to_string(),
                token: self.api_key.clone(),
                body,
            })
            .await?;

        if !(200..300).contains(&response.status) {
            return Err(ClientError::Remote {
                url: url.to_string(),
                status: response.status,
                body: response.body,
            });
        }
        Ok(response.body)
    }
}

fn decode<'a, D: serde::Deserialize<'a>>(url: &str, body: &'a str) -> ClientResult<D> {
    serde_json::from_str(body).map_err(|e| ClientError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}
