//! Transfer source abstraction for plot files.
//!
//! The engine only needs two things from the server behind a plot URL: a
//! (possibly range-offset) byte stream and a fresh content-length probe for
//! the completion check. Both sit behind [`TransferSource`] so tests can run
//! complete transfers against in-memory data.

use std::future::Future;
use std::io;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::header;

use super::error::DownloadError;

/// Response to a transfer request.
pub struct SourceResponse {
    /// Content type reported by the server. A `text/html` value is the
    /// already-fully-served sentinel: there is nothing left to download.
    pub content_type: Option<String>,

    /// Number of bytes the server is about to send (the remaining length
    /// when the request carried a range offset).
    pub remaining_bytes: Option<u64>,

    /// The response body.
    pub body: BoxStream<'static, io::Result<Bytes>>,
}

impl SourceResponse {
    /// Whether the server signalled that the file is already fully served.
    pub fn is_already_served(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.starts_with("text/html"))
            .unwrap_or(false)
    }
}

/// Trait for fetching plot file bytes.
pub trait TransferSource: Send + Sync + 'static {
    /// Requests the file starting at `offset` bytes.
    fn fetch(
        &self,
        url: &str,
        offset: u64,
    ) -> impl Future<Output = Result<SourceResponse, DownloadError>> + Send;

    /// Probes the full content length of the file with a fresh request.
    fn content_length(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<u64, DownloadError>> + Send;
}

/// Real transfer source issuing HTTP range requests via reqwest.
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    /// Creates a source with the given per-read timeout.
    ///
    /// A whole-request timeout would abort long transfers halfway, so only
    /// the connect and read timeouts are bounded.
    pub fn new(timeout: Duration) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| DownloadError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl TransferSource for HttpSource {
    async fn fetch(&self, url: &str, offset: u64) -> Result<SourceResponse, DownloadError> {
        let mut request = self.client.get(url);
        if offset > 0 {
            request = request.header(header::RANGE, format!("bytes={}-", offset));
        }

        let response = request.send().await.map_err(|e| DownloadError::Transfer {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Transfer {
                url: url.to_string(),
                reason: format!("unexpected HTTP status {}", status),
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let remaining_bytes = response.content_length();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(io::Error::other))
            .boxed();

        Ok(SourceResponse {
            content_type,
            remaining_bytes,
            body,
        })
    }

    async fn content_length(&self, url: &str) -> Result<u64, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::Transfer {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Transfer {
                url: url.to_string(),
                reason: format!("unexpected HTTP status {}", status),
            });
        }

        // The body is dropped unread; only the header matters here.
        response.content_length().ok_or(DownloadError::UnknownSize)
    }
}
