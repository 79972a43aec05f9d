//! HTTP transport abstraction for the order API.
//!
//! The [`HttpTransport`] trait decouples the typed client from the actual
//! HTTP stack, enabling mock transports in tests.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::header;

use super::error::ClientError;

/// HTTP method used by the order API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiMethod {
    Get,
    Put,
}

impl fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Put => write!(f, "PUT"),
        }
    }
}

/// One request against the order API.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: ApiMethod,
    pub url: String,
    /// API key sent as `Authorization: Token <key>`.
    pub token: String,
    /// JSON body for PUT requests.
    pub body: Option<String>,
}

/// Raw response from the order API; status checking happens in the client.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

/// Trait for executing order API requests.
pub trait HttpTransport: Send + Sync {
    /// Executes a single HTTP request and returns the raw response.
    ///
    /// A returned `Ok` only means the service answered; the status may still
    /// be a failure and is judged by the caller.
    fn execute(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, ClientError>> + Send;
}

/// Real transport implementation using reqwest.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let builder = match request.method {
            ApiMethod::Get => self.client.get(&request.url),
            ApiMethod::Put => self.client.put(&request.url),
        };

        let mut builder = builder
            .header(header::AUTHORIZATION, format!("Token {}", request.token))
            .header(header::ACCEPT, "application/json");
        if let Some(body) = request.body {
            builder = builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = builder.send().await.map_err(|e| ClientError::Transport {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| ClientError::Transport {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;

        Ok(ApiResponse { status, body })
    }
}
