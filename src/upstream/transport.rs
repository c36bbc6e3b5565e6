//! Outbound HTTP transport.
//!
//! # Responsibilities
//! - Perform exactly one outbound GET per call, no retries
//! - Apply the per-request timeout carried by the request
//! - Report connection errors and timeouts as `TransportError`
//! - Release the shared connection pool on `close`
//!
//! Retrying is layered on top by `resilience::retries::RetryingSender`.

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use axum::body::Bytes;
use std::time::Duration;

use crate::config::UpstreamConfig;

/// A single logical outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub url: String,
    pub timeout: Duration,
}

impl OutboundRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }
}

/// Status and fully-read body of an upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Status in `[200, 300)`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure of the transport call itself.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("transport is closed")]
    Closed,
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// One attempt at sending a request.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &OutboundRequest) -> Result<UpstreamResponse, TransportError>;

    /// Release pooled connections. Idempotent.
    fn close(&self) {}
}

/// `reqwest`-backed transport sharing one connection pool.
pub struct HttpTransport {
    client: ArcSwapOption<reqwest::Client>,
}

impl HttpTransport {
    /// Build a client with the configured connection timeout.
    pub fn new(config: &UpstreamConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .user_agent(concat!("dashboard-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client: ArcSwapOption::from_pointee(client),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &OutboundRequest) -> Result<UpstreamResponse, TransportError> {
        let client = self.client.load_full().ok_or(TransportError::Closed)?;
        let response = client
            .get(&request.url)
            .timeout(request.timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(UpstreamResponse { status, body })
    }

    fn close(&self) {
        if self.client.swap(None).is_some() {
            tracing::info!("Upstream HTTP client released");
        }
    }
}
