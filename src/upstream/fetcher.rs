//! Single-source JSON fetching.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::resilience::retries::{RetryingSender, SendError};
use crate::upstream::transport::OutboundRequest;

/// Any failure while fetching one source.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Send(#[from] SendError),

    #[error("response from {url} is not valid JSON: {error}")]
    Decode {
        url: String,
        #[source]
        error: serde_json::Error,
    },
}

/// Fetches one URL and returns its body as structured JSON.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError>;
}

/// Issues GET requests through a `RetryingSender` and decodes the body.
///
/// Never retries on its own; a decode failure fails the fetch outright.
pub struct JsonFetcher {
    sender: RetryingSender,
    request_timeout: Duration,
}

impl JsonFetcher {
    pub fn new(sender: RetryingSender, request_timeout: Duration) -> Self {
        Self {
            sender,
            request_timeout,
        }
    }
}

#[async_trait]
impl SourceFetcher for JsonFetcher {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        let request = OutboundRequest::get(url, self.request_timeout);
        let response = self.sender.send(&request).await?;

        serde_json::from_slice(&response.body).map_err(|error| {
            tracing::warn!(url = %url, error = %error, "Upstream returned malformed JSON");
            FetchError::Decode {
                url: url.to_string(),
                error,
            }
        })
    }
}
