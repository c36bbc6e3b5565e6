//! Retry logic.
//!
//! # Responsibilities
//! - Send one outbound request through a `Transport`
//! - Retry transport failures and non-2xx statuses on the same budget
//! - Wait a fixed delay between attempts
//!
//! # Design Decisions
//! - One counter for both failure kinds: `count` retries means `count + 1` attempts
//! - Fixed delay, no jitter or exponential growth
//! - Intermediate failures are logged, only the final outcome is returned

use std::sync::Arc;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::upstream::transport::{OutboundRequest, Transport, TransportError, UpstreamResponse};

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first.
    pub retries: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    /// Total number of attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.count, config.delay())
    }
}

/// Final outcome of a send once all attempts are used up.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SendError {
    #[error("request to {url} failed with status {status} after {attempts} attempt(s)")]
    Status { url: String, status: u16, attempts: u32 },

    #[error("request to {url} failed after {attempts} attempt(s): {error}")]
    Transport {
        url: String,
        #[source]
        error: TransportError,
        attempts: u32,
    },
}

impl SendError {
    /// Attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            SendError::Status { attempts, .. } | SendError::Transport { attempts, .. } => *attempts,
        }
    }
}

/// Sends requests through a transport, retrying on failure.
pub struct RetryingSender {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl RetryingSender {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Send `request`, returning the first response with a 2xx status.
    pub async fn send(&self, request: &OutboundRequest) -> Result<UpstreamResponse, SendError> {
        tracing::debug!(url = %request.url, "Sending upstream request");

        let max_attempts = self.policy.max_attempts();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let remaining = max_attempts - attempts;

            let failure = match self.transport.execute(request).await {
                Ok(response) if response.is_success() => {
                    metrics::record_upstream_attempt("success");
                    tracing::info!(url = %request.url, status = response.status, attempt = attempts, "Upstream request succeeded");
                    return Ok(response);
                }
                Ok(response) => {
                    metrics::record_upstream_attempt("status");
                    SendError::Status {
                        url: request.url.clone(),
                        status: response.status,
                        attempts,
                    }
                }
                Err(error) => {
                    metrics::record_upstream_attempt("transport");
                    SendError::Transport {
                        url: request.url.clone(),
                        error,
                        attempts,
                    }
                }
            };

            if remaining == 0 {
                tracing::error!(url = %request.url, error = %failure, "Upstream request failed after retries");
                return Err(failure);
            }

            tracing::warn!(
                url = %request.url,
                error = %failure,
                remaining,
                delay = ?self.policy.delay,
                "Upstream request failed, retrying"
            );
            tokio::time::sleep(self.policy.delay).await;
        }
    }
}
