//! `GET /api/dashboard`.
//!
//! # States
//! ```text
//! AGGREGATING ─ok──▶ CACHE_WRITE ─ok──▶ RESPOND_OK (200, fresh)
//!      │                  └─err─▶ RESPOND_ERROR_UNEXPECTED (500)
//!      └─err─▶ CACHE_LOOKUP ─hit──▶ RESPOND_OK_CACHED (200, cached)
//!                   └─miss / err─▶ RESPOND_ERROR_NO_DATA (500)
//! ```
//!
//! The state walk produces a `DashboardOutcome`; only then is the single
//! response written.

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use std::sync::Arc;

use crate::cache::CacheStore;
use crate::endpoint::{Endpoint, EndpointProcessor};
use crate::http::context::RequestContext;
use crate::http::response::{ErrorPayload, ResponseWriteError};
use crate::observability::metrics;
use crate::upstream::{AggregatedResult, Aggregator};

pub const DASHBOARD_PATH: &str = "/api/dashboard";
pub const DASHBOARD_CACHE_KEY: &str = "dashboard";

/// Terminal state of one dashboard request.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardOutcome {
    /// Fresh aggregate, already written back to the cache.
    Fresh(AggregatedResult),
    /// Aggregation failed; served from cache without rewriting it.
    Cached(AggregatedResult),
    /// Aggregation failed and the cache had nothing usable.
    NoData,
    /// Fresh data could not be persisted, or the response could not be built.
    Unexpected,
}

impl DashboardOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            DashboardOutcome::Fresh(_) => "fresh",
            DashboardOutcome::Cached(_) => "cached",
            DashboardOutcome::NoData => "no_data",
            DashboardOutcome::Unexpected => "unexpected",
        }
    }
}

/// Aggregates live data, falling back to the last cached dashboard.
pub struct DashboardProcessor {
    aggregator: Arc<dyn Aggregator>,
    cache: Arc<dyn CacheStore>,
}

impl DashboardProcessor {
    pub fn new(aggregator: Arc<dyn Aggregator>, cache: Arc<dyn CacheStore>) -> Self {
        Self { aggregator, cache }
    }

    /// Walk the state machine up to (but not including) the response write.
    pub async fn resolve(&self) -> DashboardOutcome {
        match self.aggregator.aggregate().await {
            Ok(result) => match self.cache.put(DASHBOARD_CACHE_KEY, &result).await {
                Ok(()) => DashboardOutcome::Fresh(result),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to write fresh dashboard to cache");
                    DashboardOutcome::Unexpected
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Aggregation failed, falling back to cache");
                self.fallback().await
            }
        }
    }

    async fn fallback(&self) -> DashboardOutcome {
        match self.cache.get::<AggregatedResult>(DASHBOARD_CACHE_KEY).await {
            Ok(Some(cached)) => {
                tracing::info!("Serving cached dashboard");
                DashboardOutcome::Cached(cached)
            }
            Ok(None) => {
                tracing::warn!("No cached dashboard available");
                DashboardOutcome::NoData
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cache lookup failed, treating as miss");
                DashboardOutcome::NoData
            }
        }
    }
}

#[async_trait]
impl EndpointProcessor for DashboardProcessor {
    fn endpoint(&self) -> Endpoint {
        Endpoint::new(DASHBOARD_PATH, Method::GET)
    }

    async fn process(&self, ctx: RequestContext) -> Result<(), ResponseWriteError> {
        let outcome = self.resolve().await;
        metrics::record_dashboard_outcome(outcome.label());

        let written = match &outcome {
            DashboardOutcome::Fresh(result) | DashboardOutcome::Cached(result) => {
                ctx.respond_json(StatusCode::OK, result)
            }
            DashboardOutcome::NoData => {
                ctx.respond_json(StatusCode::INTERNAL_SERVER_ERROR, &ErrorPayload::failed_to_fetch())
            }
            DashboardOutcome::Unexpected => {
                ctx.respond_json(StatusCode::INTERNAL_SERVER_ERROR, &ErrorPayload::unexpected())
            }
        };

        match written {
            Err(ResponseWriteError::Serialize(_) | ResponseWriteError::Build(_)) => {
                tracing::error!(request_id = %ctx.request_id(), "Failed to build dashboard response");
                ctx.respond_json(StatusCode::INTERNAL_SERVER_ERROR, &ErrorPayload::unexpected())
            }
            other => other,
        }
    }
}
