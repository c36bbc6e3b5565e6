//! Endpoint processing subsystem.
//!
//! # Data Flow
//! ```text
//! routing::Director
//!     → EndpointProcessor::process(ctx)
//!         → dashboard.rs: aggregate → cache write-back / cache fallback
//!         → exactly one ctx.respond_json(..)
//! ```
//!
//! # Design Decisions
//! - An `Endpoint` is a plain (path, method) key with structural equality
//! - Processors answer through the `RequestContext` they are given and
//!   report only write failures back to the caller

pub mod dashboard;

use async_trait::async_trait;
use axum::http::Method;

use crate::http::context::RequestContext;
use crate::http::response::ResponseWriteError;

pub use dashboard::{DashboardOutcome, DashboardProcessor, DASHBOARD_CACHE_KEY, DASHBOARD_PATH};

/// Routing key: request path (without query string) and method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub path: String,
    pub method: Method,
}

impl Endpoint {
    pub fn new(path: impl Into<String>, method: Method) -> Self {
        Self {
            path: path.into(),
            method,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Handles every request for one endpoint.
#[async_trait]
pub trait EndpointProcessor: Send + Sync {
    /// The key this processor is registered under.
    fn endpoint(&self) -> Endpoint;

    /// Answer the request through `ctx`, exactly once.
    async fn process(&self, ctx: RequestContext) -> Result<(), ResponseWriteError>;
}
