//! Request dispatch.
//!
//! # Responsibilities
//! - Resolve the `Endpoint` of a decoded request
//! - Hand matched requests to their processor on a separate task
//! - Answer unmatched requests with 404
//! - Turn a failed or panicked processor into a 500 while the client waits
//!
//! # Design Decisions
//! - The director keeps a clone of the context so it can still answer when
//!   the processor task dies; the single-write slot prevents a double answer
//! - `direct` returns as soon as the processor is spawned; the caller awaits
//!   the response on the context's receiver
//! - `direct` reports the matched `Endpoint`, so callers label by route and
//!   never by the raw request path

use axum::http::{Method, StatusCode, Uri};
use std::sync::Arc;

use crate::endpoint::{Endpoint, EndpointProcessor};
use crate::http::context::RequestContext;
use crate::http::response::{ErrorPayload, ResponseWriteError};
use crate::routing::RoutingTable;

/// Failure while resolving or dispatching a request.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("failed to answer request: {0}")]
    Respond(#[from] ResponseWriteError),
}

/// Dispatches requests through an immutable routing table.
#[derive(Clone)]
pub struct Director {
    table: Arc<RoutingTable>,
}

impl Director {
    pub fn new(table: RoutingTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Route one request. The answer is written through `ctx`.
    ///
    /// Returns the matched endpoint, or `None` when the request got a 404.
    pub fn direct(
        &self,
        method: &Method,
        uri: &Uri,
        ctx: RequestContext,
    ) -> Result<Option<Endpoint>, RoutingError> {
        let endpoint = Endpoint::new(uri.path(), method.clone());

        let Some(processor) = self.table.lookup(&endpoint) else {
            tracing::warn!(request_id = %ctx.request_id(), endpoint = %endpoint, "No endpoint matched");
            ctx.respond_json(StatusCode::NOT_FOUND, &ErrorPayload::not_found())?;
            return Ok(None);
        };

        tracing::debug!(request_id = %ctx.request_id(), endpoint = %endpoint, "Dispatching request");
        tokio::spawn(supervise(Arc::clone(processor), endpoint.clone(), ctx));
        Ok(Some(endpoint))
    }
}

/// Run the processor and answer for it if it fails before writing.
async fn supervise(processor: Arc<dyn EndpointProcessor>, endpoint: Endpoint, ctx: RequestContext) {
    let task_ctx = ctx.clone();
    let outcome = tokio::spawn(async move { processor.process(task_ctx).await }).await;

    let failure = match outcome {
        Ok(Ok(())) => return,
        Ok(Err(ResponseWriteError::ConnectionClosed)) => {
            tracing::debug!(request_id = %ctx.request_id(), endpoint = %endpoint, "Client left before the response");
            return;
        }
        Ok(Err(e)) => e.to_string(),
        Err(join_error) => join_error.to_string(),
    };

    if !ctx.is_open() {
        tracing::warn!(
            request_id = %ctx.request_id(),
            endpoint = %endpoint,
            error = %failure,
            "Processor failed after the connection was answered or closed"
        );
        return;
    }

    tracing::error!(request_id = %ctx.request_id(), endpoint = %endpoint, error = %failure, "Processor failed");
    if let Err(e) = ctx.respond_json(StatusCode::INTERNAL_SERVER_ERROR, &ErrorPayload::unexpected()) {
        tracing::warn!(request_id = %ctx.request_id(), error = %e, "Failed to write fallback error response");
    }
}
