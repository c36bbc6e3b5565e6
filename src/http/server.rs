//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router around the shared inbound handler
//! - Wire up middleware (tracing, request ID, body timeouts)
//! - Enforce the request body limit
//! - Serve each accepted connection over HTTP/1.1 with keep-alive
//! - Dispatch every request to the `Director` and await its single answer
//! - Drain open connections on shutdown
//!
//! # Data Flow
//! ```text
//! Listener::accept
//!     → write deadline on the socket
//!     → hyper http1 connection (header read timeout, keep-alive)
//!     → SetRequestId → Trace → PropagateRequestId → body timeouts
//!     → gateway_handler: body limit → RequestContext → Director::direct
//!     → await ResponseReceiver → response
//! ```
//!
//! # Timeouts
//! - `read_timeout`: header read (hyper) and request body read (tower-http)
//! - `write_timeout`: any socket write that stalls that long drops the
//!   connection; the response body timeout only bounds body production
//! - Metrics are labelled with the matched endpoint path, `none` for 404 and
//!   `rejected` for bodies refused before routing

use axum::{
    body::Body,
    extract::State,
    http::{header, request::Parts, HeaderMap, Request, Response, StatusCode},
    Router,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::{RequestBodyTimeoutLayer, ResponseBodyTimeoutLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::context::RequestContext;
use crate::http::request;
use crate::http::response::{fallback_error, json_response, ErrorPayload};
use crate::net::{with_write_deadline, ConnectionPermit, ConnectionTracker, Listener, ListenerError};
use crate::observability::metrics;
use crate::routing::Director;

/// Route label for requests no endpoint matched.
const UNMATCHED_ROUTE: &str = "none";

/// Route label for requests refused before routing.
const REJECTED_ROUTE: &str = "rejected";

/// State shared by every connection.
#[derive(Clone)]
pub struct ServerState {
    pub director: Director,
    pub max_content_length: usize,
    pub keep_alive: bool,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server dispatching through `director`.
    pub fn new(config: ServerConfig, director: Director) -> Self {
        let state = ServerState {
            director,
            max_content_length: config.max_content_length,
            keep_alive: config.keep_alive,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServerConfig, state: ServerState) -> Router {
        Router::new()
            .fallback(gateway_handler)
            .with_state(state)
            .layer(ResponseBodyTimeoutLayer::new(config.write_timeout()))
            .layer(RequestBodyTimeoutLayer::new(config.read_timeout()))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered service, for driving requests in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires, then drain open connections.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        let addr = listener.local_addr().map_err(ListenerError::Bind)?;
        tracing::info!(address = %addr, keep_alive = self.config.keep_alive, "HTTP server starting");

        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => self.spawn_connection(stream, peer, permit, &tracker),
                    Err(ListenerError::Closed) => break,
                    Err(e) => tracing::warn!(error = %e, "Accept failed"),
                },
            }
        }
        drop(listener);

        tracker.begin_drain();
        if tracker.wait_for_drain(self.config.shutdown_grace()).await {
            tracing::info!("All connections drained");
        } else {
            tracing::warn!(
                open_connections = tracker.active_count(),
                grace_secs = self.config.shutdown_grace_secs,
                "Drain deadline elapsed with open connections"
            );
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    fn spawn_connection(
        &self,
        stream: TcpStream,
        peer: SocketAddr,
        permit: ConnectionPermit,
        tracker: &ConnectionTracker,
    ) {
        let guard = tracker.track();
        let mut drain = tracker.drain_receiver();
        let service = TowerToHyperService::new(self.router.clone());
        let io = TokioIo::new(with_write_deadline(stream, self.config.write_timeout()));

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .keep_alive(self.config.keep_alive)
            .header_read_timeout(self.config.read_timeout());

        tokio::spawn(async move {
            let _permit = permit;
            let connection = builder.serve_connection(io, service);
            tokio::pin!(connection);

            let result = tokio::select! {
                result = connection.as_mut() => result,
                _ = async { let _ = drain.wait_for(|draining| *draining).await; } => {
                    connection.as_mut().graceful_shutdown();
                    connection.as_mut().await
                }
            };

            if let Err(e) = result {
                tracing::debug!(connection_id = %guard.id(), peer_addr = %peer, error = %e, "Connection ended with error");
            }
        });
    }
}

/// Shared inbound handler: every request on every connection lands here.
async fn gateway_handler(State(state): State<ServerState>, request: Request<Body>) -> Response<Body> {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let request_id = request::request_id(&parts.headers);
    let keep_alive = request::keep_alive(parts.version, &parts.headers, state.keep_alive);

    tracing::info!(
        request_id = %request_id,
        method = %parts.method,
        path = %parts.uri.path(),
        "Request received"
    );

    let (response, route) = match read_body(&parts.headers, body, state.max_content_length).await {
        Ok(()) => dispatch(&state.director, &parts, keep_alive, request_id).await,
        Err(rejection) => (rejection.into_response(), REJECTED_ROUTE.to_string()),
    };

    metrics::record_request(parts.method.as_str(), response.status().as_u16(), &route, start);
    response
}

/// Route the request and wait for its answer. Also returns the route label.
async fn dispatch(
    director: &Director,
    parts: &Parts,
    keep_alive: bool,
    request_id: String,
) -> (Response<Body>, String) {
    let (ctx, receiver) = RequestContext::new(keep_alive, request_id);

    let route = match director.direct(&parts.method, &parts.uri, ctx.clone()) {
        Ok(Some(endpoint)) => endpoint.path,
        Ok(None) => UNMATCHED_ROUTE.to_string(),
        Err(e) => {
            tracing::error!(request_id = %ctx.request_id(), error = %e, "Routing failed");
            if ctx.is_open() {
                if let Err(e) = ctx.respond_json(StatusCode::INTERNAL_SERVER_ERROR, &ErrorPayload::unexpected()) {
                    tracing::warn!(request_id = %ctx.request_id(), error = %e, "Failed to write routing error response");
                }
            }
            UNMATCHED_ROUTE.to_string()
        }
    };

    let response = match receiver.await {
        Ok(response) => response,
        Err(_) => {
            tracing::error!(request_id = %ctx.request_id(), "Request finished without a response");
            fallback_error(keep_alive)
        }
    };
    (response, route)
}

/// Why a request body was refused before routing.
#[derive(Debug)]
enum BodyRejection {
    TooLarge,
    Unreadable,
}

impl BodyRejection {
    /// The connection is closed after a rejection; the body may be unread.
    fn into_response(self) -> Response<Body> {
        let (status, payload) = match self {
            BodyRejection::TooLarge => (StatusCode::PAYLOAD_TOO_LARGE, ErrorPayload::payload_too_large()),
            BodyRejection::Unreadable => (StatusCode::BAD_REQUEST, ErrorPayload::new("Bad Request")),
        };
        json_response(status, &payload, false).unwrap_or_else(|_| fallback_error(false))
    }
}

/// Read the whole body, refusing anything over `limit` bytes.
///
/// The body content itself is not used by any endpoint.
async fn read_body(headers: &HeaderMap, body: Body, limit: usize) -> Result<(), BodyRejection> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > limit as u64) {
        return Err(BodyRejection::TooLarge);
    }

    match Limited::new(body, limit).collect().await {
        Ok(_) => Ok(()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err(BodyRejection::TooLarge),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body");
            Err(BodyRejection::Unreadable)
        }
    }
}
