//! Response handling and transformation.
//!
//! # Responsibilities
//! - Serialize response payloads as JSON
//! - Set `Content-Type`, exact `Content-Length` and `Connection` headers
//! - Define the fixed error payloads clients can see
//!
//! # Design Decisions
//! - Every response body is JSON, including errors
//! - Bodies are fully buffered; `Content-Length` is always exact
//! - Clients only ever see a short message, never internal error detail

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};
use serde::{Deserialize, Serialize};

/// Body for every non-2xx JSON response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

impl ErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// No live data and nothing cached.
    pub fn failed_to_fetch() -> Self {
        Self::new("Failed to fetch data")
    }

    /// Defensive catch-all.
    pub fn unexpected() -> Self {
        Self::new("Unexpected server error")
    }

    pub fn not_found() -> Self {
        Self::new("Not Found")
    }

    pub fn payload_too_large() -> Self {
        Self::new("Payload Too Large")
    }
}

/// Failure while producing or delivering the one response of a request.
#[derive(Debug, thiserror::Error)]
pub enum ResponseWriteError {
    #[error("failed to serialize response body: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to build response: {0}")]
    Build(#[from] axum::http::Error),

    #[error("a response was already written for this request")]
    AlreadyWritten,

    #[error("connection closed before the response was written")]
    ConnectionClosed,
}

/// Build a complete JSON response.
pub fn json_response<T: Serialize + ?Sized>(
    status: StatusCode,
    body: &T,
    keep_alive: bool,
) -> Result<Response<Body>, ResponseWriteError> {
    let bytes = serde_json::to_vec(body)?;
    let connection = if keep_alive { "keep-alive" } else { "close" };

    let response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(header::CONNECTION, HeaderValue::from_static(connection))
        .body(Body::from(bytes))?;

    Ok(response)
}

/// Last-resort 500 used when even JSON serialization is unavailable.
pub fn fallback_error(keep_alive: bool) -> Response<Body> {
    const BODY: &str = r#"{"message":"Unexpected server error"}"#;
    let mut response = Response::new(Body::from(BODY));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(BODY.len()));
    headers.insert(
        header::CONNECTION,
        HeaderValue::from_static(if keep_alive { "keep-alive" } else { "close" }),
    );
    response
}
