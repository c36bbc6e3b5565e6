//! Request inspection.
//!
//! # Responsibilities
//! - Read (or generate) the request ID used to correlate logs
//! - Negotiate keep-alive for the response `Connection` header
//!
//! # Design Decisions
//! - Request ID is set as early as possible by `SetRequestIdLayer`, so the
//!   handler only reads it; generation here is a fallback for direct callers
//! - HTTP/1.1 keeps connections open unless the client says `close`;
//!   HTTP/1.0 closes unless the client asks for `keep-alive`

use axum::http::{header, HeaderMap, HeaderName, Version};

/// Header carrying the request correlation ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Request ID from the headers, or a fresh UUID v4.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Whether the connection stays open after this request.
///
/// `server_keep_alive = false` forces `close` regardless of the client.
pub fn keep_alive(version: Version, headers: &HeaderMap, server_keep_alive: bool) -> bool {
    if !server_keep_alive {
        return false;
    }

    let mut close = false;
    let mut keep = false;
    for value in headers.get_all(header::CONNECTION) {
        let Ok(value) = value.to_str() else { continue };
        for token in value.split(',').map(str::trim) {
            if token.eq_ignore_ascii_case("close") {
                close = true;
            } else if token.eq_ignore_ascii_case("keep-alive") {
                keep = true;
            }
        }
    }

    match version {
        _ if close => false,
        Version::HTTP_09 | Version::HTTP_10 => keep,
        _ => true,
    }
}
