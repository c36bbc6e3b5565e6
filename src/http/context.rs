//! Per-request context carrying the one-shot response channel.
//!
//! # Responsibilities
//! - Carry the negotiated keep-alive flag and request id
//! - Accept exactly one response per request, from whichever component
//!   ends up answering
//! - Report whether the client is still waiting
//!
//! # Design Decisions
//! - The slot wraps a `oneshot` sender; taking it is the write, so a second
//!   write is an `AlreadyWritten` error, never a second response
//! - Clones share the slot, so the director keeps a handle while a processor
//!   task holds another

use axum::body::Body;
use axum::http::{Response, StatusCode};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use crate::http::response::{json_response, ResponseWriteError};

/// Receiving half awaited by the connection task.
pub type ResponseReceiver = oneshot::Receiver<Response<Body>>;

struct ResponseSlot {
    sender: Mutex<Option<oneshot::Sender<Response<Body>>>>,
}

impl std::fmt::Debug for ResponseSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pending = self.sender.lock().map(|s| s.is_some()).unwrap_or(false);
        f.debug_struct("ResponseSlot").field("pending", &pending).finish()
    }
}

/// Everything needed to answer one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    keep_alive: bool,
    request_id: String,
    slot: Arc<ResponseSlot>,
}

impl RequestContext {
    /// Create a context and the receiver its single response will arrive on.
    pub fn new(keep_alive: bool, request_id: impl Into<String>) -> (Self, ResponseReceiver) {
        let (tx, rx) = oneshot::channel();
        let context = Self {
            keep_alive,
            request_id: request_id.into(),
            slot: Arc::new(ResponseSlot {
                sender: Mutex::new(Some(tx)),
            }),
        };
        (context, rx)
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// True while nothing has been written and the client is still waiting.
    pub fn is_open(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|sender| !sender.is_closed())
    }

    /// True once a response has been handed over.
    pub fn is_written(&self) -> bool {
        self.lock().is_none()
    }

    /// Serialize `body` and write it as the response.
    pub fn respond_json<T: Serialize + ?Sized>(
        &self,
        status: StatusCode,
        body: &T,
    ) -> Result<(), ResponseWriteError> {
        if self.is_written() {
            return Err(ResponseWriteError::AlreadyWritten);
        }
        let response = json_response(status, body, self.keep_alive)?;
        self.write(response)
    }

    /// Hand `response` to the connection. Only the first call succeeds.
    pub fn write(&self, response: Response<Body>) -> Result<(), ResponseWriteError> {
        let sender = self
            .lock()
            .take()
            .ok_or(ResponseWriteError::AlreadyWritten)?;

        sender
            .send(response)
            .map_err(|_| ResponseWriteError::ConnectionClosed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<oneshot::Sender<Response<Body>>>> {
        // Nothing panics while the lock is held.
        self.slot
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
