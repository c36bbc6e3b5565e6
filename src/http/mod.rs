//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper http1, Axum layers, body limit)
//!     → request.rs (request ID, keep-alive negotiation)
//!     → context.rs (single-write RequestContext)
//!     → [routing::Director dispatches to an endpoint]
//!     → response.rs (JSON body, Content-Type/Length/Connection headers)
//!     → Send to client
//! ```

pub mod context;
pub mod request;
pub mod response;
pub mod server;

pub use context::{RequestContext, ResponseReceiver};
pub use request::X_REQUEST_ID;
pub use response::{ErrorPayload, ResponseWriteError};
pub use server::HttpServer;
