//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Decoded request (method, uri)
//!     → director.rs (Endpoint = path without query + method)
//!     → table.rs (exact lookup)
//!     → hit:  spawn EndpointProcessor, 500 if it fails before answering
//!     → miss: 404 {"message":"Not Found"}
//!
//! Table construction (at startup):
//!     EndpointProcessor[]
//!     → key by processor.endpoint()
//!     → freeze as immutable RoutingTable
//! ```
//!
//! # Design Decisions
//! - Routes built at startup, immutable at runtime
//! - Exact matching only; no regex or prefix routes
//! - Deterministic: same input always reaches the same processor

pub mod director;
pub mod table;

pub use director::{Director, RoutingError};
pub use table::RoutingTable;
