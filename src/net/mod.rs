//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind with backlog, accept, connection limits)
//!     → connection.rs (lifecycle tracking, drain signal, write deadline)
//!     → Hand off to HTTP layer
//!
//! Connection States:
//!     Accepted → Active → Draining → Closed
//! ```
//!
//! # Design Decisions
//! - Bounded connection count prevents resource exhaustion
//! - Each connection tracked for graceful shutdown

pub mod connection;
pub mod listener;

pub use connection::{with_write_deadline, ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{ConnectionPermit, Listener, ListenerError};
