//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound GET to an upstream source:
//!     → upstream::transport (connect timeout + per-request timeout)
//!     → On non-2xx or transport error: retries.rs (fixed delay, same counter)
//!     → Final outcome only: UpstreamResponse or SendError
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - One retry counter covers both bad statuses and transport failures
//! - Intermediate failures are logged, never surfaced to callers

pub mod retries;

pub use retries::{RetryPolicy, RetryingSender, SendError};
