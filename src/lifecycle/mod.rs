//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build AppContext (client, cache, pipeline) → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Teardown hooks → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then shared components, then listeners
//! - Ordered shutdown: stop accept, drain, release cache, release client
//! - Drain has a deadline: teardown proceeds after `shutdown_grace_secs`

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{HookError, Shutdown, TeardownHooks};
pub use startup::{AppContext, StartupError};
