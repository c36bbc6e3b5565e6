//! Dashboard gateway library.
//!
//! One endpoint, `GET /api/dashboard`, answers by fanning out to three
//! upstream sources in parallel and falling back to the last cached
//! dashboard when any of them fails.

pub mod cache;
pub mod config;
pub mod endpoint;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod upstream;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::{AppContext, Shutdown};
