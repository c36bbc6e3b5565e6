//! Upstream aggregation subsystem.
//!
//! # Data Flow
//! ```text
//! DashboardAggregator::aggregate()
//!     → spawn 3 fetch tasks (weather, fact, ip)
//!         → fetcher.rs (GET url, decode JSON)
//!             → resilience::retries (fixed-delay retry on error / non-2xx)
//!                 → transport.rs (one reqwest call, per-request timeout)
//!     → all-or-nothing join
//!     → AggregatedResult { weather, fact, ip }
//! ```

pub mod aggregator;
pub mod fetcher;
pub mod transport;

pub use aggregator::{AggregatedResult, AggregationError, Aggregator, DashboardAggregator, Source};
pub use fetcher::{FetchError, JsonFetcher, SourceFetcher};
pub use transport::{HttpTransport, OutboundRequest, Transport, TransportError, UpstreamResponse};
