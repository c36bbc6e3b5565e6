//! Startup orchestration.
//!
//! # Responsibilities
//! - Build every shared component once, in dependency order
//! - Register teardown hooks for the resources that need explicit release
//! - Hand the finished `Director` to the HTTP server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Components are passed in, never reached through globals; tests inject
//!   their own transport and cache through `AppContext::with_components`

use std::sync::Arc;

use crate::cache::{self, CacheError, CacheStore};
use crate::config::GatewayConfig;
use crate::endpoint::{DashboardProcessor, EndpointProcessor};
use crate::lifecycle::TeardownHooks;
use crate::net::ListenerError;
use crate::resilience::{RetryPolicy, RetryingSender};
use crate::routing::{Director, RoutingTable};
use crate::upstream::{DashboardAggregator, HttpTransport, JsonFetcher, Transport, TransportError};

/// Fatal error while bringing the gateway up.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to build upstream client: {0}")]
    Transport(#[from] TransportError),

    #[error("failed to open cache store: {0}")]
    Cache(#[from] CacheError),

    #[error("failed to bind listener: {0}")]
    Listener(#[from] ListenerError),
}

/// Everything the request path shares, built once at process start.
pub struct AppContext {
    config: GatewayConfig,
    director: Director,
    teardown: TeardownHooks,
}

impl AppContext {
    /// Build the reqwest transport and open the configured cache store.
    pub async fn init(config: GatewayConfig) -> Result<Self, StartupError> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.upstream)?);
        tracing::info!(
            connect_timeout_secs = config.upstream.connect_timeout_secs,
            request_timeout_secs = config.upstream.request_timeout_secs,
            "Upstream client ready"
        );

        let cache = cache::open_store(&config.cache).await?;
        tracing::info!(ttl_secs = config.cache.ttl_secs, "Cache store ready");

        Ok(Self::with_components(config, transport, cache))
    }

    /// Wire the request pipeline around an existing transport and cache.
    pub fn with_components(
        config: GatewayConfig,
        transport: Arc<dyn Transport>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        let sender = RetryingSender::new(Arc::clone(&transport), RetryPolicy::from(&config.retries));
        let fetcher = Arc::new(JsonFetcher::new(sender, config.upstream.request_timeout()));
        let aggregator = Arc::new(DashboardAggregator::new(fetcher, &config.upstream));

        let processors: Vec<Arc<dyn EndpointProcessor>> = vec![Arc::new(DashboardProcessor::new(
            aggregator,
            Arc::clone(&cache),
        ))];
        let director = Director::new(RoutingTable::new(processors));
        tracing::info!(endpoints = director.table().len(), "Routing table built");

        let mut teardown = TeardownHooks::new();
        teardown.register("cache-store", move || {
            cache.close();
            Ok(())
        });
        teardown.register("upstream-client", move || {
            transport.close();
            Ok(())
        });

        Self {
            config,
            director,
            teardown,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn director(&self) -> Director {
        self.director.clone()
    }

    /// Release shared resources in registration order.
    pub fn teardown(self) {
        tracing::info!(steps = self.teardown.len(), "Tearing down shared resources");
        let failed = self.teardown.run();
        if !failed.is_empty() {
            tracing::warn!(failed = ?failed, "Some teardown steps failed");
        }
    }
}
