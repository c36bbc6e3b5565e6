//! Dashboard gateway (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request     ┌──────────────────────────────────────────────────────┐
//!     ───────────────────┼─▶ net::Listener ─▶ http::server ─▶ routing::Director │
//!                        │                                        │             │
//!                        │                                        ▼             │
//!                        │                          endpoint::DashboardProcessor│
//!                        │                             │                │       │
//!                        │                             ▼                ▼       │
//!                        │                 upstream::aggregator     cache       │
//!                        │                   (weather, fact, ip)  (redis/mem)   │
//!                        │                             │                        │
//!                        │                   resilience::retries                │
//!                        │                             │                        │
//!     Client Response    │                   upstream::transport ───────────────┼──▶ Upstream APIs
//!     ◀──────────────────┼── RequestContext (exactly one write)                 │
//!                        └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use dashboard_gateway::config::load_config;
use dashboard_gateway::lifecycle::{signals, AppContext, Shutdown, StartupError};
use dashboard_gateway::net::Listener;
use dashboard_gateway::observability::{logging, metrics};
use dashboard_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "dashboard-gateway")]
#[command(about = "Aggregating dashboard gateway with cache fallback", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "DASHBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    if cli.check {
        println!("configuration OK");
        return Ok(());
    }

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "dashboard-gateway starting");
    tracing::info!(
        bind_address = %config.server.bind_address(),
        retries = config.retries.count,
        retry_delay_ms = config.retries.delay_ms,
        cache_ttl_secs = config.cache.ttl_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let context = AppContext::init(config).await?;
    let server_config = context.config().server.clone();

    let listener = Listener::bind(&server_config).await.map_err(StartupError::from)?;

    let shutdown = Arc::new(Shutdown::new());
    let receiver = shutdown.subscribe();
    signals::spawn_signal_handler(Arc::clone(&shutdown));

    let server = HttpServer::new(server_config, context.director());
    let result = server.run(listener, receiver).await;

    context.teardown();
    result?;

    tracing::info!("Shutdown complete");
    Ok(())
}
