//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Configure log level from `RUST_LOG`, falling back to config
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - `RUST_LOG` wins over the configured level so operators can raise
//!   verbosity without editing the config file

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default directives when `RUST_LOG` is unset.
pub fn default_directives(log_level: &str) -> String {
    format!("dashboard_gateway={log_level},tower_http={log_level}")
}

/// Install the subscriber. Call once, before anything logs.
pub fn init(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives(log_level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_scope_level_to_crate_and_http_layers() {
        let directives = default_directives("debug");
        assert_eq!(directives, "dashboard_gateway=debug,tower_http=debug");
        assert!(directives.parse::<EnvFilter>().is_ok());
    }
}
