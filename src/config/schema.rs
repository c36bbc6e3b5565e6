//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Public weather API providing current conditions for a fixed location.
pub const DEFAULT_WEATHER_URL: &str =
    "https://api.open-meteo.com/v1/forecast?latitude=51.107883&longitude=17.038538&current_weather=true";
/// Public API returning a random useless fact.
pub const DEFAULT_FACT_URL: &str = "https://uselessfacts.jsph.pl/api/v2/facts/random";
/// Public API returning the caller's external IP address as JSON.
pub const DEFAULT_IP_URL: &str = "https://api.ipify.org/?format=json";

/// Root configuration for the dashboard gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Inbound HTTP server settings.
    pub server: ServerConfig,

    /// Upstream source endpoints and client timeouts.
    pub upstream: UpstreamConfig,

    /// Retry policy for upstream requests.
    pub retries: RetryConfig,

    /// Remote cache settings.
    pub cache: CacheConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Inbound server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host name or IP to bind.
    pub host: String,

    /// TCP port to bind.
    pub port: u16,

    /// Queue depth for pending, not-yet-accepted connections.
    pub backlog: u32,

    /// Allow more than one request per connection.
    pub keep_alive: bool,

    /// Largest accepted request body in bytes.
    pub max_content_length: usize,

    /// Request read timeout in seconds (headers and body).
    pub read_timeout_secs: u64,

    /// Response write timeout in seconds.
    pub write_timeout_secs: u64,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,

    /// How long open connections may drain after a shutdown signal.
    pub shutdown_grace_secs: u64,
}

impl ServerConfig {
    /// `host:port` string used for address resolution.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            backlog: 128,
            keep_alive: true,
            max_content_length: 1024 * 1024,
            read_timeout_secs: 10,
            write_timeout_secs: 10,
            max_connections: 10_000,
            shutdown_grace_secs: 30,
        }
    }
}

/// Upstream source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    pub weather_url: String,
    pub fact_url: String,
    pub ip_url: String,
}

impl UpstreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 3,
            request_timeout_secs: 5,
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            fact_url: DEFAULT_FACT_URL.to_string(),
            ip_url: DEFAULT_IP_URL.to_string(),
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts after the first one.
    pub count: u32,

    /// Fixed delay between attempts in milliseconds.
    pub delay_ms: u64,
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            count: 2,
            delay_ms: 250,
        }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Store address, e.g. `redis://localhost:6379` or `memory://`.
    pub url: String,

    /// Entry time-to-live in seconds. Zero writes entries without expiry.
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            ttl_secs: 300,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = GatewayConfig::default();
        assert_eq!(config.server.bind_address(), "localhost:8080");
        assert_eq!(config.server.backlog, 128);
        assert!(config.server.keep_alive);
        assert_eq!(config.server.max_content_length, 1_048_576);
        assert_eq!(config.server.read_timeout(), Duration::from_secs(10));
        assert_eq!(config.upstream.connect_timeout(), Duration::from_secs(3));
        assert_eq!(config.upstream.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.retries.count, 2);
        assert_eq!(config.retries.delay(), Duration::from_millis(250));
        assert_eq!(config.cache.ttl(), Duration::from_secs(300));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [retries]
            count = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.retries.count, 5);
        assert_eq!(config.retries.delay_ms, 250);
        assert_eq!(config.cache.url, "redis://localhost:6379");
    }
}
