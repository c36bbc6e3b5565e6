//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "DASHBOARD_";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { key: String, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { key, value } => {
                write!(f, "Invalid value {:?} for environment variable {}", value, key)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from an optional TOML file, apply `DASHBOARD_*`
/// environment overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => GatewayConfig::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply overrides from `lookup`, which maps a full variable name to its value.
pub fn apply_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let env = Overrides { lookup };

    env.set("SERVER_HOST", &mut config.server.host)?;
    env.set("SERVER_PORT", &mut config.server.port)?;
    env.set("SERVER_BACKLOG", &mut config.server.backlog)?;
    env.set("SERVER_KEEP_ALIVE", &mut config.server.keep_alive)?;
    env.set("SERVER_MAX_CONTENT_LENGTH", &mut config.server.max_content_length)?;
    env.set("SERVER_READ_TIMEOUT_SECS", &mut config.server.read_timeout_secs)?;
    env.set("SERVER_WRITE_TIMEOUT_SECS", &mut config.server.write_timeout_secs)?;
    env.set("SERVER_MAX_CONNECTIONS", &mut config.server.max_connections)?;
    env.set("SERVER_SHUTDOWN_GRACE_SECS", &mut config.server.shutdown_grace_secs)?;

    env.set("UPSTREAM_CONNECT_TIMEOUT_SECS", &mut config.upstream.connect_timeout_secs)?;
    env.set("UPSTREAM_REQUEST_TIMEOUT_SECS", &mut config.upstream.request_timeout_secs)?;
    env.set("UPSTREAM_WEATHER_URL", &mut config.upstream.weather_url)?;
    env.set("UPSTREAM_FACT_URL", &mut config.upstream.fact_url)?;
    env.set("UPSTREAM_IP_URL", &mut config.upstream.ip_url)?;

    env.set("RETRIES_COUNT", &mut config.retries.count)?;
    env.set("RETRIES_DELAY_MS", &mut config.retries.delay_ms)?;

    env.set("CACHE_URL", &mut config.cache.url)?;
    env.set("CACHE_TTL_SECS", &mut config.cache.ttl_secs)?;

    env.set("LOG_LEVEL", &mut config.observability.log_level)?;
    env.set("METRICS_ENABLED", &mut config.observability.metrics_enabled)?;
    env.set("METRICS_ADDRESS", &mut config.observability.metrics_address)?;

    Ok(())
}

struct Overrides<F> {
    lookup: F,
}

impl<F> Overrides<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn set<T: FromStr>(&self, name: &str, slot: &mut T) -> Result<(), ConfigError> {
        let key = format!("{}{}", ENV_PREFIX, name);
        if let Some(value) = (self.lookup)(&key) {
            *slot = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Env { key, value })?;
        }
        Ok(())
    }
}
