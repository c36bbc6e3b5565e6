//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check that upstream and cache addresses are usable URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check every semantic constraint and collect all failures.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let server = &config.server;
    if server.host.trim().is_empty() {
        errors.push(ValidationError::new("server.host", "must not be empty"));
    }
    if server.port == 0 {
        errors.push(ValidationError::new("server.port", "must be non-zero"));
    }
    if server.backlog == 0 {
        errors.push(ValidationError::new("server.backlog", "must be greater than zero"));
    }
    if server.max_content_length == 0 {
        errors.push(ValidationError::new("server.max_content_length", "must be greater than zero"));
    }
    if server.read_timeout_secs == 0 {
        errors.push(ValidationError::new("server.read_timeout_secs", "must be greater than zero"));
    }
    if server.write_timeout_secs == 0 {
        errors.push(ValidationError::new("server.write_timeout_secs", "must be greater than zero"));
    }
    if server.max_connections == 0 {
        errors.push(ValidationError::new("server.max_connections", "must be greater than zero"));
    }

    let upstream = &config.upstream;
    if upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.connect_timeout_secs", "must be greater than zero"));
    }
    if upstream.request_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.request_timeout_secs", "must be greater than zero"));
    }
    for (field, value) in [
        ("upstream.weather_url", &upstream.weather_url),
        ("upstream.fact_url", &upstream.fact_url),
        ("upstream.ip_url", &upstream.ip_url),
    ] {
        match Url::parse(value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::new(
                field,
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new(field, e.to_string())),
        }
    }

    match Url::parse(&config.cache.url) {
        Ok(url) if matches!(url.scheme(), "redis" | "rediss" | "memory") => {}
        Ok(url) => errors.push(ValidationError::new(
            "cache.url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("cache.url", e.to_string())),
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
