//! Remote cache subsystem.
//!
//! # Data Flow
//! ```text
//! put(key, value)
//!     → serde_json serialize
//!     → store.put_raw (SET with PX when a TTL is configured, plain SET otherwise)
//!
//! get(key)
//!     → store.get_raw (bytes, no text decoding in the store)
//!     → missing key            → Ok(None)
//!     → undecodable payload    → Ok(None) (logged, invalid UTF-8 included)
//!     → store unreachable      → Err(CacheError)
//! ```
//!
//! # Design Decisions
//! - Stores move bytes; decoding happens once, in `dyn CacheStore::get` / `put`
//! - A corrupted entry degrades to a miss and never fails the caller
//! - `close` is idempotent; later calls report `CacheError::Closed`

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;
use crate::observability::metrics;

pub use self::memory::MemoryCacheStore;
pub use self::redis::RedisCacheStore;

/// Store communication or serialization failure.
///
/// Never raised for a missing key or an undecodable entry.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache store error: {0}")]
    Store(String),

    #[error("failed to serialize cache value: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("cache store is closed")]
    Closed,
}

/// Key-value store holding serialized entries with an optional TTL.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Raw value for `key`, `None` when absent or expired.
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Write `value`, expiring after the store's TTL when one is configured.
    async fn put_raw(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError>;

    /// Release the underlying connection. Safe to call more than once.
    fn close(&self);
}

impl dyn CacheStore {
    /// Typed lookup. Undecodable entries are reported as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let raw = match self.get_raw(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                metrics::record_cache_operation("get", "miss");
                return Ok(None);
            }
            Err(e) => {
                metrics::record_cache_operation("get", "error");
                return Err(e);
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(value) => {
                metrics::record_cache_operation("get", "hit");
                Ok(Some(value))
            }
            Err(e) => {
                metrics::record_cache_operation("get", "corrupt");
                tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                Ok(None)
            }
        }
    }

    /// Serialize and store `value` under `key`.
    pub async fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let payload = serde_json::to_vec(value)?;
        let result = self.put_raw(key, payload).await;
        metrics::record_cache_operation("put", if result.is_ok() { "ok" } else { "error" });
        result
    }
}

/// Open the store named by `config.url`.
///
/// `memory://` selects the in-process store; anything else is handed to Redis.
pub async fn open_store(config: &CacheConfig) -> Result<Arc<dyn CacheStore>, CacheError> {
    let ttl = ttl_from(config.ttl());
    if config.url.starts_with("memory://") {
        tracing::info!(ttl = ?ttl, "Using in-process cache store");
        return Ok(Arc::new(MemoryCacheStore::new(ttl)));
    }

    let store = RedisCacheStore::connect(&config.url, ttl).await?;
    tracing::info!(url = %config.url, ttl = ?ttl, "Connected to cache store");
    Ok(Arc::new(store))
}

/// Zero disables expiry.
pub(crate) fn ttl_from(duration: Duration) -> Option<Duration> {
    (!duration.is_zero()).then_some(duration)
}
