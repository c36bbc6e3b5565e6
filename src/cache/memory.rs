//! In-process cache store.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::cache::{CacheError, CacheStore};

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// A concurrent map with per-entry expiry.
///
/// Expired entries are dropped lazily on read.
#[derive(Debug, Clone)]
pub struct MemoryCacheStore {
    entries: Arc<DashMap<String, Entry>>,
    ttl: Option<Duration>,
    closed: Arc<AtomicBool>,
}

impl MemoryCacheStore {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ensure_open(&self) -> Result<(), CacheError> {
        if self.closed.load(Ordering::Acquire) {
            Err(CacheError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.ensure_open()?;

        let now = Instant::now();
        let value = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
            Some(_) => None,
            None => return Ok(None),
        };
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        Ok(value)
    }

    async fn put_raw(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        self.ensure_open()?;

        let expires_at = self.ttl.map(|ttl| Instant::now() + ttl);
        self.entries.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.entries.clear();
            tracing::info!("In-process cache store closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let store = MemoryCacheStore::new(Some(Duration::from_secs(300)));
        store.put_raw("dashboard", "v".into()).await.unwrap();

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(store.get_raw("dashboard").await.unwrap().as_deref(), Some(b"v".as_slice()));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get_raw("dashboard").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn no_ttl_never_expires() {
        let store = MemoryCacheStore::new(None);
        store.put_raw("dashboard", "v".into()).await.unwrap();

        tokio::time::advance(Duration::from_secs(86_400)).await;
        assert_eq!(store.get_raw("dashboard").await.unwrap().as_deref(), Some(b"v".as_slice()));
    }

    #[tokio::test(start_paused = true)]
    async fn rewrite_resets_expiry() {
        let store = MemoryCacheStore::new(Some(Duration::from_secs(10)));
        store.put_raw("k", "a".into()).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        store.put_raw("k", "b".into()).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(store.get_raw("k").await.unwrap().as_deref(), Some(b"b".as_slice()));
    }
}
