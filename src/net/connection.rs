//! Connection lifecycle tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Count open connections
//! - Broadcast the drain signal to every connection task
//! - Let the server wait until all connections have closed
//! - Bound how long a socket write may stall

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio_io_timeout::TimeoutStream;

/// Global atomic counter for connection IDs.
/// Relaxed ordering is enough; only uniqueness matters.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Tracks open connections for graceful shutdown.
///
/// `begin_drain` flips a watch channel every connection task listens on;
/// tasks then finish their in-flight request and close.
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    active_count: Arc<AtomicU64>,
    drain_tx: Arc<watch::Sender<bool>>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            active_count: Arc::new(AtomicU64::new(0)),
            drain_tx: Arc::new(tx),
        }
    }

    /// Record a new open connection. The guard decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id: ConnectionId::new(),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Receiver that turns `true` once draining starts.
    pub fn drain_receiver(&self) -> watch::Receiver<bool> {
        self.drain_tx.subscribe()
    }

    /// Ask every connection to finish its current request and close.
    pub fn begin_drain(&self) {
        self.drain_tx.send_replace(true);
        tracing::info!(active_connections = self.active_count(), "Draining connections");
    }

    /// Wait until all connections are closed, or `grace` elapses.
    ///
    /// Returns `true` when every connection closed in time.
    pub async fn wait_for_drain(&self, grace: Duration) -> bool {
        let drained = async {
            while self.active_count.load(Ordering::SeqCst) > 0 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        };
        tokio::time::timeout(grace, drained).await.is_ok()
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that tracks a connection's lifetime.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}

/// Wrap an accepted stream so a write that makes no progress for `timeout`
/// fails with `TimedOut` and the connection is dropped.
///
/// Reads are left alone; header and body reads have their own timeouts.
pub fn with_write_deadline<S>(stream: S, timeout: Duration) -> Pin<Box<TimeoutStream<S>>>
where
    S: AsyncRead + AsyncWrite,
{
    let mut stream = TimeoutStream::new(stream);
    stream.set_write_timeout(Some(timeout));
    Box::pin(stream)
}
