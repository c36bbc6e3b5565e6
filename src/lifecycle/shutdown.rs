//! Shutdown coordination for the gateway.

use std::fmt;
use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of tasks still subscribed.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Error returned by a teardown hook.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

type Hook = Box<dyn FnOnce() -> Result<(), HookError> + Send>;

/// Ordered release steps for shared resources.
///
/// Hooks run once, in registration order. A failing hook is logged and the
/// remaining hooks still run.
#[derive(Default)]
pub struct TeardownHooks {
    hooks: Vec<(&'static str, Hook)>,
}

impl TeardownHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &'static str, hook: F)
    where
        F: FnOnce() -> Result<(), HookError> + Send + 'static,
    {
        self.hooks.push((name, Box::new(hook)));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook. Returns the names of the hooks that failed.
    pub fn run(self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        for (name, hook) in self.hooks {
            match hook() {
                Ok(()) => tracing::info!(hook = name, "Teardown step completed"),
                Err(e) => {
                    tracing::error!(hook = name, error = %e, "Teardown step failed");
                    failed.push(name);
                }
            }
        }
        failed
    }
}

impl fmt::Debug for TeardownHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.hooks.iter().map(|(name, _)| *name).collect();
        f.debug_struct("TeardownHooks").field("hooks", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn trigger_reaches_every_subscriber() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.subscribe();
        assert_eq!(shutdown.receiver_count(), 2);

        shutdown.trigger();
        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }

    #[test]
    fn hooks_run_in_order_past_failures() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = TeardownHooks::new();

        for name in ["cache", "broken", "upstream"] {
            let order = Arc::clone(&order);
            hooks.register(name, move || {
                order.lock().unwrap().push(name);
                if name == "broken" {
                    Err("boom".into())
                } else {
                    Ok(())
                }
            });
        }
        assert_eq!(hooks.len(), 3);

        let failed = hooks.run();
        assert_eq!(failed, vec!["broken"]);
        assert_eq!(*order.lock().unwrap(), vec!["cache", "broken", "upstream"]);
    }
}
