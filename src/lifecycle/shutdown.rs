//! Shutdown coordination for the balancer.
//!
//! The HTTP server holds a receiver and stops the health monitor when it
//! fires. The signal handler in `main` triggers it.

use tokio::sync::broadcast;

/// Fan-out of a single shutdown event to every long-running task.
#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receivers created after [`trigger`](Self::trigger) do not see it.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Notify every subscriber. Safe to call more than once.
    pub fn trigger(&self) {
        match self.tx.send(()) {
            Ok(draining) => tracing::info!(draining, "Shutdown triggered"),
            Err(_) => tracing::debug!("Shutdown triggered with no tasks listening"),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_all_subscribers() {
        let shutdown = Shutdown::new();
        let mut server = shutdown.subscribe();
        let mut monitor = shutdown.subscribe();

        shutdown.trigger();

        assert!(server.recv().await.is_ok());
        assert!(monitor.recv().await.is_ok());
    }

    #[test]
    fn test_trigger_without_subscribers_is_harmless() {
        let shutdown = Shutdown::default();
        shutdown.trigger();

        let mut late = shutdown.subscribe();
        assert!(late.try_recv().is_err());
    }
}
