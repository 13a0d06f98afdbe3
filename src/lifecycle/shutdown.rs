//! Shutdown coordination for the host.

use std::sync::Arc;

use tokio::sync::watch;

/// Coordinator for graceful shutdown.
///
/// Provides a watch channel that all long-running tasks can subscribe to.
/// Triggering is idempotent: only the first call changes anything, later
/// calls are no-ops.
#[derive(Debug, Clone)]
pub struct Shutdown {
    /// Watch channel sender; `true` once shutdown was requested.
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    ///
    /// Returns `true` if this call initiated shutdown.
    pub fn trigger(&self) -> bool {
        let initiated = self.tx.send_if_modified(|requested| {
            if *requested {
                false
            } else {
                *requested = true;
                true
            }
        });
        if initiated {
            tracing::info!("Shutdown requested");
        } else {
            tracing::debug!("Shutdown already requested, ignoring");
        }
        initiated
    }

    /// Whether shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once shutdown has been requested.
    pub async fn requested(&self) {
        wait_requested(self.subscribe()).await;
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once the receiver observes a shutdown request.
pub async fn wait_requested(mut rx: watch::Receiver<bool>) {
    // The coordinator owns the sender; if it is gone nobody can trigger anymore
    // and the task should wind down as well.
    let _ = rx.wait_for(|requested| *requested).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn trigger_is_idempotent() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_triggered());
        assert!(shutdown.trigger());
        assert!(!shutdown.trigger());
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn late_subscribers_see_request() {
        let shutdown = Shutdown::new();
        shutdown.trigger();

        let rx = shutdown.subscribe();
        tokio::time::timeout(Duration::from_millis(200), wait_requested(rx))
            .await
            .expect("late subscriber should resolve immediately");
    }

    #[tokio::test]
    async fn clones_share_state() {
        let shutdown = Shutdown::new();
        let handle = shutdown.clone();

        let waiter = tokio::spawn(async move { shutdown.requested().await });
        handle.trigger();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
