//! Process-wide cancellation signal for the log writer.

use std::sync::Arc;
use tokio::sync::watch;

/// Cancellation handle shared by everything that must stop together.
///
/// Triggering is idempotent. Clones observe the same signal.
#[derive(Clone, Debug)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Raise the signal. Safe to call any number of times.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Subscribe to the signal.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once the signal has been raised.
///
/// If every [`Shutdown`] handle is dropped without triggering, this never
/// resolves.
pub async fn triggered(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn trigger_is_idempotent_and_observed() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        shutdown.trigger();
        shutdown.trigger();
        assert!(shutdown.is_triggered());
        tokio::time::timeout(Duration::from_secs(1), triggered(&mut rx))
            .await
            .expect("signal observed");
    }

    #[tokio::test]
    async fn subscribing_after_trigger_still_observes_it() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let mut rx = shutdown.clone().subscribe();
        tokio::time::timeout(Duration::from_secs(1), triggered(&mut rx))
            .await
            .expect("signal observed");
    }
}
