//! Trigger debouncing for the aggregation pass.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Coalesces bursts of triggers into one delayed action.
///
/// Every trigger resets the pending quiet period; the action runs only
/// once no further trigger has arrived for the whole period. Triggers that
/// arrive while the action is running are queued and start a fresh
/// debounce window afterwards.
pub struct Debouncer {
    trigger_tx: mpsc::UnboundedSender<()>,
}

impl Debouncer {
    /// Spawn the debounce task. `action` runs on the spawned task after
    /// each elapsed quiet period.
    pub fn spawn<F, Fut>(quiet: Duration, mut action: F) -> (Self, JoinHandle<()>)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (trigger_tx, mut trigger_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            while trigger_rx.recv().await.is_some() {
                loop {
                    match tokio::time::timeout(quiet, trigger_rx.recv()).await {
                        // Another trigger arrived: the quiet period resets.
                        Ok(Some(())) => continue,
                        // All handles dropped mid-window; shut down.
                        Ok(None) => return,
                        // Quiet period elapsed.
                        Err(_) => break,
                    }
                }
                action().await;
            }
        });
        (Self { trigger_tx }, handle)
    }

    /// Schedule the action. Never blocks.
    pub fn trigger(&self) {
        let _ = self.trigger_tx.send(());
    }
}
