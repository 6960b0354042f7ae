//! Periodic listener-count monitor.
//!
//! A handler added but never removed is a correctness bug, not something to
//! tolerate silently. Structural unsubscribe (dropping the receiver) makes
//! the classic leak impossible, but forwarder tasks that are spawned and
//! never aborted still pin receivers; this monitor surfaces that
//! accumulation. Diagnostic only — it never drops listeners itself.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::bus::EventBus;

/// Spawn a task that samples listener counts per topic every `interval`
/// and warns when any count exceeds `threshold`.
pub fn spawn_listener_monitor(
    bus: Arc<EventBus>,
    threshold: usize,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately; skip it so samples are spaced.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            for (topic, count) in bus.listener_counts() {
                if count > threshold {
                    warn!(
                        %topic,
                        listeners = count,
                        threshold,
                        "listener count above threshold; possible leak"
                    );
                } else if count > 0 {
                    debug!(%topic, listeners = count, "listener sample");
                }
            }
        }
    })
}
