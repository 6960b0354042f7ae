//! The transport bridge: mirror bus → outbound client channels.
//!
//! One relay task per client-facing topic reads from the mirror's event
//! bus, applies update deduplication, and re-broadcasts on the gateway's
//! own channels. Both delivery mechanisms (WebSocket and SSE) subscribe to
//! the outbound side, so deduplication happens exactly once regardless of
//! how many clients are connected.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use tally_bus::{BusEvent, EventBus};
use tally_types::Topic;

use crate::dedup::UpdateFingerprint;
use crate::metrics::GatewayMetrics;

pub struct TransportBridge {
    out: EventBus,
}

impl TransportBridge {
    /// Spawn the relay tasks and return the bridge.
    pub fn spawn(
        source: Arc<EventBus>,
        metrics: Arc<GatewayMetrics>,
        channel_capacity: usize,
    ) -> Arc<Self> {
        let bridge = Arc::new(Self {
            out: EventBus::new(channel_capacity),
        });

        for topic in Topic::CLIENT_UPDATES {
            let rx = source.subscribe(topic);
            let bridge = Arc::clone(&bridge);
            let metrics = Arc::clone(&metrics);
            tokio::spawn(async move {
                relay(rx, bridge, metrics, topic).await;
            });
        }

        bridge
    }

    /// Subscribe to an outbound topic. Dropping the receiver removes the
    /// listener.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<BusEvent> {
        self.out.subscribe(topic)
    }

    /// Outbound listener count for a topic (diagnostics and tests).
    pub fn listener_count(&self, topic: Topic) -> usize {
        self.out.listener_count(topic)
    }
}

/// Whether a topic's payloads are fingerprint-deduplicated. Ranking
/// rebuilds are already debounced at the source and carry fresh totals,
/// so only the raw state diffs are screened.
fn is_deduplicated(topic: Topic) -> bool {
    matches!(topic, Topic::StateUpdate | Topic::GovernanceStateUpdate)
}

async fn relay(
    mut rx: broadcast::Receiver<BusEvent>,
    bridge: Arc<TransportBridge>,
    metrics: Arc<GatewayMetrics>,
    topic: Topic,
) {
    let mut last_fingerprint: Option<UpdateFingerprint> = None;
    loop {
        match rx.recv().await {
            Ok(event) => {
                if is_deduplicated(topic) {
                    let fingerprint = UpdateFingerprint::of(&event.data);
                    if last_fingerprint.as_ref() == Some(&fingerprint) {
                        metrics.updates_deduped.inc();
                        debug!(%topic, "suppressed duplicate update");
                        continue;
                    }
                    last_fingerprint = Some(fingerprint);
                }
                metrics.events_relayed.inc();
                let _ = bridge.out.sender_for(topic).send(event);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(%topic, skipped = n, "relay lagged behind the bus");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!(%topic, "source channel closed, relay stopping");
                break;
            }
        }
    }
}
