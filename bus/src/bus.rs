//! Topic channels and the event envelope.

use serde::Serialize;
use tokio::sync::broadcast;

use tally_types::{Timestamp, Topic};

/// Default per-topic channel capacity. Slow receivers that fall more than
/// this many events behind observe a lag error, not blocked publishers.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// An event delivered to subscribers: topic, payload, emission time.
#[derive(Clone, Debug, Serialize)]
pub struct BusEvent {
    pub topic: Topic,
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

impl BusEvent {
    pub fn new(topic: Topic, data: serde_json::Value) -> Self {
        Self {
            topic,
            data,
            timestamp: Timestamp::now(),
        }
    }
}

/// The process-wide event bus, one broadcast channel per topic.
pub struct EventBus {
    snapshot_tx: broadcast::Sender<BusEvent>,
    state_update_tx: broadcast::Sender<BusEvent>,
    governance_update_tx: broadcast::Sender<BusEvent>,
    ranking_update_tx: broadcast::Sender<BusEvent>,
    heartbeat_tx: broadcast::Sender<BusEvent>,
}

impl EventBus {
    /// Create a bus with the given per-topic channel capacity.
    pub fn new(channel_capacity: usize) -> Self {
        let (snapshot_tx, _) = broadcast::channel(channel_capacity);
        let (state_update_tx, _) = broadcast::channel(channel_capacity);
        let (governance_update_tx, _) = broadcast::channel(channel_capacity);
        let (ranking_update_tx, _) = broadcast::channel(channel_capacity);
        let (heartbeat_tx, _) = broadcast::channel(channel_capacity);

        Self {
            snapshot_tx,
            state_update_tx,
            governance_update_tx,
            ranking_update_tx,
            heartbeat_tx,
        }
    }

    /// Get the broadcast sender for a given topic.
    pub fn sender_for(&self, topic: Topic) -> &broadcast::Sender<BusEvent> {
        match topic {
            Topic::Snapshot => &self.snapshot_tx,
            Topic::StateUpdate => &self.state_update_tx,
            Topic::GovernanceStateUpdate => &self.governance_update_tx,
            Topic::RankingUpdate => &self.ranking_update_tx,
            Topic::Heartbeat => &self.heartbeat_tx,
        }
    }

    /// Subscribe to a topic. The returned receiver is the unsubscribe
    /// token: dropping it tears the listener down.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<BusEvent> {
        self.sender_for(topic).subscribe()
    }

    /// Emit an event on a topic. Returns the number of listeners it was
    /// delivered to (zero listeners is not an error).
    pub fn publish(&self, topic: Topic, data: serde_json::Value) -> usize {
        self.sender_for(topic)
            .send(BusEvent::new(topic, data))
            .unwrap_or(0)
    }

    /// Current listener count for a topic.
    pub fn listener_count(&self, topic: Topic) -> usize {
        self.sender_for(topic).receiver_count()
    }

    /// Listener counts for every topic, in [`Topic::ALL`] order.
    pub fn listener_counts(&self) -> Vec<(Topic, usize)> {
        Topic::ALL
            .into_iter()
            .map(|topic| (topic, self.listener_count(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}
