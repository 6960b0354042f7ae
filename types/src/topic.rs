//! Push-channel event topics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Topics emitted over the push channels.
///
/// Wire names follow the upper-snake convention the browser clients expect
/// (`SNAPSHOT`, `STATE_UPDATE`, ...). There is no payload schema versioning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Topic {
    /// Full point-in-time state, sent once to each newly connected client.
    Snapshot,
    /// Partial diff of the main program's state.
    StateUpdate,
    /// Partial diff of the governance program's state.
    GovernanceStateUpdate,
    /// The freshly rebuilt leaderboard.
    RankingUpdate,
    /// Periodic keep-alive payload (`{timestamp}`).
    Heartbeat,
}

impl Topic {
    /// Every topic, in a fixed order (used by the listener monitor).
    pub const ALL: [Topic; 5] = [
        Topic::Snapshot,
        Topic::StateUpdate,
        Topic::GovernanceStateUpdate,
        Topic::RankingUpdate,
        Topic::Heartbeat,
    ];

    /// The update topics a connected client is subscribed to.
    pub const CLIENT_UPDATES: [Topic; 3] = [
        Topic::StateUpdate,
        Topic::GovernanceStateUpdate,
        Topic::RankingUpdate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Snapshot => "SNAPSHOT",
            Self::StateUpdate => "STATE_UPDATE",
            Self::GovernanceStateUpdate => "GOVERNANCE_STATE_UPDATE",
            Self::RankingUpdate => "RANKING_UPDATE",
            Self::Heartbeat => "HEARTBEAT",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
