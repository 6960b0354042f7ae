//! Inbound diff contract from the ledger-watching client.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An incremental set of changed state variables: name → new value.
pub type StateDiff = HashMap<String, serde_json::Value>;

/// One push from the ledger client, partitioned by originating program.
///
/// Empty partitions are dropped before they reach the state maps.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LedgerUpdate {
    /// Changed variables of the main rewards program.
    #[serde(default)]
    pub state: StateDiff,
    /// Changed variables of the governance program.
    #[serde(default)]
    pub governance: StateDiff,
}

impl LedgerUpdate {
    /// Whether both partitions are empty (nothing to apply).
    pub fn is_empty(&self) -> bool {
        self.state.is_empty() && self.governance.is_empty()
    }
}

/// A full state dump, delivered when the ledger client first connects and
/// again after every reconnect.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FullState {
    #[serde(default)]
    pub state: StateDiff,
    #[serde(default)]
    pub governance: StateDiff,
    #[serde(default)]
    pub tokens: Vec<crate::TokenMeta>,
}
