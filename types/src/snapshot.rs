//! The full point-in-time view served to newly connected clients.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::TokenMeta;

/// A coherent materialization of all mirrored state.
///
/// Derived on demand from the live maps — never stored. Cheap enough to
/// assemble on every new client connection.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Main program state variables.
    pub state: BTreeMap<String, serde_json::Value>,
    /// Governance program state variables.
    pub governance_state: BTreeMap<String, serde_json::Value>,
    /// Known token metadata, keyed by asset id.
    pub tokens: BTreeMap<String, TokenMeta>,
    /// Governance-derived program parameters (`variables` entry, or the
    /// hardcoded fallback when absent).
    pub derived_params: serde_json::Value,
}
