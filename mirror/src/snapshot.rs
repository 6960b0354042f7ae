//! Point-in-time snapshot assembly.

use std::collections::BTreeMap;

use tally_cache::BoundedStateMap;
use tally_types::{default_derived_params, keys, Snapshot, TokenMeta};

/// Assemble a coherent view of the mirrored state for a newly connecting
/// client. Pure function of the maps at call time; no side effects, no
/// caching beyond what the maps already provide.
pub fn build(
    state: &BoundedStateMap<serde_json::Value>,
    governance: &BoundedStateMap<serde_json::Value>,
    tokens: &BoundedStateMap<TokenMeta>,
) -> Snapshot {
    let derived_params = state
        .peek(keys::VARIABLES_KEY)
        .cloned()
        .unwrap_or_else(default_derived_params);

    Snapshot {
        state: materialize(state),
        governance_state: materialize(governance),
        tokens: tokens
            .entries()
            .map(|(asset, meta)| (asset.to_string(), meta.clone()))
            .collect(),
        derived_params,
    }
}

fn materialize(
    map: &BoundedStateMap<serde_json::Value>,
) -> BTreeMap<String, serde_json::Value> {
    map.entries()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}
