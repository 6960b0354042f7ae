//! Fallback program parameters.

use serde_json::json;

/// Derived program parameters used until governance publishes a `variables`
/// entry. Values match the program's launch configuration.
pub fn default_derived_params() -> serde_json::Value {
    json!({
        "rewardPerFriend": 1,
        "newUserBonus": 5,
        "rankingSize": 150,
        "votingEnabled": false,
    })
}
