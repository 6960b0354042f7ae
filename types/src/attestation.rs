//! Identity attestations.

use serde::{Deserialize, Serialize};

/// An external verification linking a ledger address to an identity on the
/// messaging platform. Either field may be absent for partially verified
/// accounts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attestation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Attestation {
    pub fn new(username: Option<String>, user_id: Option<String>) -> Self {
        Self { username, user_id }
    }
}
