//! Leaderboard entry.

use serde::{Deserialize, Serialize};

/// One user's aggregate totals in the leaderboard.
///
/// The collection is fully recomputed on every aggregation pass and replaced
/// as a whole; entries are never patched in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRank {
    /// Ledger address of the user.
    pub address: String,
    /// Normalized total balance, comparable across users.
    pub amount: f64,
    /// Number of referral edges credited to this user.
    pub friends: u32,
    /// Number of new users this user brought in.
    pub new_users: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case() {
        let rank = UserRank {
            address: "A".into(),
            amount: 1.5,
            friends: 2,
            new_users: 3,
        };
        let json = serde_json::to_value(&rank).unwrap();
        assert_eq!(json["newUsers"], 3);
        assert!(json.get("new_users").is_none());
    }
}
