//! The leaderboard aggregation pass.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tracing::debug;

use tally_types::{keys, UserRank};

use crate::error::AggregationError;
use crate::formula::RewardFormula;
use crate::leaderboard::Leaderboard;

/// Default bound on concurrently running balance computations.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Rebuilds the ranking from state-map contents.
///
/// A pass scans the entries once, runs the balance computations through a
/// bounded pool, then swaps the finished collection into the leaderboard.
/// A pass that fails is abandoned whole; the previous ranking stays
/// visible.
pub struct Aggregator {
    formula: Arc<dyn RewardFormula>,
    leaderboard: Arc<Leaderboard>,
    batch_size: usize,
}

struct Candidate {
    address: String,
    state: serde_json::Value,
    new_users: u32,
}

impl Aggregator {
    pub fn new(
        formula: Arc<dyn RewardFormula>,
        leaderboard: Arc<Leaderboard>,
        batch_size: usize,
    ) -> Self {
        Self {
            formula,
            leaderboard,
            batch_size: batch_size.max(1),
        }
    }

    /// Run one aggregation pass over materialized state entries.
    ///
    /// On success the leaderboard is atomically replaced and the new
    /// ranking returned. On failure the leaderboard is left untouched.
    pub async fn rebuild(
        &self,
        entries: Vec<(String, serde_json::Value)>,
    ) -> Result<Vec<UserRank>, AggregationError> {
        let (friend_counts, candidates) = scan(entries);
        let candidate_count = candidates.len();

        let computed: Vec<Result<(Candidate, f64), AggregationError>> = stream::iter(candidates)
            .map(|candidate| {
                let formula = Arc::clone(&self.formula);
                async move {
                    let amount = formula
                        .normalized_total(&candidate.address, &candidate.state)
                        .await?;
                    Ok((candidate, amount))
                }
            })
            .buffer_unordered(self.batch_size)
            .collect()
            .await;

        let mut ranks = Vec::with_capacity(candidate_count);
        for result in computed {
            let (candidate, amount) = result?;
            let friends = friend_counts
                .get(candidate.address.as_str())
                .copied()
                .unwrap_or(0);
            ranks.push(UserRank {
                address: candidate.address,
                amount,
                friends,
                new_users: candidate.new_users,
            });
        }

        ranks.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        ranks.truncate(self.leaderboard.capacity());

        self.leaderboard.replace_all(ranks.clone()).await;
        debug!(users = ranks.len(), "ranking rebuilt");
        Ok(ranks)
    }
}

/// Single pass over the state entries: referral edges are grouped by
/// credited address, `user_<addr>` entries not flagged as ghosts become
/// balance candidates.
fn scan(
    entries: Vec<(String, serde_json::Value)>,
) -> (HashMap<String, u32>, Vec<Candidate>) {
    let mut friend_counts: HashMap<String, u32> = HashMap::new();
    let mut candidates = Vec::new();

    for (key, value) in entries {
        if let Some(address) = keys::friend_address(&key) {
            *friend_counts.entry(address.to_string()).or_default() += 1;
        } else if let Some(address) = keys::user_address(&key) {
            if is_ghost(&value) {
                continue;
            }
            let new_users = value
                .get("newUsers")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0) as u32;
            candidates.push(Candidate {
                address: address.to_string(),
                state: value,
                new_users,
            });
        }
    }

    (friend_counts, candidates)
}

/// Accounts flagged `"ghost": true` are not real users and never ranked.
fn is_ghost(value: &serde_json::Value) -> bool {
    value
        .get("ghost")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
}
