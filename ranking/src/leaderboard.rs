//! The bounded, atomically replaced ranking collection.

use tokio::sync::RwLock;

use tally_types::UserRank;

/// Process-wide ranking. Readers always observe a complete collection: the
/// aggregator swaps the whole vector under one write lock, never patching
/// entries in place.
pub struct Leaderboard {
    capacity: usize,
    ranks: RwLock<Vec<UserRank>>,
}

impl Leaderboard {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ranks: RwLock::new(Vec::new()),
        }
    }

    /// Replace the entire collection, truncating to capacity. The input is
    /// expected to already be sorted by amount descending.
    pub async fn replace_all(&self, mut ranks: Vec<UserRank>) {
        ranks.truncate(self.capacity);
        *self.ranks.write().await = ranks;
    }

    /// A copy of the current ranking.
    pub async fn ranks(&self) -> Vec<UserRank> {
        self.ranks.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.ranks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.ranks.read().await.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
