//! Leaderboard aggregation.
//!
//! Rebuilds the ranked per-user totals from the mirrored state map: one
//! scan groups referral edges and collects balance candidates, balance
//! computations run with bounded concurrency, and the finished collection
//! replaces the previous one atomically. Recomputation is debounced so a
//! burst of ledger updates causes one pass, not N.

pub mod aggregator;
pub mod debounce;
pub mod error;
pub mod formula;
pub mod leaderboard;

pub use aggregator::Aggregator;
pub use debounce::Debouncer;
pub use error::{AggregationError, FormulaError};
pub use formula::{RewardFormula, StaticRateFormula};
pub use leaderboard::Leaderboard;
