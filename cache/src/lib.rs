//! Bounded in-memory key/value maps.
//!
//! All mirrored state lives in fixed-capacity maps: the working set plus
//! churn may exceed capacity, in which case the least-recently-used entries
//! are forgotten. The dominant value of served pages lies in ranking and
//! recent activity, not exhaustive history.

pub mod attestation_cache;
pub mod bounded_map;

pub use attestation_cache::AttestationCache;
pub use bounded_map::BoundedStateMap;
