//! Fundamental types for the tally state mirror.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: timestamps, watched-program identifiers, event topics, state
//! key conventions, and the payload shapes served to browser clients.

pub mod attestation;
pub mod diff;
pub mod keys;
pub mod params;
pub mod program;
pub mod rank;
pub mod snapshot;
pub mod time;
pub mod token;
pub mod topic;

pub use attestation::Attestation;
pub use diff::{FullState, LedgerUpdate, StateDiff};
pub use params::default_derived_params;
pub use program::Program;
pub use rank::UserRank;
pub use snapshot::Snapshot;
pub use time::Timestamp;
pub use token::TokenMeta;
pub use topic::Topic;
