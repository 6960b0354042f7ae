//! Token metadata mirrored from the ledger.

use serde::{Deserialize, Serialize};

/// Metadata for one ledger asset. Immutable once written; keyed by `asset`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMeta {
    /// Opaque ledger asset id.
    pub asset: String,
    /// Display symbol.
    pub symbol: String,
    /// Number of decimal places of the on-ledger integer amounts.
    pub decimals: u32,
}

impl TokenMeta {
    pub fn new(asset: impl Into<String>, symbol: impl Into<String>, decimals: u32) -> Self {
        Self {
            asset: asset.into(),
            symbol: symbol.into(),
            decimals,
        }
    }
}
