//! The reward/ranking formula seam.
//!
//! Turning raw per-user balances into comparable totals is owned by an
//! external formula library (it may need an exchange-rate lookup, hence the
//! async seam). [`StaticRateFormula`] is the built-in implementation used
//! when no external formula service is configured.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::FormulaError;

/// Computes a user's normalized total balance.
#[async_trait]
pub trait RewardFormula: Send + Sync {
    /// Normalized total for `address`, derived from its `user_<addr>`
    /// state entry.
    async fn normalized_total(
        &self,
        address: &str,
        user_state: &serde_json::Value,
    ) -> Result<f64, FormulaError>;
}

/// Formula with fixed per-asset rates: the total is the rate-weighted sum
/// of the entry's `balances` object. Unknown assets weigh 1.0.
#[derive(Clone, Debug, Default)]
pub struct StaticRateFormula {
    rates: HashMap<String, f64>,
}

impl StaticRateFormula {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        Self { rates }
    }

    fn rate(&self, asset: &str) -> f64 {
        self.rates.get(asset).copied().unwrap_or(1.0)
    }
}

#[async_trait]
impl RewardFormula for StaticRateFormula {
    async fn normalized_total(
        &self,
        address: &str,
        user_state: &serde_json::Value,
    ) -> Result<f64, FormulaError> {
        let Some(balances) = user_state.get("balances") else {
            return Ok(0.0);
        };
        let balances = balances.as_object().ok_or_else(|| {
            FormulaError::MalformedEntry(format!("{address}: balances is not an object"))
        })?;

        let mut total = 0.0;
        for (asset, amount) in balances {
            let amount = parse_amount(amount).ok_or_else(|| {
                FormulaError::MalformedEntry(format!("{address}: bad amount for {asset}"))
            })?;
            total += amount * self.rate(asset);
        }
        Ok(total)
    }
}

/// Amounts arrive as JSON numbers or decimal strings (the ledger encodes
/// large integers as strings).
fn parse_amount(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
