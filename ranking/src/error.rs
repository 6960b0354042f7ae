use thiserror::Error;

/// Failure of a single normalized-balance computation.
#[derive(Debug, Error)]
pub enum FormulaError {
    #[error("exchange rate lookup failed: {0}")]
    ExchangeRate(String),

    #[error("malformed user entry: {0}")]
    MalformedEntry(String),
}

/// Failure of an aggregation pass. The pass is abandoned and the previous
/// ranking stays visible; the next state update re-arms the debounce.
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("balance computation failed: {0}")]
    Formula(#[from] FormulaError),
}
