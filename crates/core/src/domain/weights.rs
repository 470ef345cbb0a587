use crate::domain::position::Position;
use crate::domain::validation::ValidationError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedPosition {
    pub symbol: String,
    pub weight: f64,
}

/// Turns the current rows into normalized weights.
///
/// Only rows with a non-empty symbol and a positive allocated value take part. Output order
/// follows the rows' relative order, so it lines up index-for-index with the request tickers.
/// Weights are recomputed from `allocated_value` on every call and do not depend on whether a
/// row has been enriched.
pub fn derive(positions: &[Position]) -> Result<Vec<WeightedPosition>, ValidationError> {
    let valid: Vec<(&str, f64)> = positions
        .iter()
        .map(|p| (p.symbol.trim(), p.allocated_value))
        .filter(|(symbol, value)| !symbol.is_empty() && value.is_finite() && *value > 0.0)
        .collect();

    if valid.is_empty() {
        return Err(ValidationError::NoValidPositions);
    }

    let total: f64 = valid.iter().map(|(_, value)| value).sum();
    if !total.is_finite() {
        return Err(ValidationError::InvalidAllocatedValue { value: total });
    }

    valid
        .into_iter()
        .map(|(symbol, value)| {
            let weight = value / total;
            // A value too small relative to the total would get a zero weight.
            if weight <= 0.0 {
                return Err(ValidationError::InvalidAllocatedValue { value });
            }
            Ok(WeightedPosition {
                symbol: symbol.to_string(),
                weight,
            })
        })
        .collect()
}
