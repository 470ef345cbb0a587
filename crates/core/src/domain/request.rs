use crate::domain::validation::ValidationError;
use crate::domain::weights::WeightedPosition;
use serde::{Deserialize, Serialize};

const DEFAULT_INITIAL_INVESTMENT: f64 = 800_000.0;
const DEFAULT_YEARS: u32 = 5;
const DEFAULT_N_SIMS: u32 = 10_000;
const DEFAULT_PORTFOLIO_STD_EST: f64 = 0.28;

/// User-supplied simulation parameters, already coerced to numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub initial_investment: f64,
    pub years: u32,
    pub n_sims: u32,
    /// Estimated annual standard deviation of the whole portfolio (0.28 = 28%).
    pub portfolio_std_est: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            initial_investment: DEFAULT_INITIAL_INVESTMENT,
            years: DEFAULT_YEARS,
            n_sims: DEFAULT_N_SIMS,
            portfolio_std_est: DEFAULT_PORTFOLIO_STD_EST,
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.initial_investment.is_finite() && self.initial_investment > 0.0) {
            return Err(ValidationError::InvalidParameter {
                name: "initial_investment",
                detail: format!("must be greater than 0 (got {})", self.initial_investment),
            });
        }
        if self.years == 0 {
            return Err(ValidationError::InvalidParameter {
                name: "years",
                detail: "must be at least 1".to_string(),
            });
        }
        if self.n_sims == 0 {
            return Err(ValidationError::InvalidParameter {
                name: "n_sims",
                detail: "must be at least 1".to_string(),
            });
        }
        if !(self.portfolio_std_est.is_finite() && self.portfolio_std_est >= 0.0) {
            return Err(ValidationError::InvalidParameter {
                name: "portfolio_std_est",
                detail: format!("must be non-negative (got {})", self.portfolio_std_est),
            });
        }
        Ok(())
    }
}

/// Payload for the simulation engine: parameters flattened next to index-aligned
/// `tickers` and `weights`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    #[serde(flatten)]
    pub params: SimulationParams,
    pub tickers: Vec<String>,
    pub weights: Vec<f64>,
}

pub fn build(params: &SimulationParams, weighted: &[WeightedPosition]) -> SimulationRequest {
    SimulationRequest {
        params: params.clone(),
        tickers: weighted.iter().map(|w| w.symbol.clone()).collect(),
        weights: weighted.iter().map(|w| w.weight).collect(),
    }
}
