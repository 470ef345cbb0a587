use crate::domain::position::TickerDetails;
use crate::domain::request::SimulationRequest;
use crate::domain::summary::SimulationResult;
use crate::remote::error::{LookupError, SimulationError};

pub mod error;
pub mod http;
pub mod types;

/// Source of descriptive market data for a symbol (`POST /tickerinfo`).
#[async_trait::async_trait]
pub trait TickerInfoClient: Send + Sync {
    async fn lookup(&self, symbol: &str) -> Result<TickerDetails, LookupError>;
}

/// The external Monte Carlo engine (`POST /simulate`).
#[async_trait::async_trait]
pub trait SimulationClient: Send + Sync {
    async fn simulate(&self, request: &SimulationRequest)
        -> Result<SimulationResult, SimulationError>;
}
