use crate::domain::histogram::{self, HistogramBin};
use crate::domain::position::Position;
use crate::domain::request::{self, SimulationParams, SimulationRequest};
use crate::domain::summary::{self, Summary};
use crate::domain::validation::ValidationError;
use crate::domain::weights;
use crate::remote::error::SimulationError;
use crate::remote::SimulationClient;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    Validation(ValidationError),
    Simulation(SimulationError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(e) => fmt::Display::fmt(e, f),
            Self::Simulation(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<ValidationError> for PipelineError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<SimulationError> for PipelineError {
    fn from(e: SimulationError) -> Self {
        Self::Simulation(e)
    }
}

/// Everything the presentation layer needs after one simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub request: SimulationRequest,
    pub summary: Summary,
    pub histogram: Vec<HistogramBin>,
}

/// Validates parameters, derives weights from the current rows and assembles the request.
pub fn prepare(
    positions: &[Position],
    params: &SimulationParams,
) -> Result<SimulationRequest, ValidationError> {
    params.validate()?;
    let weighted = weights::derive(positions)?;
    Ok(request::build(params, &weighted))
}

/// Submits a prepared request and turns the response into summary and histogram.
pub async fn submit(
    client: &dyn SimulationClient,
    request: SimulationRequest,
    bin_count: usize,
) -> Result<SimulationReport, SimulationError> {
    let result = client.simulate(&request).await?;
    Ok(SimulationReport {
        summary: summary::summarize(&result),
        histogram: histogram::bin(&result.all_final_values, bin_count),
        request,
    })
}

/// `prepare` then `submit`. Validation failures return before any network call.
pub async fn run(
    client: &dyn SimulationClient,
    positions: &[Position],
    params: &SimulationParams,
    bin_count: usize,
) -> Result<SimulationReport, PipelineError> {
    let request = prepare(positions, params)?;
    Ok(submit(client, request, bin_count).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::histogram::BIN_COUNT;
    use crate::domain::summary::SimulationResult;
    use crate::remote::error::RemoteFailure;
    use std::sync::Mutex;

    struct FakeEngine {
        response: Result<SimulationResult, SimulationError>,
        seen: Mutex<Vec<SimulationRequest>>,
    }

    impl FakeEngine {
        fn returning(response: Result<SimulationResult, SimulationError>) -> Self {
            Self {
                response,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl SimulationClient for FakeEngine {
        async fn simulate(
            &self,
            request: &SimulationRequest,
        ) -> Result<SimulationResult, SimulationError> {
            self.seen.lock().unwrap().push(request.clone());
            self.response.clone()
        }
    }

    fn row(symbol: &str, value: f64) -> Position {
        let mut p = Position::empty();
        p.symbol = symbol.to_string();
        p.allocated_value = value;
        p
    }

    #[test]
    fn prepare_builds_aligned_request() {
        let req = prepare(
            &[row("AAA", 600.0), row("BBB", 400.0)],
            &SimulationParams::default(),
        )
        .unwrap();
        assert_eq!(req.tickers, vec!["AAA", "BBB"]);
        assert!((req.weights[0] - 0.6).abs() < 1e-12);
        assert!((req.weights[1] - 0.4).abs() < 1e-12);
    }

    #[tokio::test]
    async fn validation_failure_skips_network() {
        let engine = FakeEngine::returning(Ok(SimulationResult::default()));
        let err = run(&engine, &[row("", 10.0)], &SimulationParams::default(), BIN_COUNT)
            .await
            .unwrap_err();
        assert_eq!(err, PipelineError::Validation(ValidationError::NoValidPositions));
        assert!(engine.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn report_combines_summary_and_histogram() {
        let values: Vec<f64> = (1..=30).map(|i| (i * 10) as f64).collect();
        let engine = FakeEngine::returning(Ok(SimulationResult {
            pct_25: Some(80.0),
            pct_50: Some(155.0),
            pct_75: Some(230.0),
            mean: Some(155.0),
            all_final_values: values,
        }));

        let report = run(
            &engine,
            &[row("AAA", 600.0), row("BBB", 400.0)],
            &SimulationParams::default(),
            BIN_COUNT,
        )
        .await
        .unwrap();

        assert_eq!(report.summary.pct_50, Some(155.0));
        assert_eq!(report.summary.trials, 30);
        assert_eq!(report.histogram.len(), BIN_COUNT);
        assert!(report.histogram.iter().all(|b| b.count == 1));
        assert_eq!(engine.seen.lock().unwrap()[0].tickers, vec!["AAA", "BBB"]);
    }

    #[tokio::test]
    async fn engine_error_is_surfaced() {
        let engine = FakeEngine::returning(Err(SimulationError {
            failure: RemoteFailure::Service("No tickers or weights provided".to_string()),
        }));
        let err = run(&engine, &[row("AAA", 1.0)], &SimulationParams::default(), BIN_COUNT)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Simulation(_)));
        assert_eq!(
            err.to_string(),
            "simulation failed: No tickers or weights provided"
        );
    }
}
