use crate::config::Settings;
use crate::domain::position::TickerDetails;
use crate::domain::request::SimulationRequest;
use crate::domain::summary::SimulationResult;
use crate::remote::error::{LookupError, RemoteFailure, SimulationError};
use crate::remote::types::{ErrorBody, TickerInfoRequest, TickerInfoResponse};
use crate::remote::{SimulationClient, TickerInfoClient};
use anyhow::Context;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const TICKERINFO_PATH: &str = "/tickerinfo";
const SIMULATE_PATH: &str = "/simulate";
const MAX_ERROR_BODY_CHARS: usize = 512;

/// JSON-over-HTTP client for the simulation service. One instance serves both endpoints.
#[derive(Debug, Clone)]
pub struct HttpSimulationService {
    http: reqwest::Client,
    base_url: String,
    tickerinfo_timeout: Duration,
    simulate_timeout: Duration,
}

impl HttpSimulationService {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("failed to build simulation service http client")?;

        Ok(Self {
            http,
            base_url: settings.simulation_api_base_url.clone(),
            tickerinfo_timeout: Duration::from_secs(settings.tickerinfo_timeout_secs),
            simulate_timeout: Duration::from_secs(settings.simulate_timeout_secs),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T, RemoteFailure>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let res = self
            .http
            .post(self.url(path))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| RemoteFailure::Transport(e.to_string()))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| RemoteFailure::Transport(format!("failed to read response body: {e}")))?;

        parse_response(status, &text)
    }
}

#[async_trait::async_trait]
impl TickerInfoClient for HttpSimulationService {
    async fn lookup(&self, symbol: &str) -> Result<TickerDetails, LookupError> {
        let ticker = symbol.trim();
        let parsed: TickerInfoResponse = self
            .post_json(
                TICKERINFO_PATH,
                &TickerInfoRequest { ticker },
                self.tickerinfo_timeout,
            )
            .await
            .map_err(|failure| LookupError {
                symbol: ticker.to_string(),
                failure,
            })?;

        tracing::debug!(symbol = ticker, name = %parsed.full_name, "ticker lookup succeeded");
        Ok(parsed.into_details())
    }
}

#[async_trait::async_trait]
impl SimulationClient for HttpSimulationService {
    async fn simulate(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulationResult, SimulationError> {
        let t0 = std::time::Instant::now();
        let result: SimulationResult = self
            .post_json(SIMULATE_PATH, request, self.simulate_timeout)
            .await
            .map_err(|failure| SimulationError { failure })?;

        tracing::info!(
            tickers = request.tickers.len(),
            n_sims = request.params.n_sims,
            trials = result.all_final_values.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "simulation completed"
        );
        Ok(result)
    }
}

/// An `error` field wins over the status code; otherwise non-2xx is a failure and a 2xx body
/// must decode into `T`.
pub fn parse_response<T: DeserializeOwned>(status: StatusCode, text: &str) -> Result<T, RemoteFailure> {
    let raw_json = serde_json::from_str::<Value>(text);

    if let Ok(v) = &raw_json {
        if let Ok(ErrorBody { error }) = serde_json::from_value::<ErrorBody>(v.clone()) {
            return Err(RemoteFailure::Service(error));
        }
    }

    if !status.is_success() {
        return Err(RemoteFailure::Http {
            status: status.as_u16(),
            body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        });
    }

    let raw_json = raw_json.map_err(|e| RemoteFailure::Decode(format!("body is not JSON: {e}")))?;
    serde_json::from_value::<T>(raw_json).map_err(|e| RemoteFailure::Decode(e.to_string()))
}
