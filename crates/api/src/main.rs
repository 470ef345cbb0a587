use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use montefolio_core::domain::histogram::{self, BIN_COUNT};
use montefolio_core::domain::position::{Position, PositionField};
use montefolio_core::domain::request::{SimulationParams, SimulationRequest};
use montefolio_core::domain::validation::ValidationError;
use montefolio_core::domain::weights::{self, WeightedPosition};
use montefolio_core::pipeline::{self, SimulationReport};
use montefolio_core::remote::error::{LookupError, SimulationError};
use montefolio_core::remote::http::HttpSimulationService;
use montefolio_core::remote::{SimulationClient, TickerInfoClient};
use montefolio_core::store::{EnrichmentStatus, PositionStore};


#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = montefolio_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let service = Arc::new(HttpSimulationService::from_settings(&settings)?);
    tracing::info!(base_url = %settings.simulation_api_base_url, "simulation service configured");

    let state = AppState::new(service.clone(), service);

    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port_or_default()));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/positions", get(list_positions).post(add_position))
        .route(
            "/positions/:index",
            patch(update_position).delete(remove_position),
        )
        .route("/positions/:index/enrich", post(enrich_position))
        .route("/weights", get(get_weights))
        .route("/simulate", post(simulate))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    store: Arc<RwLock<PositionStore>>,
    tickers: Arc<dyn TickerInfoClient>,
    engine: Arc<dyn SimulationClient>,
}

impl AppState {
    fn new(tickers: Arc<dyn TickerInfoClient>, engine: Arc<dyn SimulationClient>) -> Self {
        let mut store = PositionStore::with_blank_row();
        store.subscribe(|positions: &[Position]| match weights::derive(positions) {
            Ok(weighted) => tracing::debug!(
                rows = positions.len(),
                weighted = weighted.len(),
                "positions changed"
            ),
            Err(_) => tracing::debug!(rows = positions.len(), "positions changed; nothing to weight yet"),
        });

        Self {
            store: Arc::new(RwLock::new(store)),
            tickers,
            engine,
        }
    }
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Validation(ValidationError),
    Lookup(LookupError),
    Simulation(SimulationError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::RowOutOfRange { .. } => Self::NotFound(e.to_string()),
            other => Self::Validation(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::Validation(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            Self::Lookup(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            Self::Simulation(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

async fn list_positions(State(state): State<AppState>) -> Json<Vec<Position>> {
    Json(state.store.read().await.positions().to_vec())
}

async fn add_position(State(state): State<AppState>) -> Json<Vec<Position>> {
    let mut store = state.store.write().await;
    store.add();
    Json(store.positions().to_vec())
}

#[derive(Debug, Default, Deserialize)]
struct PositionPatch {
    symbol: Option<String>,
    allocated_value: Option<f64>,
}

async fn update_position(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(body): Json<PositionPatch>,
) -> Result<Json<Position>, ApiError> {
    let mut fields = Vec::with_capacity(2);
    if let Some(symbol) = body.symbol {
        fields.push(PositionField::Symbol(symbol));
    }
    if let Some(value) = body.allocated_value {
        fields.push(PositionField::AllocatedValue(value));
    }
    if fields.is_empty() {
        return Err(ApiError::Validation(ValidationError::InvalidParameter {
            name: "body",
            detail: "expected `symbol` or `allocated_value`".to_string(),
        }));
    }

    let mut store = state.store.write().await;
    store.update_fields(index, fields)?;
    let position = store.get(index).cloned().ok_or_else(|| {
        ApiError::NotFound(format!("row index {index} out of range"))
    })?;
    Ok(Json(position))
}

/// The form always keeps one row on screen, so removing the last row is ignored.
async fn remove_position(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<Vec<Position>>, ApiError> {
    let mut store = state.store.write().await;
    if index >= store.len() {
        return Err(ApiError::NotFound(format!(
            "row index {index} out of range (portfolio has {} rows)",
            store.len()
        )));
    }
    if store.len() > 1 {
        store.remove(index);
    }
    Ok(Json(store.positions().to_vec()))
}

#[derive(Debug, Serialize)]
struct EnrichResponse {
    #[serde(flatten)]
    status: EnrichmentStatus,
    positions: Vec<Position>,
}

async fn enrich_position(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<EnrichResponse>, ApiError> {
    let ticket = {
        let store = state.store.read().await;
        if index >= store.len() {
            return Err(ApiError::NotFound(format!("row index {index} out of range")));
        }
        store.enrichment_ticket(index)
    };
    let Some(ticket) = ticket else {
        return Err(ApiError::Validation(ValidationError::InvalidParameter {
            name: "symbol",
            detail: format!("row {index} has no symbol to look up"),
        }));
    };

    // The store is not held while the lookup runs; edits made meanwhile win.
    let outcome = ticket.resolve(state.tickers.as_ref()).await;

    let mut store = state.store.write().await;
    let status = store.apply_enrichment(outcome).map_err(|e| {
        let err = anyhow::Error::new(e.clone());
        sentry_anyhow::capture_anyhow(&err);
        tracing::warn!(error = %err, "ticker lookup failed");
        ApiError::Lookup(e)
    })?;

    Ok(Json(EnrichResponse {
        status,
        positions: store.positions().to_vec(),
    }))
}

async fn get_weights(State(state): State<AppState>) -> Result<Json<Vec<WeightedPosition>>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(weights::derive(store.positions())?))
}

#[derive(Debug, Deserialize)]
struct SimulateBody {
    #[serde(flatten)]
    params: SimulationParams,
    #[serde(default)]
    bins: Option<usize>,
}

async fn simulate(
    State(state): State<AppState>,
    Json(body): Json<SimulateBody>,
) -> Result<Json<SimulationReport>, ApiError> {
    let bins = body.bins.unwrap_or(BIN_COUNT);
    histogram::validate_bin_count(bins)?;

    let request: SimulationRequest = {
        let store = state.store.read().await;
        pipeline::prepare(store.positions(), &body.params)?
    };

    let report = pipeline::submit(state.engine.as_ref(), request, bins)
        .await
        .map_err(|e| {
            let err = anyhow::Error::new(e.clone());
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "simulation request failed");
            ApiError::Simulation(e)
        })?;

    Ok(Json(report))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &montefolio_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
