use anyhow::Context;
use montefolio_core::domain::position::{PositionField, MAX_POSITIONS};
use montefolio_core::remote::TickerInfoClient;
use montefolio_core::store::{EnrichmentStatus, PositionStore};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tokio::task::JoinSet;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PortfolioEntry {
    pub symbol: String,
    #[serde(alias = "allocated_value")]
    pub value: f64,
}

/// `SYMBOL=VALUE` from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionArg {
    pub symbol: String,
    pub value: f64,
}

impl FromStr for PositionArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (symbol, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected SYMBOL=VALUE, got `{s}`"))?;
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(format!("missing symbol in `{s}`"));
        }
        let value = value
            .trim()
            .replace(',', "")
            .parse::<f64>()
            .map_err(|e| format!("invalid value in `{s}`: {e}"))?;
        Ok(Self {
            symbol: symbol.to_string(),
            value,
        })
    }
}

impl PositionArg {
    pub fn to_entry(&self) -> PortfolioEntry {
        PortfolioEntry {
            symbol: self.symbol.clone(),
            value: self.value,
        }
    }
}

pub fn load_entries(path: &Path) -> anyhow::Result<Vec<PortfolioEntry>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read portfolio file {}", path.display()))?;
    serde_json::from_str::<Vec<PortfolioEntry>>(&text)
        .with_context(|| format!("portfolio file {} is not a list of {{symbol, value}}", path.display()))
}

pub fn build_store(entries: &[PortfolioEntry]) -> anyhow::Result<PositionStore> {
    if entries.len() > MAX_POSITIONS {
        tracing::warn!(
            given = entries.len(),
            max = MAX_POSITIONS,
            "too many positions; extra rows ignored"
        );
    }

    let mut store = PositionStore::new();
    for entry in entries {
        if store.add().is_none() {
            break;
        }
        let index = store.len() - 1;
        store.update_field(index, PositionField::Symbol(entry.symbol.clone()))?;
        store
            .update_field(index, PositionField::AllocatedValue(entry.value))
            .with_context(|| format!("position {}", entry.symbol))?;
    }
    Ok(store)
}

#[derive(Debug, Default)]
pub struct EnrichReport {
    pub applied: usize,
    pub discarded: usize,
    pub failures: Vec<String>,
}

/// Looks up every row with a symbol concurrently and applies results as they arrive.
pub async fn enrich_all(
    store: &mut PositionStore,
    client: Arc<dyn TickerInfoClient>,
) -> EnrichReport {
    let mut lookups = JoinSet::new();
    for index in 0..store.len() {
        if let Some(ticket) = store.enrichment_ticket(index) {
            let client = Arc::clone(&client);
            lookups.spawn(async move { ticket.resolve(client.as_ref()).await });
        }
    }

    let mut report = EnrichReport::default();
    while let Some(joined) = lookups.join_next().await {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                report.failures.push(format!("ticker lookup task failed: {e}"));
                continue;
            }
        };
        match store.apply_enrichment(outcome) {
            Ok(EnrichmentStatus::Applied { .. }) => report.applied += 1,
            Ok(EnrichmentStatus::Discarded(_)) => report.discarded += 1,
            Err(e) => report.failures.push(e.to_string()),
        }
    }
    report
}
