use crate::domain::position::{RowId, TickerDetails};
use crate::remote::error::LookupError;
use crate::remote::TickerInfoClient;
use serde::Serialize;

/// A pending lookup, bound to the row that asked for it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentTicket {
    pub row_id: RowId,
    pub symbol: String,
}

impl EnrichmentTicket {
    pub async fn resolve(self, client: &dyn TickerInfoClient) -> EnrichmentOutcome {
        let result = client.lookup(&self.symbol).await;
        EnrichmentOutcome {
            row_id: self.row_id,
            requested_symbol: self.symbol,
            result,
        }
    }
}

/// A finished lookup, tagged with the row and symbol it was requested for.
#[derive(Debug, Clone)]
pub struct EnrichmentOutcome {
    pub row_id: RowId,
    pub requested_symbol: String,
    pub result: Result<TickerDetails, LookupError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnrichmentStatus {
    Applied { index: usize },
    Discarded(DiscardReason),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DiscardReason {
    RowRemoved,
    SymbolChanged { current: String },
}
