use crate::domain::position::{
    Position, PositionField, RowId, MAX_ALLOCATED_VALUE, MAX_POSITIONS,
};
use crate::domain::validation::ValidationError;
use crate::remote::error::LookupError;
use crate::remote::TickerInfoClient;
use std::fmt;

mod enrichment;

pub use enrichment::{DiscardReason, EnrichmentOutcome, EnrichmentStatus, EnrichmentTicket};

/// Receives the full row list after every mutation of a [`PositionStore`].
pub trait PositionObserver: Send + Sync {
    fn positions_changed(&self, positions: &[Position]);
}

impl<F> PositionObserver for F
where
    F: Fn(&[Position]) + Send + Sync,
{
    fn positions_changed(&self, positions: &[Position]) {
        self(positions)
    }
}

/// Ordered, editable portfolio rows.
///
/// All transitions are synchronous and applied in call order. Ticker lookups are split into
/// [`PositionStore::enrichment_ticket`] and [`PositionStore::apply_enrichment`] so callers can
/// release the store while the lookup is in flight; results are matched by [`RowId`], never by
/// index.
#[derive(Default)]
pub struct PositionStore {
    positions: Vec<Position>,
    observers: Vec<Box<dyn PositionObserver>>,
}

impl fmt::Debug for PositionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionStore")
            .field("positions", &self.positions)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl PositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding one blank row, the state a fresh portfolio form starts in.
    pub fn with_blank_row() -> Self {
        let mut store = Self::new();
        store.positions.push(Position::empty());
        store
    }

    pub fn subscribe(&mut self, observer: impl PositionObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.positions.len() >= MAX_POSITIONS
    }

    pub fn get(&self, index: usize) -> Option<&Position> {
        self.positions.get(index)
    }

    pub fn index_of(&self, id: RowId) -> Option<usize> {
        self.positions.iter().position(|p| p.id == id)
    }

    /// Appends a blank row. At the row ceiling this is a no-op and returns `None`.
    pub fn add(&mut self) -> Option<RowId> {
        if self.is_full() {
            tracing::debug!(max = MAX_POSITIONS, "position ceiling reached; add ignored");
            return None;
        }
        let position = Position::empty();
        let id = position.id;
        self.positions.push(position);
        self.notify();
        Some(id)
    }

    /// Removes the row at `index`. Out-of-range indexes are ignored. The store itself may become
    /// empty; keeping at least one row visible is up to the presentation layer.
    pub fn remove(&mut self, index: usize) -> Option<Position> {
        if index >= self.positions.len() {
            return None;
        }
        let removed = self.positions.remove(index);
        self.notify();
        Some(removed)
    }

    pub fn update_field(&mut self, index: usize, field: PositionField) -> Result<(), ValidationError> {
        self.update_fields(index, [field])
    }

    /// Applies several field edits to one row as a unit: if any edit is rejected the row is left
    /// exactly as it was and observers are not notified.
    pub fn update_fields(
        &mut self,
        index: usize,
        fields: impl IntoIterator<Item = PositionField>,
    ) -> Result<(), ValidationError> {
        let len = self.positions.len();
        let mut edited = self
            .positions
            .get(index)
            .cloned()
            .ok_or(ValidationError::RowOutOfRange { index, len })?;

        for field in fields {
            match field {
                PositionField::Symbol(symbol) => edited.symbol = symbol,
                PositionField::AllocatedValue(value) => {
                    if !(value.is_finite() && (0.0..=MAX_ALLOCATED_VALUE).contains(&value)) {
                        return Err(ValidationError::InvalidAllocatedValue { value });
                    }
                    edited.allocated_value = value;
                }
            }
        }

        self.positions[index] = edited;
        self.notify();
        Ok(())
    }

    /// Captures what is needed to look up the row at `index`. `None` when the index is out of
    /// range or the row has no symbol yet.
    pub fn enrichment_ticket(&self, index: usize) -> Option<EnrichmentTicket> {
        let position = self.positions.get(index)?;
        let symbol = position.symbol.trim();
        if symbol.is_empty() {
            return None;
        }
        Some(EnrichmentTicket {
            row_id: position.id,
            symbol: symbol.to_string(),
        })
    }

    /// Applies a finished lookup to the row it was requested for.
    ///
    /// The result is discarded when that row no longer exists or its symbol has been edited to
    /// something else in the meantime. A failed lookup leaves every row untouched.
    pub fn apply_enrichment(
        &mut self,
        outcome: EnrichmentOutcome,
    ) -> Result<EnrichmentStatus, LookupError> {
        let details = outcome.result?;

        let Some(index) = self.index_of(outcome.row_id) else {
            tracing::debug!(row_id = %outcome.row_id, symbol = %outcome.requested_symbol, "row removed before lookup finished; result discarded");
            return Ok(EnrichmentStatus::Discarded(DiscardReason::RowRemoved));
        };

        let position = &mut self.positions[index];
        if !position.symbol_matches(&outcome.requested_symbol) {
            tracing::debug!(
                row_id = %outcome.row_id,
                requested = %outcome.requested_symbol,
                current = %position.symbol,
                "symbol edited before lookup finished; result discarded"
            );
            return Ok(EnrichmentStatus::Discarded(DiscardReason::SymbolChanged {
                current: position.symbol.clone(),
            }));
        }

        position.apply_details(details);
        self.notify();
        Ok(EnrichmentStatus::Applied { index })
    }

    /// Looks up the row at `index` and applies the result, holding the store for the whole call.
    /// Returns `Ok(None)` when there is nothing to look up.
    pub async fn enrich(
        &mut self,
        index: usize,
        client: &dyn TickerInfoClient,
    ) -> Result<Option<EnrichmentStatus>, LookupError> {
        let Some(ticket) = self.enrichment_ticket(index) else {
            return Ok(None);
        };
        let outcome = ticket.resolve(client).await;
        self.apply_enrichment(outcome).map(Some)
    }

    fn notify(&self) {
        for observer in &self.observers {
            observer.positions_changed(&self.positions);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::TickerDetails;
    use crate::remote::error::RemoteFailure;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FakeTickerClient {
        known: HashMap<String, TickerDetails>,
    }

    impl FakeTickerClient {
        fn with(symbols: &[&str]) -> Self {
            let known = symbols
                .iter()
                .map(|s| (s.to_string(), details(s)))
                .collect();
            Self { known }
        }
    }

    #[async_trait::async_trait]
    impl TickerInfoClient for FakeTickerClient {
        async fn lookup(&self, symbol: &str) -> Result<TickerDetails, LookupError> {
            self.known
                .get(&symbol.trim().to_uppercase())
                .cloned()
                .ok_or_else(|| LookupError {
                    symbol: symbol.to_string(),
                    failure: RemoteFailure::Service("not found".to_string()),
                })
        }
    }

    fn details(symbol: &str) -> TickerDetails {
        TickerDetails {
            symbol: symbol.to_uppercase(),
            display_name: format!("{symbol} Fund"),
            current_price: 100.0,
            annual_yield: Some(0.01),
            expense_ratio: Some(0.001),
            trailing_12mo_return: Some(0.12),
            trailing_10yr_return: Some(0.1),
            trailing_10yr_start_date: None,
        }
    }

    fn store_with(symbols: &[&str]) -> PositionStore {
        let mut store = PositionStore::new();
        for (i, s) in symbols.iter().enumerate() {
            store.add();
            store
                .update_field(i, PositionField::Symbol(s.to_string()))
                .unwrap();
        }
        store
    }

    #[test]
    fn add_stops_at_ceiling() {
        let mut store = PositionStore::with_blank_row();
        for _ in 0..40 {
            store.add();
        }
        assert_eq!(store.len(), MAX_POSITIONS);
        assert!(store.is_full());
        assert_eq!(store.add(), None);
        assert_eq!(store.len(), MAX_POSITIONS);
    }

    #[test]
    fn remove_may_empty_store_and_ignores_bad_index() {
        let mut store = PositionStore::with_blank_row();
        assert!(store.remove(3).is_none());
        assert_eq!(store.len(), 1);
        assert!(store.remove(0).is_some());
        assert!(store.is_empty());
        assert!(store.remove(0).is_none());
    }

    #[test]
    fn update_field_preserves_other_fields() {
        let mut store = store_with(&["vgt"]);
        store.positions[0].apply_details(details("VGT"));
        store
            .update_field(0, PositionField::AllocatedValue(2500.0))
            .unwrap();

        let p = store.get(0).unwrap();
        assert_eq!(p.allocated_value, 2500.0);
        assert_eq!(p.symbol, "VGT");
        assert_eq!(p.display_name.as_deref(), Some("VGT Fund"));
    }

    #[test]
    fn update_field_rejects_bad_input() {
        let mut store = store_with(&["AAA"]);
        assert_eq!(
            store.update_field(4, PositionField::AllocatedValue(1.0)),
            Err(ValidationError::RowOutOfRange { index: 4, len: 1 })
        );
        assert!(matches!(
            store.update_field(0, PositionField::AllocatedValue(-5.0)),
            Err(ValidationError::InvalidAllocatedValue { .. })
        ));
        assert!(store
            .update_field(0, PositionField::AllocatedValue(f64::NAN))
            .is_err());
        assert_eq!(store.get(0).unwrap().allocated_value, 0.0);
    }

    #[test]
    fn rejected_edit_leaves_row_untouched() {
        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        let mut store = PositionStore::with_blank_row();
        store.subscribe(move |_: &[Position]| *sink.lock().unwrap() += 1);

        let res = store.update_fields(
            0,
            [
                PositionField::Symbol("ZZZ".to_string()),
                PositionField::AllocatedValue(-5.0),
            ],
        );
        assert!(matches!(res, Err(ValidationError::InvalidAllocatedValue { .. })));
        assert_eq!(store.get(0).unwrap().symbol, "");
        assert_eq!(*seen.lock().unwrap(), 0);

        store
            .update_fields(
                0,
                [
                    PositionField::Symbol("VGT".to_string()),
                    PositionField::AllocatedValue(250.0),
                ],
            )
            .unwrap();
        let p = store.get(0).unwrap();
        assert_eq!((p.symbol.as_str(), p.allocated_value), ("VGT", 250.0));
        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn allocated_value_above_ceiling_is_rejected() {
        let mut store = store_with(&["AAA"]);
        assert!(store
            .update_field(0, PositionField::AllocatedValue(1e308))
            .is_err());
        assert!(store
            .update_field(0, PositionField::AllocatedValue(MAX_ALLOCATED_VALUE))
            .is_ok());
    }

    #[test]
    fn observers_see_every_mutation() {
        let seen = Arc::new(Mutex::new(Vec::<usize>::new()));
        let sink = Arc::clone(&seen);

        let mut store = PositionStore::new();
        store.subscribe(move |positions: &[Position]| {
            sink.lock().unwrap().push(positions.len());
        });

        store.add();
        store.add();
        store
            .update_field(1, PositionField::Symbol("AAA".to_string()))
            .unwrap();
        store.remove(0);
        // No-ops do not notify.
        store.remove(9);

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 2, 1]);
    }

    #[test]
    fn blank_rows_have_no_ticket() {
        let store = PositionStore::with_blank_row();
        assert!(store.enrichment_ticket(0).is_none());
        assert!(store.enrichment_ticket(1).is_none());
    }

    #[tokio::test]
    async fn enrich_fills_details_and_canonicalizes_symbol() {
        let client = FakeTickerClient::with(&["VGT"]);
        let mut store = store_with(&[" vgt "]);

        let status = store.enrich(0, &client).await.unwrap();
        assert_eq!(status, Some(EnrichmentStatus::Applied { index: 0 }));

        let p = store.get(0).unwrap();
        assert_eq!(p.symbol, "VGT");
        assert_eq!(p.display_name.as_deref(), Some("VGT Fund"));
        assert_eq!(p.current_price, Some(100.0));
    }

    #[tokio::test]
    async fn failed_lookup_leaves_row_untouched() {
        let client = FakeTickerClient::default();
        let mut store = store_with(&["AAA"]);
        store.positions[0].display_name = Some("Previously Known".to_string());
        store.positions[0].current_price = Some(12.0);
        let before = store.get(0).cloned();

        let err = store.enrich(0, &client).await.unwrap_err();
        assert_eq!(err.symbol, "AAA");
        assert_eq!(err.failure, RemoteFailure::Service("not found".to_string()));
        assert_eq!(store.get(0).cloned(), before);
    }

    #[tokio::test]
    async fn result_for_removed_row_is_discarded() {
        let client = FakeTickerClient::with(&["AAA", "BBB"]);
        let mut store = store_with(&["AAA", "BBB"]);

        let ticket = store.enrichment_ticket(0).unwrap();
        store.remove(0);
        let outcome = ticket.resolve(&client).await;

        let status = store.apply_enrichment(outcome).unwrap();
        assert_eq!(status, EnrichmentStatus::Discarded(DiscardReason::RowRemoved));
        // The row that slid into index 0 is not overwritten.
        let p = store.get(0).unwrap();
        assert_eq!(p.symbol, "BBB");
        assert!(!p.is_enriched());
    }

    #[tokio::test]
    async fn result_for_edited_symbol_is_discarded() {
        let client = FakeTickerClient::with(&["AAA"]);
        let mut store = store_with(&["AAA"]);

        let ticket = store.enrichment_ticket(0).unwrap();
        store
            .update_field(0, PositionField::Symbol("ZZZ".to_string()))
            .unwrap();
        let outcome = ticket.resolve(&client).await;

        let status = store.apply_enrichment(outcome).unwrap();
        assert_eq!(
            status,
            EnrichmentStatus::Discarded(DiscardReason::SymbolChanged {
                current: "ZZZ".to_string()
            })
        );
        assert!(!store.get(0).unwrap().is_enriched());
    }

    #[tokio::test]
    async fn result_follows_row_after_it_moves() {
        let client = FakeTickerClient::with(&["BBB"]);
        let mut store = store_with(&["AAA", "bbb"]);

        let ticket = store.enrichment_ticket(1).unwrap();
        store.remove(0);
        let outcome = ticket.resolve(&client).await;

        let status = store.apply_enrichment(outcome).unwrap();
        assert_eq!(status, EnrichmentStatus::Applied { index: 0 });
        assert_eq!(store.get(0).unwrap().symbol, "BBB");
    }
}
