use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound on the number of rows a portfolio may hold at once.
pub const MAX_POSITIONS: usize = 15;

/// Largest amount a single row may hold. Keeps sums of up to `MAX_POSITIONS` rows finite and
/// far from overflow.
pub const MAX_ALLOCATED_VALUE: f64 = 1e15;

/// Stable identity of a portfolio row. Assigned on creation and never reused, so async results
/// can be matched back to the row that requested them even after the row has moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(Uuid);

impl RowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: RowId,
    pub symbol: String,
    pub display_name: Option<String>,
    pub current_price: Option<f64>,
    pub annual_yield: Option<f64>,
    pub expense_ratio: Option<f64>,
    pub trailing_12mo_return: Option<f64>,
    pub trailing_10yr_return: Option<f64>,
    pub trailing_10yr_start_date: Option<NaiveDate>,
    pub allocated_value: f64,
}

impl Position {
    pub fn empty() -> Self {
        Self {
            id: RowId::new(),
            symbol: String::new(),
            display_name: None,
            current_price: None,
            annual_yield: None,
            expense_ratio: None,
            trailing_12mo_return: None,
            trailing_10yr_return: None,
            trailing_10yr_start_date: None,
            allocated_value: 0.0,
        }
    }

    pub fn is_enriched(&self) -> bool {
        self.display_name.is_some()
    }

    /// Symbol comparison ignores case and surrounding whitespace.
    pub fn symbol_matches(&self, symbol: &str) -> bool {
        self.symbol.trim().eq_ignore_ascii_case(symbol.trim())
    }

    pub(crate) fn apply_details(&mut self, details: TickerDetails) {
        self.symbol = details.symbol;
        self.display_name = Some(details.display_name);
        self.current_price = Some(details.current_price);
        self.annual_yield = details.annual_yield;
        self.expense_ratio = details.expense_ratio;
        self.trailing_12mo_return = details.trailing_12mo_return;
        self.trailing_10yr_return = details.trailing_10yr_return;
        self.trailing_10yr_start_date = details.trailing_10yr_start_date;
    }
}

/// One user-editable field of a row, carrying its new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionField {
    Symbol(String),
    AllocatedValue(f64),
}

/// Descriptive data for a symbol as returned by a successful ticker lookup.
///
/// `trailing_10yr_return` is absent when the instrument has less than ten years of history; in
/// that case `trailing_10yr_start_date` records where the history begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerDetails {
    pub symbol: String,
    pub display_name: String,
    pub current_price: f64,
    pub annual_yield: Option<f64>,
    pub expense_ratio: Option<f64>,
    pub trailing_12mo_return: Option<f64>,
    pub trailing_10yr_return: Option<f64>,
    pub trailing_10yr_start_date: Option<NaiveDate>,
}
