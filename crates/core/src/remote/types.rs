use crate::domain::position::TickerDetails;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct TickerInfoRequest<'a> {
    pub ticker: &'a str,
}

/// Wire shape of a successful `/tickerinfo` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerInfoResponse {
    pub ticker: String,
    pub full_name: String,
    pub current_price: f64,
    #[serde(default)]
    pub annual_dividend_yield: Option<f64>,
    #[serde(default)]
    pub expense_ratio: Option<f64>,
    #[serde(default, rename = "past12MoReturn")]
    pub past12_mo_return: Option<f64>,
    #[serde(default)]
    pub ten_year_return: Option<f64>,
    #[serde(default)]
    pub ten_year_start: Option<NaiveDate>,
}

impl TickerInfoResponse {
    pub fn into_details(self) -> TickerDetails {
        TickerDetails {
            symbol: self.ticker.trim().to_uppercase(),
            display_name: self.full_name,
            current_price: self.current_price,
            annual_yield: self.annual_dividend_yield,
            expense_ratio: self.expense_ratio,
            trailing_12mo_return: self.past12_mo_return,
            trailing_10yr_return: self.ten_year_return,
            trailing_10yr_start_date: self.ten_year_start,
        }
    }
}

/// Body the service sends instead of a result when it gives up.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
