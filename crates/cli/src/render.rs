use montefolio_core::domain::histogram::{format_amount, HistogramBin};
use montefolio_core::domain::position::Position;
use montefolio_core::domain::request::SimulationRequest;
use montefolio_core::domain::summary::Summary;
use std::fmt::Write;

const BAR_WIDTH: usize = 40;

fn pct(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}%", v * 100.0))
        .unwrap_or_else(|| "n/a".to_string())
}

fn ten_year(position: &Position) -> String {
    match (position.trailing_10yr_return, position.trailing_10yr_start_date) {
        (Some(r), _) => pct(Some(r)),
        (None, Some(start)) => format!("since {start}"),
        (None, None) => "n/a".to_string(),
    }
}

/// One line per row. Weights are taken from the request, which lists weighted rows in order.
pub fn positions_table(positions: &[Position], request: &SimulationRequest) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<8} {:<36} {:>14} {:>8} {:>10} {:>8} {:>8} {:>9} {:>17}",
        "SYMBOL", "NAME", "VALUE", "WEIGHT", "PRICE", "YIELD", "EXPENSE", "12MO", "10YR/YR"
    );

    let mut weights = request.weights.iter();
    for p in positions {
        let weighted = !p.symbol.trim().is_empty() && p.allocated_value > 0.0;
        let weight = if weighted { weights.next().copied() } else { None };
        let name: String = p.display_name.as_deref().unwrap_or("-").chars().take(36).collect();
        let price = p
            .current_price
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| "n/a".to_string());

        let _ = writeln!(
            out,
            "{:<8} {:<36} {:>14} {:>8} {:>10} {:>8} {:>8} {:>9} {:>17}",
            p.symbol.trim(),
            name,
            format!("${}", format_amount(p.allocated_value)),
            pct(weight),
            price,
            pct(p.annual_yield),
            pct(p.expense_ratio),
            pct(p.trailing_12mo_return),
            ten_year(p),
        );
    }
    out
}

pub fn summary(summary: &Summary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Simulated trials: {}", summary.trials);
    for row in summary.rows() {
        let _ = writeln!(out, "{:<16} {:>16}", row.label, row.display_value());
    }
    out
}

/// Horizontal bar chart, bars scaled to the fullest bucket.
pub fn histogram(bins: &[HistogramBin]) -> String {
    let mut out = String::new();
    let Some(max) = bins.iter().map(|b| b.count).max().filter(|m| *m > 0) else {
        return out;
    };
    let label_width = bins.iter().map(|b| b.range_label.len()).max().unwrap_or(0);

    for b in bins {
        let len = (b.count * BAR_WIDTH).div_ceil(max);
        let _ = writeln!(
            out,
            "{:>width$} | {} {}",
            b.range_label,
            "#".repeat(len),
            b.count,
            width = label_width
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use montefolio_core::domain::histogram::bin;
    use montefolio_core::domain::request::SimulationParams;

    #[test]
    fn histogram_scales_to_fullest_bucket() {
        let text = histogram(&bin(&[0.0, 0.0, 0.0, 0.0, 10.0], 2));
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(&format!("{} 4", "#".repeat(BAR_WIDTH))));
        assert!(lines[1].ends_with(&format!("{} 1", "#".repeat(BAR_WIDTH / 4))));
        assert!(histogram(&[]).is_empty());
    }

    #[test]
    fn table_skips_weight_for_unweighted_rows() {
        let mut a = Position::empty();
        a.symbol = "AAA".to_string();
        a.allocated_value = 600.0;
        let blank = Position::empty();
        let mut b = Position::empty();
        b.symbol = "BBB".to_string();
        b.allocated_value = 400.0;
        b.trailing_10yr_start_date = NaiveDate::from_ymd_opt(2020, 10, 13);

        let request = SimulationRequest {
            params: SimulationParams::default(),
            tickers: vec!["AAA".to_string(), "BBB".to_string()],
            weights: vec![0.6, 0.4],
        };
        let text = positions_table(&[a, blank, b], &request);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("60.00%"));
        assert!(lines[2].contains("n/a"));
        assert!(lines[3].contains("40.00%"));
        assert!(lines[3].contains("since 2020-10-13"));
    }
}
