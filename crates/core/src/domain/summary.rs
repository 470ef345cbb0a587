use crate::domain::histogram::format_amount;
use serde::{Deserialize, Serialize};

/// Response of the simulation engine. Statistics are trusted as-is; any of them may be missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationResult {
    #[serde(default)]
    pub pct_25: Option<f64>,
    #[serde(default)]
    pub pct_50: Option<f64>,
    #[serde(default)]
    pub pct_75: Option<f64>,
    #[serde(default)]
    pub mean: Option<f64>,
    /// Final portfolio value of every simulated trial, unordered.
    #[serde(default)]
    pub all_final_values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub pct_25: Option<f64>,
    pub pct_50: Option<f64>,
    pub pct_75: Option<f64>,
    pub mean: Option<f64>,
    pub trials: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub label: &'static str,
    pub value: Option<f64>,
}

impl SummaryRow {
    pub fn display_value(&self) -> String {
        match self.value {
            Some(v) => format!("${}", format_amount(v)),
            None => "n/a".to_string(),
        }
    }
}

pub fn summarize(result: &SimulationResult) -> Summary {
    Summary {
        pct_25: result.pct_25,
        pct_50: result.pct_50,
        pct_75: result.pct_75,
        mean: result.mean,
        trials: result.all_final_values.len(),
    }
}

impl Summary {
    pub fn rows(&self) -> [SummaryRow; 4] {
        [
            SummaryRow {
                label: "25th percentile",
                value: self.pct_25,
            },
            SummaryRow {
                label: "Median",
                value: self.pct_50,
            },
            SummaryRow {
                label: "75th percentile",
                value: self.pct_75,
            },
            SummaryRow {
                label: "Mean",
                value: self.mean,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_statistics_without_recomputing() {
        let result: SimulationResult = serde_json::from_value(json!({
            "pct_25": 700000.0,
            "pct_50": 950000.5,
            "pct_75": 1300000.0,
            "mean": 1.0,
            "all_final_values": [1.0, 2.0, 3.0],
        }))
        .unwrap();

        let summary = summarize(&result);
        assert_eq!(summary.pct_50, Some(950000.5));
        // Reported mean is passed through even though it disagrees with the outcomes.
        assert_eq!(summary.mean, Some(1.0));
        assert_eq!(summary.trials, 3);
        assert_eq!(summary.rows()[1].display_value(), "$950,001");
    }

    #[test]
    fn missing_fields_render_as_not_available() {
        let result: SimulationResult = serde_json::from_value(json!({"pct_50": 10.0})).unwrap();
        let summary = summarize(&result);
        assert_eq!(summary.pct_25, None);
        assert_eq!(summary.trials, 0);

        let rows = summary.rows();
        assert_eq!(rows[0].display_value(), "n/a");
        assert_eq!(rows[1].display_value(), "$10");
        assert_eq!(rows[3].label, "Mean");
    }
}
