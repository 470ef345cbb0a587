use crate::domain::validation::ValidationError;
use serde::{Deserialize, Serialize};

/// Default number of buckets used to chart simulation outcomes.
pub const BIN_COUNT: usize = 30;

/// Largest bucket count a caller may ask for.
pub const MAX_BIN_COUNT: usize = 500;

pub fn validate_bin_count(bin_count: usize) -> Result<(), ValidationError> {
    if !(1..=MAX_BIN_COUNT).contains(&bin_count) {
        return Err(ValidationError::InvalidParameter {
            name: "bins",
            detail: format!("must be 1..={MAX_BIN_COUNT} (got {bin_count})"),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub range_label: String,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub count: usize,
}

/// Buckets `values` into `bin_count` equal-width, contiguous bins between the smallest and
/// largest value.
///
/// Empty input yields no bins. When every value is identical a single zero-width bin holding all
/// of them is returned, as is one `[min, max]` bin when the range cannot be split into
/// representable widths. Non-finite values are ignored. The input slice is not modified.
pub fn bin(values: &[f64], bin_count: usize) -> Vec<HistogramBin> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() || bin_count == 0 {
        return Vec::new();
    }
    sorted.sort_by(f64::total_cmp);

    let min = sorted[0];
    let max = sorted[sorted.len() - 1];

    if min == max {
        return vec![HistogramBin {
            range_label: format_amount(min),
            lower_bound: min,
            upper_bound: min,
            count: sorted.len(),
        }];
    }

    // Work in half units so `max - min` cannot overflow for outcomes near f64::MAX.
    let half_width = (max * 0.5 - min * 0.5) / bin_count as f64;
    if !(half_width.is_finite() && half_width > 0.0) {
        return vec![HistogramBin {
            range_label: format!("{} - {}", format_amount(min), format_amount(max)),
            lower_bound: min,
            upper_bound: max,
            count: sorted.len(),
        }];
    }

    let mut counts = vec![0usize; bin_count];
    for v in &sorted {
        let raw = ((v * 0.5 - min * 0.5) / half_width).floor();
        // Float error can push the maximum one slot past the end.
        let idx = if raw <= 0.0 {
            0
        } else {
            (raw as usize).min(bin_count - 1)
        };
        counts[idx] += 1;
    }

    // Bin i spans edges[i]..edges[i + 1], so neighbouring bins share the exact same boundary.
    let edges: Vec<f64> = (0..=bin_count)
        .map(|i| {
            let step = i as f64 * half_width;
            min + step + step
        })
        .collect();

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let lower_bound = edges[i];
            let upper_bound = edges[i + 1];
            HistogramBin {
                range_label: format!(
                    "{} - {}",
                    format_amount(lower_bound),
                    format_amount(upper_bound)
                ),
                lower_bound,
                upper_bound,
                count,
            }
        })
        .collect()
}

/// Rounds to whole units and groups thousands, e.g. `1234567.8` -> `1,234,568`.
pub fn format_amount(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
