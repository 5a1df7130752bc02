use serde::{Deserialize, Serialize};

/// Whiskers reach the furthest sample within this many IQRs of the box.
const WHISKER_REACH: f64 = 1.5;

/// Distribution summary behind a box plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
}

impl BoxStats {
    /// Compute statistics, ignoring non-finite values. `None` if nothing is left.
    pub fn compute(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let min = sorted[0];
        let max = sorted[count - 1];

        #[allow(clippy::cast_precision_loss)]
        let mean = sorted.iter().sum::<f64>() / count as f64;

        let q1 = percentile(&sorted, 0.25);
        let median = percentile(&sorted, 0.5);
        let q3 = percentile(&sorted, 0.75);

        let iqr = q3 - q1;
        let upper_limit = q3 + WHISKER_REACH * iqr;
        let lower_limit = q1 - WHISKER_REACH * iqr;

        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= upper_limit)
            .map_or(q3, |v| v.max(q3));
        let whisker_low = sorted
            .iter()
            .copied()
            .find(|&v| v >= lower_limit)
            .map_or(q1, |v| v.min(q1));

        Some(Self {
            count,
            min,
            max,
            mean,
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
        })
    }
}

/// Linear interpolation between the closest ranks of an ascending slice.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn percentile(sorted: &[f64], fraction: f64) -> f64 {
    let position = fraction * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}
