//! Return metrics.
//!
//! growth = prod(1 + g) - 1
//! cagr   = prod(1 + g)^(k / n) - 1

use super::MetricInput;
use super::stats;

pub fn mean_gain(input: &MetricInput<'_>) -> f64 {
    stats::mean(input.gains)
}

pub fn growth(input: &MetricInput<'_>) -> f64 {
    if input.gains.is_empty() {
        return f64::NAN;
    }
    input.gains.iter().map(|g| 1.0 + g).product::<f64>() - 1.0
}

pub fn cagr(input: &MetricInput<'_>) -> f64 {
    let n = input.gains.len();
    if n == 0 {
        return f64::NAN;
    }
    (1.0 + growth(input)).powf(input.units_per_year / n as f64) - 1.0
}
