//! Dispersion and risk-adjusted return metrics.
//!
//! sd      = sqrt(sum((g - mean)^2) / n)
//! sharpe  = mean / sd * sqrt(k)
//! sortino = mean / sqrt(sum(min(g, 0)^2) / n) * sqrt(k)
//!
//! Population moments, zero target return. Fewer than two observations or a
//! zero denominator gives NaN.

use super::MetricInput;
use super::stats;

pub fn sd(input: &MetricInput<'_>) -> f64 {
    stats::variance(input.gains).sqrt()
}

pub fn sharpe(input: &MetricInput<'_>) -> f64 {
    let dev = sd(input);
    if !(dev > 0.0) {
        return f64::NAN;
    }
    stats::mean(input.gains) / dev * input.units_per_year.sqrt()
}

pub fn sortino(input: &MetricInput<'_>) -> f64 {
    let g = input.gains;
    if g.len() < 2 {
        return f64::NAN;
    }
    let downside = (g.iter().map(|r| r.min(0.0).powi(2)).sum::<f64>() / g.len() as f64).sqrt();
    if !(downside > 0.0) {
        return f64::NAN;
    }
    stats::mean(g) / downside * input.units_per_year.sqrt()
}
