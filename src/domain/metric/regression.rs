//! Benchmark-relative metrics: regression of fund gains on benchmark gains.
//!
//! beta  = Cov(g, b) / Var(b)
//! alpha = mean(g) - beta * mean(b)
//! r     = Cov(g, b) / (sd(g) * sd(b))
//! rho   = r computed on ranks

use super::MetricInput;
use super::stats;

fn with_benchmark(input: &MetricInput<'_>, f: impl Fn(&[f64], &[f64]) -> f64) -> f64 {
    match input.benchmark {
        Some(b) if b.len() == input.gains.len() => f(input.gains, b),
        _ => f64::NAN,
    }
}

fn beta_of(g: &[f64], b: &[f64]) -> f64 {
    let var_b = stats::variance(b);
    if !(var_b > 0.0) {
        return f64::NAN;
    }
    stats::covariance(g, b) / var_b
}

fn alpha_of(g: &[f64], b: &[f64]) -> f64 {
    stats::mean(g) - beta_of(g, b) * stats::mean(b)
}

fn pearson_of(g: &[f64], b: &[f64]) -> f64 {
    let denom = (stats::variance(g) * stats::variance(b)).sqrt();
    if !(denom > 0.0) {
        return f64::NAN;
    }
    stats::covariance(g, b) / denom
}

pub fn beta(input: &MetricInput<'_>) -> f64 {
    with_benchmark(input, beta_of)
}

pub fn alpha(input: &MetricInput<'_>) -> f64 {
    with_benchmark(input, alpha_of)
}

pub fn alpha_annualized(input: &MetricInput<'_>) -> f64 {
    alpha(input) * input.units_per_year
}

pub fn pearson(input: &MetricInput<'_>) -> f64 {
    with_benchmark(input, pearson_of)
}

pub fn r_squared(input: &MetricInput<'_>) -> f64 {
    pearson(input).powi(2)
}

pub fn spearman(input: &MetricInput<'_>) -> f64 {
    with_benchmark(input, |g, b| pearson_of(&stats::ranks(g), &stats::ranks(b)))
}
