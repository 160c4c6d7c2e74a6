//! Performance metric catalog.
//!
//! Each metric is a pure function of a window's gains, the annualization
//! factor and, for the regression family, the benchmark's gains over the same
//! dates. The catalog is a static table indexed by `MetricKind`.
//!
//! Metrics that are undefined for a window (a single observation, zero
//! variance, no losing periods for Sortino) evaluate to NaN.

pub mod drawdown;
pub mod regression;
pub mod returns;
pub mod risk;
mod stats;

use crate::domain::error::FundMetricsError;
use std::fmt;
use std::str::FromStr;

/// Arguments shared by every metric formula.
#[derive(Debug, Clone, Copy)]
pub struct MetricInput<'a> {
    pub gains: &'a [f64],
    pub benchmark: Option<&'a [f64]>,
    pub units_per_year: f64,
}

pub type MetricFn = fn(&MetricInput<'_>) -> f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    Mean,
    Sd,
    Growth,
    Cagr,
    Mdd,
    Sharpe,
    Sortino,
    Alpha,
    AlphaAnnualized,
    Beta,
    RSquared,
    Pearson,
    Spearman,
}

pub struct MetricSpec {
    pub kind: MetricKind,
    pub name: &'static str,
    pub label: &'static str,
    pub requires_benchmark: bool,
    pub is_annualized: bool,
    pub formula: MetricFn,
}

const fn spec(
    kind: MetricKind,
    name: &'static str,
    label: &'static str,
    requires_benchmark: bool,
    is_annualized: bool,
    formula: MetricFn,
) -> MetricSpec {
    MetricSpec {
        kind,
        name,
        label,
        requires_benchmark,
        is_annualized,
        formula,
    }
}

/// Indexed by `MetricKind as usize`.
pub static CATALOG: [MetricSpec; 13] = [
    spec(MetricKind::Mean, "mean", "Mean gain", false, false, returns::mean_gain),
    spec(MetricKind::Sd, "sd", "SD of gains", false, false, risk::sd),
    spec(MetricKind::Growth, "growth", "Growth", false, false, returns::growth),
    spec(MetricKind::Cagr, "cagr", "CAGR", false, true, returns::cagr),
    spec(MetricKind::Mdd, "mdd", "Max drawdown", false, false, drawdown::mdd),
    spec(MetricKind::Sharpe, "sharpe", "Sharpe ratio", false, true, risk::sharpe),
    spec(MetricKind::Sortino, "sortino", "Sortino ratio", false, true, risk::sortino),
    spec(MetricKind::Alpha, "alpha", "Alpha", true, false, regression::alpha),
    spec(
        MetricKind::AlphaAnnualized,
        "alpha.annualized",
        "Annualized alpha",
        true,
        true,
        regression::alpha_annualized,
    ),
    spec(MetricKind::Beta, "beta", "Beta", true, false, regression::beta),
    spec(MetricKind::RSquared, "r.squared", "R-squared", true, false, regression::r_squared),
    spec(MetricKind::Pearson, "r", "Pearson cor.", true, false, regression::pearson),
    spec(MetricKind::Spearman, "rho", "Spearman cor.", true, false, regression::spearman),
];

impl MetricKind {
    pub const ALL: [MetricKind; 13] = [
        MetricKind::Mean,
        MetricKind::Sd,
        MetricKind::Growth,
        MetricKind::Cagr,
        MetricKind::Mdd,
        MetricKind::Sharpe,
        MetricKind::Sortino,
        MetricKind::Alpha,
        MetricKind::AlphaAnnualized,
        MetricKind::Beta,
        MetricKind::RSquared,
        MetricKind::Pearson,
        MetricKind::Spearman,
    ];

    pub fn spec(self) -> &'static MetricSpec {
        &CATALOG[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn requires_benchmark(self) -> bool {
        self.spec().requires_benchmark
    }

    /// Evaluates this metric over one window.
    ///
    /// Fails if the metric needs a benchmark and none is given, or if the
    /// benchmark slice is not the same length as `gains`.
    pub fn evaluate(
        self,
        gains: &[f64],
        benchmark: Option<&[f64]>,
        units_per_year: f64,
    ) -> Result<f64, FundMetricsError> {
        let spec = self.spec();
        if spec.requires_benchmark && benchmark.is_none() {
            return Err(FundMetricsError::invalid(format!(
                "metric '{}' requires a benchmark",
                spec.name
            )));
        }
        if let Some(b) = benchmark {
            if b.len() != gains.len() {
                return Err(FundMetricsError::invalid(format!(
                    "metric '{}': {} gains but {} benchmark gains",
                    spec.name,
                    gains.len(),
                    b.len()
                )));
            }
        }
        let input = MetricInput {
            gains,
            benchmark,
            units_per_year,
        };
        Ok((spec.formula)(&input))
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for MetricKind {
    type Err = FundMetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        let alias = match key.as_str() {
            "pearson" => "r",
            "spearman" => "rho",
            other => other,
        };
        CATALOG
            .iter()
            .find(|spec| spec.name == alias)
            .map(|spec| spec.kind)
            .ok_or_else(|| {
                let valid: Vec<&str> = CATALOG.iter().map(|spec| spec.name).collect();
                FundMetricsError::invalid(format!(
                    "unknown metric '{}' (valid metrics: {})",
                    s.trim(),
                    valid.join(", ")
                ))
            })
    }
}

/// Parses a list of metric names, rejecting the whole list on the first
/// unknown name.
pub fn parse_metrics<S: AsRef<str>>(names: &[S]) -> Result<Vec<MetricKind>, FundMetricsError> {
    if names.is_empty() {
        return Err(FundMetricsError::invalid("at least one metric is required"));
    }
    names.iter().map(|n| n.as_ref().parse()).collect()
}
