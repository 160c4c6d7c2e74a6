//! Windowed metric evaluation.
//!
//! Pipeline for one request:
//! 1. derive gains from prices (if the table holds prices)
//! 2. drop dates where any required fund or benchmark value is missing
//! 3. infer the sampling frequency unless one is given
//! 4. partition the aligned dates into windows
//! 5. evaluate each requested metric per (fund, window)
//!
//! Everything a request can get wrong (unknown fund, benchmark metric without
//! a benchmark, malformed breakpoints) is rejected before any metric runs.
//! Rows come back ordered by fund, then window start.

use crate::domain::error::FundMetricsError;
use crate::domain::frequency::Frequency;
use crate::domain::metric::MetricKind;
use crate::domain::series::{GainTable, SeriesTable};
use crate::domain::window::{WindowPolicy, WindowSpan, partition, windows_for_funds};
use chrono::NaiveDate;
use tracing::{debug, warn};

pub const DEFAULT_MINIMUM_N: usize = 3;

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Funds to evaluate. Empty means every column except the benchmark.
    pub funds: Vec<String>,
    pub benchmark: Option<String>,
    pub metrics: Vec<MetricKind>,
    pub policy: WindowPolicy,
    pub minimum_n: usize,
    /// Overrides frequency inference when set.
    pub frequency: Option<Frequency>,
}

impl AnalysisRequest {
    pub fn new(metrics: Vec<MetricKind>, policy: WindowPolicy) -> Self {
        Self {
            funds: Vec::new(),
            benchmark: None,
            metrics,
            policy,
            minimum_n: DEFAULT_MINIMUM_N,
            frequency: None,
        }
    }

    pub fn with_funds(mut self, funds: Vec<String>) -> Self {
        self.funds = funds;
        self
    }

    pub fn with_benchmark(mut self, benchmark: impl Into<String>) -> Self {
        self.benchmark = Some(benchmark.into());
        self
    }

    pub fn with_minimum_n(mut self, minimum_n: usize) -> Self {
        self.minimum_n = minimum_n;
        self
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    fn needs_benchmark(&self) -> bool {
        self.metrics.iter().any(|m| m.requires_benchmark())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub fund: String,
    pub label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub observations: usize,
    /// One value per entry of `MetricTable::metrics`, NaN where undefined.
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricTable {
    pub label_header: String,
    pub metrics: Vec<MetricKind>,
    pub frequency: Frequency,
    pub rows: Vec<MetricRow>,
}

impl MetricTable {
    /// Column names: Fund, window label, Start date, End date, then one per metric.
    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec![
            "Fund".to_string(),
            self.label_header.clone(),
            "Start date".to_string(),
            "End date".to_string(),
        ];
        headers.extend(self.metrics.iter().map(|m| m.name().to_string()));
        headers
    }

    pub fn value(&self, row: usize, metric: MetricKind) -> Option<f64> {
        let col = self.metrics.iter().position(|m| *m == metric)?;
        self.rows.get(row).map(|r| r.values[col])
    }

    pub fn rows_for<'a>(&'a self, fund: &'a str) -> impl Iterator<Item = &'a MetricRow> + 'a {
        self.rows.iter().filter(move |r| r.fund == fund)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

struct Prepared {
    funds: Vec<String>,
    benchmark: Option<String>,
    gains: GainTable,
}

fn prepare(
    table: &SeriesTable,
    funds: &[String],
    benchmark: Option<&str>,
    needs_benchmark: bool,
) -> Result<Prepared, FundMetricsError> {
    if table.columns.is_empty() || table.dates.is_empty() {
        return Err(FundMetricsError::Precondition {
            reason: "no price or gain data supplied".into(),
        });
    }

    let funds: Vec<String> = if funds.is_empty() {
        table
            .fund_names()
            .into_iter()
            .filter(|f| Some(f.as_str()) != benchmark)
            .collect()
    } else {
        funds.to_vec()
    };
    if funds.is_empty() {
        return Err(FundMetricsError::Precondition {
            reason: "no funds to evaluate".into(),
        });
    }

    let benchmark = match (needs_benchmark, benchmark) {
        (true, None) => {
            return Err(FundMetricsError::invalid(
                "requested metrics require a benchmark but none was given",
            ));
        }
        (true, Some(b)) => Some(b.to_string()),
        (false, _) => None,
    };

    let mut required = funds.clone();
    if let Some(b) = &benchmark {
        if !required.contains(b) {
            required.push(b.clone());
        }
    }
    for name in &required {
        if table.column(name).is_none() {
            return Err(FundMetricsError::MissingColumn { name: name.clone() });
        }
    }

    let gains = table.align(&required)?;
    debug!(
        funds = funds.len(),
        rows = gains.row_count(),
        "aligned gain table"
    );
    if gains.row_count() == 0 {
        warn!("no dates with complete data for {}", required.join(", "));
    }

    Ok(Prepared {
        funds,
        benchmark,
        gains,
    })
}

fn evaluate_spans(
    prepared: &Prepared,
    metrics: &[MetricKind],
    spans: &[WindowSpan],
    frequency: Frequency,
    label_header: &str,
) -> Result<MetricTable, FundMetricsError> {
    let k = frequency.units_per_year();
    let bench = match &prepared.benchmark {
        Some(b) => prepared.gains.fund_gains(b),
        None => None,
    };

    let mut rows = Vec::with_capacity(prepared.funds.len() * spans.len());
    for window in windows_for_funds(&prepared.funds, spans) {
        let all = prepared
            .gains
            .fund_gains(&window.fund)
            .ok_or_else(|| FundMetricsError::MissingColumn {
                name: window.fund.clone(),
            })?;
        let rows_range = window.span.rows.clone();
        let gains = &all[rows_range.clone()];

        let values = metrics
            .iter()
            .map(|m| {
                let b = if m.requires_benchmark() {
                    bench.map(|b| &b[rows_range.clone()])
                } else {
                    None
                };
                m.evaluate(gains, b, k)
            })
            .collect::<Result<Vec<f64>, _>>()?;

        rows.push(MetricRow {
            fund: window.fund,
            label: window.span.label,
            start_date: window.span.start_date,
            end_date: window.span.end_date,
            observations: gains.len(),
            values,
        });
    }

    Ok(MetricTable {
        label_header: label_header.to_string(),
        metrics: metrics.to_vec(),
        frequency,
        rows,
    })
}

/// Evaluates the requested metrics per fund per window.
pub fn run(table: &SeriesTable, request: &AnalysisRequest) -> Result<MetricTable, FundMetricsError> {
    if request.metrics.is_empty() {
        return Err(FundMetricsError::invalid("at least one metric is required"));
    }

    let prepared = prepare(
        table,
        &request.funds,
        request.benchmark.as_deref(),
        request.needs_benchmark(),
    )?;

    let frequency = request
        .frequency
        .unwrap_or_else(|| Frequency::infer(&prepared.gains.dates));
    debug!(%frequency, k = frequency.units_per_year(), "sampling frequency");

    let spans = partition(&prepared.gains.dates, &request.policy, request.minimum_n)?;
    debug!(policy = %request.policy, windows = spans.len(), "partitioned");

    evaluate_spans(
        &prepared,
        &request.metrics,
        &spans,
        frequency,
        request.policy.label_header(),
    )
}

/// Evaluates every applicable catalog metric over the full aligned range,
/// one row per fund. Benchmark metrics are included only when a benchmark is
/// given.
pub fn summarize(
    table: &SeriesTable,
    funds: &[String],
    benchmark: Option<&str>,
    frequency: Option<Frequency>,
) -> Result<MetricTable, FundMetricsError> {
    let metrics: Vec<MetricKind> = MetricKind::ALL
        .into_iter()
        .filter(|m| benchmark.is_some() || !m.requires_benchmark())
        .collect();

    let prepared = prepare(table, funds, benchmark, benchmark.is_some())?;
    let dates = &prepared.gains.dates;
    let frequency = frequency.unwrap_or_else(|| Frequency::infer(dates));

    let spans = match (dates.first(), dates.last()) {
        (Some(&start_date), Some(&end_date)) => vec![WindowSpan {
            label: "All".to_string(),
            rows: 0..dates.len(),
            start_date,
            end_date,
        }],
        _ => Vec::new(),
    };

    evaluate_spans(&prepared, &metrics, &spans, frequency, "Period")
}
