#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use fundmetrics::domain::error::FundMetricsError;
use fundmetrics::domain::series::{SeriesTable, TimeSeries, ValueKind};
use fundmetrics::ports::data_port::PriceSource;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;

pub struct MockPriceSource {
    pub kind: ValueKind,
    pub series: HashMap<String, TimeSeries>,
    pub errors: HashMap<String, String>,
    /// Fund lists passed to `load`, in call order.
    pub requested: RefCell<Vec<Vec<String>>>,
}

impl MockPriceSource {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            series: HashMap::new(),
            errors: HashMap::new(),
            requested: RefCell::new(Vec::new()),
        }
    }

    pub fn with_series(mut self, series: TimeSeries) -> Self {
        self.series.insert(series.name.clone(), series);
        self
    }

    pub fn with_error(mut self, fund: &str, reason: &str) -> Self {
        self.errors.insert(fund.to_string(), reason.to_string());
        self
    }
}

impl PriceSource for MockPriceSource {
    fn load(
        &self,
        funds: &[String],
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<SeriesTable, FundMetricsError> {
        self.requested.borrow_mut().push(funds.to_vec());

        let names = if funds.is_empty() {
            self.list_funds()?
        } else {
            funds.to_vec()
        };

        let mut selected = Vec::new();
        for name in &names {
            if let Some(reason) = self.errors.get(name) {
                return Err(FundMetricsError::DataSource {
                    reason: reason.clone(),
                });
            }
            let series = self
                .series
                .get(name)
                .ok_or_else(|| FundMetricsError::MissingColumn { name: name.clone() })?;
            selected.push(series.clone());
        }
        Ok(SeriesTable::from_series(self.kind, selected).between(from, to))
    }

    fn list_funds(&self) -> Result<Vec<String>, FundMetricsError> {
        let mut names: Vec<String> = self.series.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Consecutive calendar days starting at `start`.
pub fn daily_dates(start: &str, count: usize) -> Vec<NaiveDate> {
    let start = date(start);
    (0..count).map(|i| start + Duration::days(i as i64)).collect()
}

pub fn series(name: &str, dates: &[NaiveDate], values: &[f64]) -> TimeSeries {
    TimeSeries::new(
        name,
        dates.iter().copied().zip(values.iter().copied()).collect(),
    )
    .unwrap()
}

pub fn daily_series(name: &str, start: &str, values: &[f64]) -> TimeSeries {
    series(name, &daily_dates(start, values.len()), values)
}

/// Deterministic gain pattern with both signs, offset per fund.
pub fn wavy_gains(count: usize, offset: usize) -> Vec<f64> {
    (0..count)
        .map(|i| 0.01 * (((i + offset) % 7) as f64 - 3.0) / 3.0)
        .collect()
}

/// Compounds gains into a price path starting at `start`.
pub fn prices_from_gains(start: f64, gains: &[f64]) -> Vec<f64> {
    let mut prices = Vec::with_capacity(gains.len() + 1);
    prices.push(start);
    let mut level = start;
    for g in gains {
        level *= 1.0 + g;
        prices.push(level);
    }
    prices
}

pub fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Renders a wide CSV (`date,<fund>...`) from series sharing one date index.
pub fn wide_csv(dates: &[NaiveDate], columns: &[(&str, Vec<f64>)]) -> String {
    let mut out = String::from("date");
    for (name, _) in columns {
        out.push(',');
        out.push_str(name);
    }
    out.push('\n');
    for (i, d) in dates.iter().enumerate() {
        out.push_str(&d.to_string());
        for (_, values) in columns {
            out.push(',');
            out.push_str(&values[i].to_string());
        }
        out.push('\n');
    }
    out
}
