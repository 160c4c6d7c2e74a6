//! CSV file data adapter.
//!
//! Two layouts are supported:
//! - a directory with one `<FUND>.csv` per fund, holding a `date` column and a
//!   value column (`adjusted`, `adj close`, `close`, `price`, `value` or
//!   `gain`; otherwise the second column)
//! - a single wide file `date,<fund>,<fund>,...`
//!
//! Empty cells and `NA`/`NaN` are treated as missing.

use crate::domain::error::FundMetricsError;
use crate::domain::series::{SeriesColumn, SeriesTable, TimeSeries, ValueKind};
use crate::ports::data_port::PriceSource;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const VALUE_COLUMNS: [&str; 6] = ["adjusted", "adj close", "close", "price", "value", "gain"];

#[derive(Debug, Clone)]
enum Layout {
    PerFund(PathBuf),
    Wide(PathBuf),
}

#[derive(Debug)]
pub struct CsvAdapter {
    layout: Layout,
    kind: ValueKind,
}

fn data_err(reason: impl Into<String>) -> FundMetricsError {
    FundMetricsError::DataSource {
        reason: reason.into(),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, FundMetricsError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| data_err(format!("invalid date '{}': {}", raw, e)))
}

fn parse_cell(raw: &str) -> Result<Option<f64>, FundMetricsError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("na") || trimmed.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|e| data_err(format!("invalid value '{}': {}", raw, e)))
}

fn read_file(path: &Path) -> Result<String, FundMetricsError> {
    fs::read_to_string(path).map_err(|e| data_err(format!("failed to read {}: {}", path.display(), e)))
}

impl CsvAdapter {
    /// One `<FUND>.csv` file per fund under `base_path`.
    pub fn per_fund(base_path: PathBuf, kind: ValueKind) -> Self {
        Self {
            layout: Layout::PerFund(base_path),
            kind,
        }
    }

    /// A single file with a date column and one column per fund.
    pub fn wide(path: PathBuf, kind: ValueKind) -> Self {
        Self {
            layout: Layout::Wide(path),
            kind,
        }
    }

    fn fund_path(base_path: &Path, fund: &str) -> PathBuf {
        base_path.join(format!("{}.csv", fund))
    }

    fn read_fund_file(&self, base_path: &Path, fund: &str) -> Result<TimeSeries, FundMetricsError> {
        let path = Self::fund_path(base_path, fund);
        let content = read_file(&path)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| data_err(format!("CSV parse error in {}: {}", path.display(), e)))?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();
        let date_col = headers.iter().position(|h| h == "date").unwrap_or(0);
        let value_col = VALUE_COLUMNS
            .iter()
            .find_map(|name| headers.iter().position(|h| h == name))
            .or_else(|| (0..headers.len()).find(|&i| i != date_col))
            .ok_or_else(|| data_err(format!("{}: no value column", path.display())))?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record =
                result.map_err(|e| data_err(format!("CSV parse error in {}: {}", path.display(), e)))?;
            let date = parse_date(
                record
                    .get(date_col)
                    .ok_or_else(|| data_err("missing date column"))?,
            )?;
            let value = parse_cell(
                record
                    .get(value_col)
                    .ok_or_else(|| data_err("missing value column"))?,
            )?;
            if let Some(v) = value {
                points.push((date, v));
            }
        }

        points.sort_by_key(|(d, _)| *d);
        TimeSeries::new(fund, points).map_err(|e| data_err(format!("{}: {}", path.display(), e)))
    }

    /// Reads a wide table. Rows are sorted by date; a repeated date is an error.
    pub fn read_wide(path: &Path, kind: ValueKind) -> Result<SeriesTable, FundMetricsError> {
        let content = read_file(path)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| data_err(format!("CSV parse error in {}: {}", path.display(), e)))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.len() < 2 {
            return Err(data_err(format!(
                "{}: expected a date column and at least one fund column",
                path.display()
            )));
        }

        let mut rows: Vec<(NaiveDate, Vec<Option<f64>>)> = Vec::new();
        for result in rdr.records() {
            let record =
                result.map_err(|e| data_err(format!("CSV parse error in {}: {}", path.display(), e)))?;
            let date = parse_date(record.get(0).unwrap_or_default())?;
            let values = (1..headers.len())
                .map(|i| parse_cell(record.get(i).unwrap_or_default()))
                .collect::<Result<Vec<_>, _>>()?;
            rows.push((date, values));
        }

        rows.sort_by_key(|(d, _)| *d);
        if let Some(w) = rows.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(data_err(format!("{}: duplicate date {}", path.display(), w[0].0)));
        }

        let columns = headers[1..]
            .iter()
            .enumerate()
            .map(|(i, name)| SeriesColumn {
                name: name.clone(),
                values: rows.iter().map(|(_, v)| v[i]).collect(),
            })
            .collect();

        Ok(SeriesTable {
            kind,
            dates: rows.iter().map(|(d, _)| *d).collect(),
            columns,
        })
    }
}

impl PriceSource for CsvAdapter {
    fn load(
        &self,
        funds: &[String],
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<SeriesTable, FundMetricsError> {
        let table = match &self.layout {
            Layout::PerFund(base_path) => {
                let names = if funds.is_empty() {
                    self.list_funds()?
                } else {
                    funds.to_vec()
                };
                let series = names
                    .iter()
                    .map(|f| self.read_fund_file(base_path, f))
                    .collect::<Result<Vec<_>, _>>()?;
                SeriesTable::from_series(self.kind, series)
            }
            Layout::Wide(path) => {
                let mut table = Self::read_wide(path, self.kind)?;
                if !funds.is_empty() {
                    if let Some(missing) = funds.iter().find(|f| table.column(f).is_none()) {
                        return Err(FundMetricsError::MissingColumn {
                            name: missing.clone(),
                        });
                    }
                    table.columns.retain(|c| funds.contains(&c.name));
                }
                table
            }
        };

        let table = table.between(from, to);
        if table.dates.is_empty() {
            warn!("no rows between {:?} and {:?}", from, to);
        }
        debug!(
            funds = table.columns.len(),
            rows = table.dates.len(),
            "loaded CSV data"
        );
        Ok(table)
    }

    fn list_funds(&self) -> Result<Vec<String>, FundMetricsError> {
        match &self.layout {
            Layout::PerFund(base_path) => {
                let entries = fs::read_dir(base_path).map_err(|e| {
                    data_err(format!(
                        "failed to read directory {}: {}",
                        base_path.display(),
                        e
                    ))
                })?;

                let mut funds = Vec::new();
                for entry in entries {
                    let entry = entry.map_err(|e| data_err(format!("directory entry error: {}", e)))?;
                    let name = entry.file_name();
                    let name_str = name.to_string_lossy();
                    if let Some(fund) = name_str.strip_suffix(".csv") {
                        funds.push(fund.to_string());
                    }
                }
                funds.sort();
                Ok(funds)
            }
            Layout::Wide(path) => {
                let content = read_file(path)?;
                let mut rdr = csv::Reader::from_reader(content.as_bytes());
                let headers = rdr
                    .headers()
                    .map_err(|e| data_err(format!("CSV parse error in {}: {}", path.display(), e)))?;
                Ok(headers.iter().skip(1).map(|h| h.trim().to_string()).collect())
            }
        }
    }
}
