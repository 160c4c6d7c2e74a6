//! Time series containers.
//!
//! - `TimeSeries`: one fund's (date, value) pairs, dates strictly increasing.
//! - `SeriesTable`: a shared date index with one optional value per fund per
//!   date, as handed over by a price source.
//! - `GainTable`: the aligned, complete-case table of per-period gains that
//!   windowing and metric evaluation operate on.

use crate::domain::error::FundMetricsError;
use crate::domain::transform::pdiff;
use chrono::NaiveDate;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub name: String,
    points: Vec<(NaiveDate, f64)>,
}

impl TimeSeries {
    pub fn new(
        name: impl Into<String>,
        points: Vec<(NaiveDate, f64)>,
    ) -> Result<Self, FundMetricsError> {
        let name = name.into();
        if let Some(w) = points.windows(2).find(|w| w[1].0 <= w[0].0) {
            return Err(FundMetricsError::invalid(format!(
                "{}: dates must be strictly increasing ({} followed by {})",
                name, w[0].0, w[1].0
            )));
        }
        Ok(Self { name, points })
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Whether the cells of a [`SeriesTable`] hold prices or per-period gains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Prices,
    Gains,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesTable {
    pub kind: ValueKind,
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<SeriesColumn>,
}

impl SeriesTable {
    /// Builds a table over the union of all series' dates. A fund without an
    /// observation on a date gets `None` there.
    pub fn from_series(kind: ValueKind, series: Vec<TimeSeries>) -> Self {
        let dates: Vec<NaiveDate> = series
            .iter()
            .flat_map(|s| s.points.iter().map(|(d, _)| *d))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let columns = series
            .into_iter()
            .map(|s| {
                let mut values = vec![None; dates.len()];
                for (date, value) in s.points {
                    if let Ok(row) = dates.binary_search(&date) {
                        values[row] = Some(value);
                    }
                }
                SeriesColumn {
                    name: s.name,
                    values,
                }
            })
            .collect();

        Self {
            kind,
            dates,
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&SeriesColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn fund_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Keeps only rows with `from <= date <= to`.
    pub fn between(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        let keep: Vec<bool> = self
            .dates
            .iter()
            .map(|d| from.is_none_or(|f| *d >= f) && to.is_none_or(|t| *d <= t))
            .collect();
        let pick = |values: &[Option<f64>]| -> Vec<Option<f64>> {
            values
                .iter()
                .zip(&keep)
                .filter(|(_, k)| **k)
                .map(|(v, _)| *v)
                .collect()
        };
        Self {
            kind: self.kind,
            dates: self
                .dates
                .iter()
                .zip(&keep)
                .filter(|(_, k)| **k)
                .map(|(d, _)| *d)
                .collect(),
            columns: self
                .columns
                .iter()
                .map(|c| SeriesColumn {
                    name: c.name.clone(),
                    values: pick(&c.values),
                })
                .collect(),
        }
    }

    /// Gain columns for `names`, one row shorter than the price table when
    /// this table holds prices. A gain is only defined where both adjacent
    /// prices are present.
    fn gain_columns(
        &self,
        names: &[String],
    ) -> Result<(Vec<NaiveDate>, Vec<Vec<Option<f64>>>), FundMetricsError> {
        if self.kind == ValueKind::Prices && self.dates.len() < 2 {
            return Err(FundMetricsError::Precondition {
                reason: format!(
                    "at least two price rows are needed to derive gains, have {}",
                    self.dates.len()
                ),
            });
        }

        let mut out = Vec::with_capacity(names.len());
        for name in names {
            let column = self
                .column(name)
                .ok_or_else(|| FundMetricsError::MissingColumn { name: name.clone() })?;
            let values = match self.kind {
                ValueKind::Gains => column.values.clone(),
                ValueKind::Prices => {
                    let dense: Vec<f64> = column
                        .values
                        .iter()
                        .map(|v| v.unwrap_or(f64::NAN))
                        .collect();
                    pdiff(&dense, 1)?
                        .into_iter()
                        .map(|g| if g.is_nan() { None } else { Some(g) })
                        .collect()
                }
            };
            out.push(values);
        }

        let dates = match self.kind {
            ValueKind::Gains => self.dates.clone(),
            ValueKind::Prices => self.dates[1..].to_vec(),
        };
        Ok((dates, out))
    }

    /// Derives gains (if this table holds prices) for `names` and drops every
    /// row where any of those columns is missing.
    pub fn align(&self, names: &[String]) -> Result<GainTable, FundMetricsError> {
        let (dates, columns) = self.gain_columns(names)?;

        let complete: Vec<usize> = (0..dates.len())
            .filter(|&row| columns.iter().all(|c| c[row].is_some_and(|v| !v.is_nan())))
            .collect();

        Ok(GainTable {
            dates: complete.iter().map(|&row| dates[row]).collect(),
            funds: names.to_vec(),
            gains: columns
                .iter()
                .map(|c| complete.iter().filter_map(|&row| c[row]).collect())
                .collect(),
        })
    }
}

/// Aligned per-period gains: `gains[f][row]` is fund `funds[f]` on `dates[row]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GainTable {
    pub dates: Vec<NaiveDate>,
    pub funds: Vec<String>,
    pub gains: Vec<Vec<f64>>,
}

impl GainTable {
    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    pub fn fund_gains(&self, name: &str) -> Option<&[f64]> {
        self.funds
            .iter()
            .position(|f| f == name)
            .map(|i| self.gains[i].as_slice())
    }
}
