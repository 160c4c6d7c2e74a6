//! Window policies and partitioning of an aligned date index.
//!
//! Policies, as written by callers:
//! - `roll.<n>`   overlapping windows of n rows, sliding one row at a time
//! - `hop.<n>`    disjoint windows of n rows (last one may be shorter)
//! - `hop.month`  disjoint calendar months
//! - `hop.year`   disjoint calendar years
//! - `YYYY-MM-DD[,YYYY-MM-DD...]`  breakpoints splitting the range into
//!   half-open intervals
//!
//! Every policy except rolling drops windows with fewer than `minimum_n` rows.

use crate::domain::error::FundMetricsError;
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

const VALID_FORMS: &str =
    "roll.<positive-int>, hop.<positive-int>, hop.month, hop.year, or ascending YYYY-MM-DD breakpoints";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowPolicy {
    Rolling(usize),
    DisjointFixed(usize),
    DisjointMonth,
    DisjointYear,
    Breakpoints(Vec<NaiveDate>),
}

impl WindowPolicy {
    /// Builds a breakpoint policy, requiring strictly ascending dates.
    pub fn breakpoints(dates: Vec<NaiveDate>) -> Result<Self, FundMetricsError> {
        if dates.is_empty() {
            return Err(FundMetricsError::invalid("at least one breakpoint is required"));
        }
        if let Some(w) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(FundMetricsError::invalid(format!(
                "breakpoints must be strictly ascending ({} followed by {})",
                w[0], w[1]
            )));
        }
        Ok(WindowPolicy::Breakpoints(dates))
    }

    /// Parses breakpoints given as separate date strings.
    pub fn from_breakpoint_strs<S: AsRef<str>>(dates: &[S]) -> Result<Self, FundMetricsError> {
        let parsed = dates
            .iter()
            .map(|s| parse_date(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::breakpoints(parsed)
    }

    /// Header for the window label column of a result table.
    pub fn label_header(&self) -> &'static str {
        match self {
            WindowPolicy::Rolling(_) => "Window end",
            WindowPolicy::DisjointFixed(_) => "Period",
            WindowPolicy::DisjointMonth => "Month",
            WindowPolicy::DisjointYear => "Year",
            WindowPolicy::Breakpoints(_) => "Interval",
        }
    }

    pub fn is_rolling(&self) -> bool {
        matches!(self, WindowPolicy::Rolling(_))
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, FundMetricsError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
        FundMetricsError::invalid(format!(
            "invalid window '{}' (expected {})",
            s.trim(),
            VALID_FORMS
        ))
    })
}

fn parse_width(s: &str, raw: &str) -> Result<usize, FundMetricsError> {
    match s.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(FundMetricsError::invalid(format!(
            "invalid window '{}': width must be a positive integer (expected {})",
            raw, VALID_FORMS
        ))),
    }
}

impl FromStr for WindowPolicy {
    type Err = FundMetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if let Some(rest) = raw.strip_prefix("roll.") {
            return Ok(WindowPolicy::Rolling(parse_width(rest, raw)?));
        }
        if let Some(rest) = raw.strip_prefix("hop.") {
            return match rest {
                "month" => Ok(WindowPolicy::DisjointMonth),
                "year" => Ok(WindowPolicy::DisjointYear),
                _ => Ok(WindowPolicy::DisjointFixed(parse_width(rest, raw)?)),
            };
        }
        if raw.is_empty() {
            return Err(FundMetricsError::invalid(format!(
                "empty window (expected {})",
                VALID_FORMS
            )));
        }
        let parts: Vec<&str> = raw.split(',').collect();
        Self::from_breakpoint_strs(&parts)
    }
}

impl fmt::Display for WindowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowPolicy::Rolling(n) => write!(f, "roll.{}", n),
            WindowPolicy::DisjointFixed(n) => write!(f, "hop.{}", n),
            WindowPolicy::DisjointMonth => write!(f, "hop.month"),
            WindowPolicy::DisjointYear => write!(f, "hop.year"),
            WindowPolicy::Breakpoints(dates) => {
                let strs: Vec<String> = dates.iter().map(|d| d.to_string()).collect();
                write!(f, "{}", strs.join(","))
            }
        }
    }
}

/// A contiguous block of rows of the aligned table, shared by all funds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpan {
    pub label: String,
    pub rows: Range<usize>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl WindowSpan {
    pub fn observation_count(&self) -> usize {
        self.rows.len()
    }
}

/// One fund's view of a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub fund: String,
    pub span: WindowSpan,
}

fn span(dates: &[NaiveDate], label: String, rows: Range<usize>) -> WindowSpan {
    WindowSpan {
        label,
        start_date: dates[rows.start],
        end_date: dates[rows.end - 1],
        rows,
    }
}

/// Splits row indices into runs of equal key. `dates` must be ascending.
fn group_runs<K: PartialEq>(dates: &[NaiveDate], key: impl Fn(NaiveDate) -> K) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..=dates.len() {
        if i == dates.len() || key(dates[i]) != key(dates[start]) {
            runs.push(start..i);
            start = i;
        }
    }
    runs
}

/// Partitions an ascending date index into windows under `policy`.
///
/// A width larger than the series yields no windows. Breakpoints must lie
/// strictly between the first and the last date.
pub fn partition(
    dates: &[NaiveDate],
    policy: &WindowPolicy,
    minimum_n: usize,
) -> Result<Vec<WindowSpan>, FundMetricsError> {
    let m = dates.len();
    if m == 0 {
        return Ok(Vec::new());
    }

    let spans: Vec<WindowSpan> = match policy {
        WindowPolicy::Rolling(width) => {
            if *width > m {
                return Ok(Vec::new());
            }
            return Ok((0..=m - width)
                .map(|j| span(dates, dates[j + width - 1].to_string(), j..j + width))
                .collect());
        }
        WindowPolicy::DisjointFixed(width) => {
            if *width > m {
                return Ok(Vec::new());
            }
            (0..m)
                .step_by(*width)
                .enumerate()
                .map(|(i, start)| span(dates, (i + 1).to_string(), start..(start + width).min(m)))
                .collect()
        }
        WindowPolicy::DisjointMonth => group_runs(dates, |d| (d.year(), d.month()))
            .into_iter()
            .map(|rows| {
                let label = dates[rows.start].format("%Y-%b").to_string();
                span(dates, label, rows)
            })
            .collect(),
        WindowPolicy::DisjointYear => group_runs(dates, |d| d.year())
            .into_iter()
            .map(|rows| span(dates, dates[rows.start].year().to_string(), rows))
            .collect(),
        WindowPolicy::Breakpoints(breaks) => breakpoint_spans(dates, breaks)?,
    };

    Ok(spans
        .into_iter()
        .filter(|s| s.observation_count() >= minimum_n)
        .collect())
}

fn breakpoint_spans(
    dates: &[NaiveDate],
    breaks: &[NaiveDate],
) -> Result<Vec<WindowSpan>, FundMetricsError> {
    let first = dates[0];
    let last = dates[dates.len() - 1];
    if let Some(w) = breaks.windows(2).find(|w| w[1] <= w[0]) {
        return Err(FundMetricsError::invalid(format!(
            "breakpoints must be strictly ascending ({} followed by {})",
            w[0], w[1]
        )));
    }
    if let Some(b) = breaks.iter().find(|b| **b <= first || **b >= last) {
        return Err(FundMetricsError::invalid(format!(
            "breakpoint {} is outside the data range ({} to {})",
            b, first, last
        )));
    }

    let mut bounds = Vec::with_capacity(breaks.len() + 2);
    bounds.push(0);
    bounds.extend(breaks.iter().map(|b| dates.partition_point(|d| d < b)));
    bounds.push(dates.len());

    let mut spans = Vec::with_capacity(breaks.len() + 1);
    for (i, pair) in bounds.windows(2).enumerate() {
        let rows = pair[0]..pair[1];
        if rows.is_empty() {
            continue;
        }
        let lower = if i == 0 { first } else { breaks[i - 1] };
        let label = if i == breaks.len() {
            format!("[{}, {}]", lower, last)
        } else {
            format!("[{}, {})", lower, breaks[i])
        };
        spans.push(span(dates, label, rows));
    }
    Ok(spans)
}

/// Expands shared spans into per-fund windows, ordered by fund then start.
pub fn windows_for_funds(funds: &[String], spans: &[WindowSpan]) -> Vec<Window> {
    funds
        .iter()
        .flat_map(|fund| {
            spans.iter().map(move |s| Window {
                fund: fund.clone(),
                span: s.clone(),
            })
        })
        .collect()
}
