//! Sampling frequency inference.
//!
//! The annualization factor is picked from the smallest gap between the
//! first ten dates: a one-day gap means daily data, up to 30 days means
//! monthly, anything wider yearly. Irregular or gappy series can be
//! misclassified; callers that know better pass an explicit frequency.

use crate::domain::error::FundMetricsError;
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

const INFERENCE_HEAD: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Periods per year (the annualization factor `k`).
    pub fn units_per_year(self) -> f64 {
        match self {
            Frequency::Daily => 252.0,
            Frequency::Monthly => 12.0,
            Frequency::Yearly => 1.0,
        }
    }

    /// Infers the frequency from the head of an ascending date index. Fewer
    /// than two dates default to daily.
    pub fn infer(dates: &[NaiveDate]) -> Self {
        let head = &dates[..dates.len().min(INFERENCE_HEAD)];
        let min_gap = head
            .windows(2)
            .map(|w| (w[1] - w[0]).num_days())
            .min();

        match min_gap {
            None | Some(..=1) => Frequency::Daily,
            Some(2..=30) => Frequency::Monthly,
            Some(_) => Frequency::Yearly,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => write!(f, "daily"),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Yearly => write!(f, "yearly"),
        }
    }
}

impl FromStr for Frequency {
    type Err = FundMetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" | "annual" => Ok(Frequency::Yearly),
            other => Err(FundMetricsError::invalid(format!(
                "unknown frequency '{other}', expected daily, monthly or yearly"
            ))),
        }
    }
}
