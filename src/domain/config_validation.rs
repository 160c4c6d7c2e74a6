//! Configuration validation.
//!
//! Checks every `[data]` and `[analysis]` key before any data is loaded.

use crate::domain::error::FundMetricsError;
use crate::domain::frequency::Frequency;
use crate::domain::metric::{MetricKind, parse_metrics};
use crate::domain::window::WindowPolicy;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::str::FromStr;

const SOURCE_KEYS: [&str; 3] = ["prices", "gains", "directory"];

/// Checks the `[data]` section alone (source and date range).
pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), FundMetricsError> {
    validate_source(config)?;
    validate_dates(config)
}

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), FundMetricsError> {
    validate_data_config(config)?;
    let metrics = validate_metrics(config)?;
    validate_window(config)?;
    validate_minimum_n(config)?;
    validate_frequency(config)?;
    validate_benchmark(config, &metrics)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> FundMetricsError {
    FundMetricsError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .filter(|s| !s.trim().is_empty())
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), FundMetricsError> {
    let present: Vec<&str> = SOURCE_KEYS
        .iter()
        .copied()
        .filter(|key| non_empty(config, "data", key).is_some())
        .collect();

    match present.len() {
        0 => Err(FundMetricsError::ConfigMissing {
            section: "data".to_string(),
            key: "prices".to_string(),
        }),
        1 => Ok(()),
        _ => Err(invalid(
            "data",
            present[1],
            format!("only one of {} may be set", SOURCE_KEYS.join(", ")),
        )),
    }
}

/// Parses an optional `YYYY-MM-DD` value from `[data]`.
pub fn parse_config_date(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, FundMetricsError> {
    match non_empty(config, "data", key) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| invalid("data", key, format!("invalid {key} format, expected YYYY-MM-DD"))),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), FundMetricsError> {
    let from = parse_config_date(config, "from")?;
    let to = parse_config_date(config, "to")?;
    match (from, to) {
        (Some(from), Some(to)) if from >= to => {
            Err(invalid("data", "from", "from must be before to"))
        }
        _ => Ok(()),
    }
}

fn validate_metrics(config: &dyn ConfigPort) -> Result<Vec<MetricKind>, FundMetricsError> {
    let names = config.get_list("analysis", "metrics");
    if names.is_empty() {
        return Err(FundMetricsError::ConfigMissing {
            section: "analysis".to_string(),
            key: "metrics".to_string(),
        });
    }
    parse_metrics(&names).map_err(|e| invalid("analysis", "metrics", e.to_string()))
}

fn validate_window(config: &dyn ConfigPort) -> Result<(), FundMetricsError> {
    match non_empty(config, "analysis", "window") {
        None => Err(FundMetricsError::ConfigMissing {
            section: "analysis".to_string(),
            key: "window".to_string(),
        }),
        Some(s) => WindowPolicy::from_str(&s)
            .map(|_| ())
            .map_err(|e| invalid("analysis", "window", e.to_string())),
    }
}

fn validate_minimum_n(config: &dyn ConfigPort) -> Result<(), FundMetricsError> {
    if config.get_string("analysis", "minimum_n").is_none() {
        return Ok(());
    }
    let value = config.get_int("analysis", "minimum_n", 0);
    if value < 1 {
        return Err(invalid(
            "analysis",
            "minimum_n",
            "minimum_n must be an integer of at least 1",
        ));
    }
    Ok(())
}

fn validate_frequency(config: &dyn ConfigPort) -> Result<(), FundMetricsError> {
    match non_empty(config, "analysis", "frequency") {
        None => Ok(()),
        Some(s) => Frequency::from_str(&s)
            .map(|_| ())
            .map_err(|e| invalid("analysis", "frequency", e.to_string())),
    }
}

fn validate_benchmark(config: &dyn ConfigPort, metrics: &[MetricKind]) -> Result<(), FundMetricsError> {
    let needs = metrics.iter().find(|m| m.requires_benchmark());
    match (needs, non_empty(config, "data", "benchmark")) {
        (Some(metric), None) => Err(invalid(
            "data",
            "benchmark",
            format!("metric '{metric}' requires a benchmark"),
        )),
        _ => Ok(()),
    }
}
