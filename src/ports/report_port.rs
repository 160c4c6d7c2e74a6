//! Result output port trait.

use crate::domain::engine::MetricTable;
use crate::domain::error::FundMetricsError;

/// Port for writing metric result tables.
pub trait ResultSink {
    fn write(&self, table: &MetricTable, output_path: &str) -> Result<(), FundMetricsError>;
}
