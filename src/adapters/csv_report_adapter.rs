//! CSV result table writer.

use crate::domain::engine::MetricTable;
use crate::domain::error::FundMetricsError;
use crate::ports::report_port::ResultSink;
use std::fs::File;
use std::io::Write;

pub struct CsvResultWriter;

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NA".to_string()
    } else {
        value.to_string()
    }
}

fn csv_err(e: csv::Error) -> FundMetricsError {
    FundMetricsError::Io(std::io::Error::other(e))
}

impl CsvResultWriter {
    /// Writes `table` as CSV to any writer. NaN cells are written as `NA`.
    pub fn write_to<W: Write>(table: &MetricTable, writer: W) -> Result<(), FundMetricsError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(table.headers()).map_err(csv_err)?;

        for row in &table.rows {
            let mut record = vec![
                row.fund.clone(),
                row.label.clone(),
                row.start_date.to_string(),
                row.end_date.to_string(),
            ];
            record.extend(row.values.iter().map(|v| format_value(*v)));
            wtr.write_record(&record).map_err(csv_err)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

impl ResultSink for CsvResultWriter {
    fn write(&self, table: &MetricTable, output_path: &str) -> Result<(), FundMetricsError> {
        let file = File::create(output_path)?;
        Self::write_to(table, file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::engine::MetricRow;
    use crate::domain::frequency::Frequency;
    use crate::domain::metric::MetricKind;
    use chrono::NaiveDate;

    fn sample_table() -> MetricTable {
        MetricTable {
            label_header: "Year".to_string(),
            metrics: vec![MetricKind::Growth, MetricKind::Sharpe],
            frequency: Frequency::Daily,
            rows: vec![MetricRow {
                fund: "SPY".to_string(),
                label: "2020".to_string(),
                start_date: NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
                observations: 253,
                values: vec![0.25, f64::NAN],
            }],
        }
    }

    #[test]
    fn writes_header_and_rows() {
        let mut buf = Vec::new();
        CsvResultWriter::write_to(&sample_table(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Fund,Year,Start date,End date,growth,sharpe");
        assert_eq!(lines[1], "SPY,2020,2020-01-02,2020-12-31,0.25,NA");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn write_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        CsvResultWriter
            .write(&sample_table(), path.to_str().unwrap())
            .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Fund,Year"));
    }

    #[test]
    fn write_to_missing_directory_fails() {
        let result = CsvResultWriter.write(&sample_table(), "/nonexistent/dir/out.csv");
        assert!(matches!(result, Err(FundMetricsError::Io(_))));
    }
}
