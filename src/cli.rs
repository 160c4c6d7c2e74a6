//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvResultWriter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{
    parse_config_date, validate_analysis_config, validate_data_config,
};
use crate::domain::engine::{self, AnalysisRequest, DEFAULT_MINIMUM_N, MetricTable};
use crate::domain::error::FundMetricsError;
use crate::domain::frequency::Frequency;
use crate::domain::metric::parse_metrics;
use crate::domain::series::{SeriesTable, ValueKind};
use crate::domain::transform;
use crate::domain::window::WindowPolicy;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceSource;
use crate::ports::report_port::ResultSink;

#[derive(Parser, Debug)]
#[command(name = "fundmetrics", about = "Windowed performance metrics for funds")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute metrics per fund per window
    Metrics {
        #[arg(short, long)]
        config: PathBuf,
        /// roll.N, hop.N, hop.month, hop.year or comma-separated breakpoint dates
        #[arg(short, long)]
        window: Option<String>,
        /// Metric name; repeat for several
        #[arg(short, long = "metric")]
        metrics: Vec<String>,
        #[arg(short, long)]
        benchmark: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Evaluate every metric over the full period
    Summary {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        benchmark: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print a transformed series from a wide CSV file
    Transform {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        fund: String,
        #[arg(long, value_enum)]
        op: TransformOp,
        #[arg(long, default_value_t = 1)]
        lag: usize,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List funds visible to the configured data source
    ListFunds {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformOp {
    Diff,
    Ratio,
    Pdiff,
    Pchange,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Metrics {
            config,
            window,
            metrics,
            benchmark,
            output,
            dry_run,
        } => {
            let overrides = Overrides {
                window,
                metrics,
                benchmark,
                output,
            };
            run_metrics(&config, &overrides, dry_run)
        }
        Command::Summary {
            config,
            benchmark,
            output,
        } => {
            let overrides = Overrides {
                benchmark,
                output,
                ..Overrides::default()
            };
            run_summary(&config, &overrides)
        }
        Command::Transform {
            input,
            fund,
            op,
            lag,
        } => run_transform(&input, &fund, op, lag),
        Command::Validate { config } => run_validate(&config),
        Command::ListFunds { config } => run_list_funds(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, FundMetricsError> {
    FileConfigAdapter::from_file(path).map_err(|e| FundMetricsError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub window: Option<String>,
    pub metrics: Vec<String>,
    pub benchmark: Option<String>,
    pub output: Option<PathBuf>,
}

fn key(section: &str, name: &str) -> (String, String) {
    (section.to_string(), name.to_string())
}

/// A config view where command-line overrides shadow file values.
pub struct OverlayConfig<'a> {
    base: &'a dyn ConfigPort,
    values: HashMap<(String, String), String>,
}

impl<'a> OverlayConfig<'a> {
    pub fn new(base: &'a dyn ConfigPort, overrides: &Overrides) -> Self {
        let mut values = HashMap::new();
        if let Some(window) = &overrides.window {
            values.insert(key("analysis", "window"), window.clone());
        }
        if !overrides.metrics.is_empty() {
            values.insert(key("analysis", "metrics"), overrides.metrics.join(","));
        }
        if let Some(benchmark) = &overrides.benchmark {
            values.insert(key("data", "benchmark"), benchmark.clone());
        }
        if let Some(output) = &overrides.output {
            values.insert(key("output", "path"), output.display().to_string());
        }
        Self { base, values }
    }

    fn lookup(&self, section: &str, key_name: &str) -> Option<&String> {
        self.values.get(&key(section, key_name))
    }
}

impl ConfigPort for OverlayConfig<'_> {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        match self.lookup(section, key) {
            Some(v) => Some(v.clone()),
            None => self.base.get_string(section, key),
        }
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        match self.lookup(section, key) {
            Some(v) => v.trim().parse().unwrap_or(default),
            None => self.base.get_int(section, key, default),
        }
    }
}

fn config_string(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn config_invalid(section: &str, key: &str, err: FundMetricsError) -> FundMetricsError {
    FundMetricsError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: err.to_string(),
    }
}

/// Builds an analysis request from a validated config.
pub fn build_request(config: &dyn ConfigPort) -> Result<AnalysisRequest, FundMetricsError> {
    let metrics = parse_metrics(&config.get_list("analysis", "metrics"))
        .map_err(|e| config_invalid("analysis", "metrics", e))?;

    let window = config_string(config, "analysis", "window").ok_or_else(|| {
        FundMetricsError::ConfigMissing {
            section: "analysis".into(),
            key: "window".into(),
        }
    })?;
    let policy =
        WindowPolicy::from_str(&window).map_err(|e| config_invalid("analysis", "window", e))?;

    let minimum_n = config.get_int("analysis", "minimum_n", DEFAULT_MINIMUM_N as i64);
    let minimum_n = usize::try_from(minimum_n)
        .ok()
        .filter(|&n| n >= 1)
        .ok_or_else(|| FundMetricsError::ConfigInvalid {
            section: "analysis".into(),
            key: "minimum_n".into(),
            reason: "minimum_n must be at least 1".into(),
        })?;

    let mut request = AnalysisRequest::new(metrics, policy)
        .with_funds(config.get_list("data", "funds"))
        .with_minimum_n(minimum_n);

    if let Some(benchmark) = config_string(config, "data", "benchmark") {
        request = request.with_benchmark(benchmark);
    }
    if let Some(frequency) = config_string(config, "analysis", "frequency") {
        let frequency = Frequency::from_str(&frequency)
            .map_err(|e| config_invalid("analysis", "frequency", e))?;
        request = request.with_frequency(frequency);
    }
    Ok(request)
}

/// Builds the CSV data source named in `[data]`.
pub fn build_source(config: &dyn ConfigPort) -> Result<CsvAdapter, FundMetricsError> {
    if let Some(path) = config_string(config, "data", "prices") {
        return Ok(CsvAdapter::wide(PathBuf::from(path), ValueKind::Prices));
    }
    if let Some(path) = config_string(config, "data", "gains") {
        return Ok(CsvAdapter::wide(PathBuf::from(path), ValueKind::Gains));
    }
    if let Some(path) = config_string(config, "data", "directory") {
        return Ok(CsvAdapter::per_fund(PathBuf::from(path), ValueKind::Prices));
    }
    Err(FundMetricsError::ConfigMissing {
        section: "data".into(),
        key: "prices".into(),
    })
}

/// Funds to request from the source: the configured funds plus the
/// benchmark, or everything when no funds are configured.
pub fn funds_to_load(funds: &[String], benchmark: Option<&str>) -> Vec<String> {
    if funds.is_empty() {
        return Vec::new();
    }
    let mut names = funds.to_vec();
    if let Some(b) = benchmark {
        if !names.iter().any(|f| f == b) {
            names.push(b.to_string());
        }
    }
    names
}

pub fn load_table(
    source: &dyn PriceSource,
    config: &dyn ConfigPort,
    funds: &[String],
    benchmark: Option<&str>,
) -> Result<SeriesTable, FundMetricsError> {
    let from = parse_config_date(config, "from")?;
    let to = parse_config_date(config, "to")?;
    source.load(&funds_to_load(funds, benchmark), from, to)
}

fn write_table(table: &MetricTable, output: Option<&str>) -> Result<(), FundMetricsError> {
    match output {
        Some(path) => {
            CsvResultWriter.write(table, path)?;
            eprintln!("Results written to {path}");
            Ok(())
        }
        None => CsvResultWriter::write_to(table, io::stdout().lock()),
    }
}

fn run_metrics(
    config_path: &Path,
    overrides: &Overrides,
    dry_run: bool,
) -> Result<(), FundMetricsError> {
    eprintln!("Loading config from {}", config_path.display());
    let file_config = load_config(config_path)?;
    let config = OverlayConfig::new(&file_config, overrides);

    validate_analysis_config(&config)?;
    let request = build_request(&config)?;
    let source = build_source(&config)?;

    if dry_run {
        print_request(&request);
        eprintln!("Dry run complete, no data loaded");
        return Ok(());
    }

    let table = load_table(
        &source,
        &config,
        &request.funds,
        request.benchmark.as_deref(),
    )?;
    eprintln!(
        "Loaded {} funds over {} dates",
        table.columns.len(),
        table.dates.len()
    );

    let result = engine::run(&table, &request)?;
    eprintln!(
        "Computed {} rows ({} data, k = {})",
        result.rows.len(),
        result.frequency,
        result.frequency.units_per_year()
    );
    if result.is_empty() {
        eprintln!("warning: no window met the minimum of {} observations", request.minimum_n);
    }

    write_table(&result, config_string(&config, "output", "path").as_deref())
}

fn print_request(request: &AnalysisRequest) {
    eprintln!("\nAnalysis request:");
    if request.funds.is_empty() {
        eprintln!("  Funds:     (all)");
    } else {
        eprintln!("  Funds:     {}", request.funds.join(", "));
    }
    eprintln!(
        "  Benchmark: {}",
        request.benchmark.as_deref().unwrap_or("(none)")
    );
    let names: Vec<&str> = request.metrics.iter().map(|m| m.name()).collect();
    eprintln!("  Metrics:   {}", names.join(", "));
    eprintln!("  Window:    {}", request.policy);
    eprintln!("  Minimum n: {}", request.minimum_n);
    if let Some(frequency) = request.frequency {
        eprintln!("  Frequency: {frequency}");
    }
}

fn run_summary(config_path: &Path, overrides: &Overrides) -> Result<(), FundMetricsError> {
    eprintln!("Loading config from {}", config_path.display());
    let file_config = load_config(config_path)?;
    let config = OverlayConfig::new(&file_config, overrides);
    validate_data_config(&config)?;

    let funds = config.get_list("data", "funds");
    let benchmark = config_string(&config, "data", "benchmark");
    let frequency = config_string(&config, "analysis", "frequency")
        .map(|f| Frequency::from_str(&f).map_err(|e| config_invalid("analysis", "frequency", e)))
        .transpose()?;

    let source = build_source(&config)?;
    let table = load_table(&source, &config, &funds, benchmark.as_deref())?;
    let result = engine::summarize(&table, &funds, benchmark.as_deref(), frequency)?;
    eprintln!(
        "Summarized {} funds ({} data)",
        result.rows.len(),
        result.frequency
    );

    write_table(&result, config_string(&config, "output", "path").as_deref())
}

/// Applies `op` to a value column, returning (date, value) pairs keyed by the
/// later date of each lagged pair. Missing cells are skipped.
pub fn transform_column(
    table: &SeriesTable,
    fund: &str,
    op: TransformOp,
    lag: usize,
) -> Result<Vec<(NaiveDate, f64)>, FundMetricsError> {
    let column = table
        .column(fund)
        .ok_or_else(|| FundMetricsError::MissingColumn {
            name: fund.to_string(),
        })?;
    let (dates, values): (Vec<NaiveDate>, Vec<f64>) = table
        .dates
        .iter()
        .zip(&column.values)
        .filter_map(|(d, v)| v.map(|v| (*d, v)))
        .unzip();

    let (transformed, lag) = match op {
        TransformOp::Diff => (transform::diff(&values, lag)?, lag),
        TransformOp::Ratio => (transform::ratio(&values)?, 1),
        TransformOp::Pdiff => (transform::pdiff(&values, lag)?, lag),
        TransformOp::Pchange => (transform::pchange(&values, lag)?, lag),
    };
    Ok(dates[lag..].iter().copied().zip(transformed).collect())
}

fn run_transform(
    input: &Path,
    fund: &str,
    op: TransformOp,
    lag: usize,
) -> Result<(), FundMetricsError> {
    let table = CsvAdapter::read_wide(input, ValueKind::Prices)?;
    let points = transform_column(&table, fund, op, lag)?;

    let mut wtr = csv::Writer::from_writer(io::stdout().lock());
    let csv_err = |e: csv::Error| FundMetricsError::Io(io::Error::other(e));
    wtr.write_record(["date", fund]).map_err(csv_err)?;
    for (date, value) in &points {
        wtr.write_record([date.to_string(), value.to_string()])
            .map_err(csv_err)?;
    }
    wtr.flush()?;
    eprintln!("{} values", points.len());
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), FundMetricsError> {
    eprintln!("Loading config from {}", config_path.display());
    let config = load_config(config_path)?;
    validate_analysis_config(&config)?;
    let request = build_request(&config)?;
    print_request(&request);
    eprintln!("Config validated successfully");
    Ok(())
}

fn run_list_funds(config_path: &Path) -> Result<(), FundMetricsError> {
    let config = load_config(config_path)?;
    validate_data_config(&config)?;
    let source = build_source(&config)?;
    let funds = source.list_funds()?;

    let mut out = io::stdout().lock();
    for fund in &funds {
        writeln!(out, "{fund}")?;
    }
    eprintln!("{} funds", funds.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metric::MetricKind;
    use crate::domain::series::TimeSeries;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    const CONFIG: &str = r#"
[data]
prices = prices.csv
funds = A,B
benchmark = SPY

[analysis]
metrics = growth,beta
window = hop.month
minimum_n = 4
"#;

    #[test]
    fn build_request_reads_config() {
        let request = build_request(&make_config(CONFIG)).unwrap();
        assert_eq!(request.metrics, vec![MetricKind::Growth, MetricKind::Beta]);
        assert_eq!(request.policy, WindowPolicy::DisjointMonth);
        assert_eq!(request.minimum_n, 4);
        assert_eq!(request.funds, vec!["A", "B"]);
        assert_eq!(request.benchmark.as_deref(), Some("SPY"));
        assert_eq!(request.frequency, None);
    }

    #[test]
    fn build_request_defaults_minimum_n() {
        let config = make_config("[data]\nprices = p.csv\n[analysis]\nmetrics = mdd\nwindow = roll.5\n");
        let request = build_request(&config).unwrap();
        assert_eq!(request.minimum_n, DEFAULT_MINIMUM_N);
        assert!(request.funds.is_empty());
        assert_eq!(request.benchmark, None);
    }

    #[test]
    fn build_request_reads_frequency_override() {
        let config = make_config(
            "[data]\nprices = p.csv\n[analysis]\nmetrics = sharpe\nwindow = hop.year\nfrequency = monthly\n",
        );
        let request = build_request(&config).unwrap();
        assert_eq!(request.frequency, Some(Frequency::Monthly));
    }

    #[test]
    fn overrides_shadow_config_values() {
        let base = make_config(CONFIG);
        let overrides = Overrides {
            window: Some("roll.10".to_string()),
            metrics: vec!["sharpe".to_string(), "mdd".to_string()],
            benchmark: Some("AGG".to_string()),
            output: Some(PathBuf::from("out.csv")),
        };
        let config = OverlayConfig::new(&base, &overrides);
        let request = build_request(&config).unwrap();

        assert_eq!(request.policy, WindowPolicy::Rolling(10));
        assert_eq!(request.metrics, vec![MetricKind::Sharpe, MetricKind::Mdd]);
        assert_eq!(request.benchmark.as_deref(), Some("AGG"));
        assert_eq!(request.minimum_n, 4);
        assert_eq!(config.get_string("output", "path").as_deref(), Some("out.csv"));
        assert_eq!(config.get_string("data", "prices").as_deref(), Some("prices.csv"));
    }

    #[test]
    fn overlay_fills_missing_window() {
        let base = make_config("[data]\nprices = p.csv\n[analysis]\nmetrics = growth\n");
        assert!(validate_analysis_config(&base).is_err());

        let overrides = Overrides {
            window: Some("hop.year".to_string()),
            ..Overrides::default()
        };
        let config = OverlayConfig::new(&base, &overrides);
        assert!(validate_analysis_config(&config).is_ok());
    }

    #[test]
    fn overlay_getters_fall_back_to_base() {
        let base = make_config(CONFIG);
        let overrides = Overrides {
            metrics: vec!["mean".to_string(), "sd".to_string()],
            ..Overrides::default()
        };
        let config = OverlayConfig::new(&base, &overrides);

        assert_eq!(config.get_list("analysis", "metrics"), vec!["mean", "sd"]);
        assert_eq!(config.get_list("data", "funds"), vec!["A", "B"]);
        assert_eq!(config.get_int("analysis", "minimum_n", 3), 4);
        assert_eq!(config.get_int("analysis", "missing", 3), 3);
        assert_eq!(config.get_string("analysis", "window").as_deref(), Some("hop.month"));
    }

    #[test]
    fn build_request_rejects_bad_window() {
        let config = make_config("[data]\nprices = p.csv\n[analysis]\nmetrics = growth\nwindow = weekly\n");
        let err = build_request(&config).unwrap_err();
        assert!(matches!(err, FundMetricsError::ConfigInvalid { key, .. } if key == "window"));
    }

    #[test]
    fn build_source_requires_a_source() {
        let err = build_source(&make_config("[data]\nfunds = A\n")).unwrap_err();
        assert!(matches!(err, FundMetricsError::ConfigMissing { key, .. } if key == "prices"));
        assert!(build_source(&make_config("[data]\ndirectory = data\n")).is_ok());
    }

    #[test]
    fn funds_to_load_adds_benchmark_once() {
        let funds = vec!["A".to_string(), "B".to_string()];
        assert_eq!(funds_to_load(&funds, Some("SPY")), vec!["A", "B", "SPY"]);
        assert_eq!(funds_to_load(&funds, Some("A")), vec!["A", "B"]);
        assert!(funds_to_load(&[], Some("SPY")).is_empty());
    }

    #[test]
    fn transform_column_keys_by_later_date() {
        let series = TimeSeries::new(
            "A",
            vec![
                (d("2024-01-01"), 100.0),
                (d("2024-01-02"), 110.0),
                (d("2024-01-03"), 99.0),
            ],
        )
        .unwrap();
        let table = SeriesTable::from_series(ValueKind::Prices, vec![series]);

        let diffs = transform_column(&table, "A", TransformOp::Diff, 1).unwrap();
        assert_eq!(diffs, vec![(d("2024-01-02"), 10.0), (d("2024-01-03"), -11.0)]);

        let lagged = transform_column(&table, "A", TransformOp::Pdiff, 2).unwrap();
        assert_eq!(lagged.len(), 1);
        assert_eq!(lagged[0].0, d("2024-01-03"));
        assert!((lagged[0].1 - (-0.01)).abs() < 1e-12);

        let ratios = transform_column(&table, "A", TransformOp::Ratio, 5).unwrap();
        assert_eq!(ratios.len(), 2);
        assert!((ratios[0].1 - 1.1).abs() < 1e-12);
    }

    #[test]
    fn transform_column_unknown_fund() {
        let table = SeriesTable::from_series(ValueKind::Prices, Vec::new());
        let err = transform_column(&table, "X", TransformOp::Diff, 1).unwrap_err();
        assert!(matches!(err, FundMetricsError::MissingColumn { name } if name == "X"));
    }
}
