//! INI file configuration adapter.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[data]
prices = data/prices.csv
funds = VFINX, VBLTX ,,SPY
benchmark = SPY

[analysis]
metrics = sharpe,mdd
window = roll.21
minimum_n = 5

[output]
path = out/results.csv
"#;

    #[test]
    fn reads_strings_by_section() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("data", "prices"),
            Some("data/prices.csv".to_string())
        );
        assert_eq!(
            adapter.get_string("analysis", "window"),
            Some("roll.21".to_string())
        );
        assert_eq!(adapter.get_string("data", "missing"), None);
        assert_eq!(adapter.get_string("nosuch", "window"), None);
    }

    #[test]
    fn get_list_splits_and_trims() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_list("data", "funds"), vec!["VFINX", "VBLTX", "SPY"]);
        assert_eq!(adapter.get_list("analysis", "metrics"), vec!["sharpe", "mdd"]);
        assert!(adapter.get_list("data", "missing").is_empty());
    }

    #[test]
    fn get_int_value_and_defaults() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_int("analysis", "minimum_n", 3), 5);
        assert_eq!(adapter.get_int("analysis", "missing", 3), 3);
        assert_eq!(adapter.get_int("analysis", "window", 3), 3);
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SAMPLE).unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("output", "path"),
            Some("out/results.csv".to_string())
        );
    }

    #[test]
    fn from_file_missing_file_is_error() {
        assert!(FileConfigAdapter::from_file("/nonexistent/path/config.ini").is_err());
    }
}
