//! INI file configuration adapter.

use crate::domain::error::GaptraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GaptraderError> {
        let mut config = Ini::new();
        config
            .load(path.as_ref())
            .map_err(|e| GaptraderError::ConfigParse {
                file: path.as_ref().display().to_string(),
                reason: e,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
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

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[data]
base_path = data
broker = xtb

[strategy]
kind = gap
retention_period = 100
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(adapter.get_string("data", "broker"), Some("xtb".to_string()));
        assert_eq!(adapter.get_string("strategy", "kind"), Some("gap".to_string()));
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[data]\nbroker = xtb\n").unwrap();
        assert_eq!(adapter.get_string("data", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nretention_period = 50\n").unwrap();
        assert_eq!(adapter.get_int("strategy", "retention_period", 0), 50);
    }

    #[test]
    fn get_int_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[strategy]\n").unwrap();
        assert_eq!(adapter.get_int("strategy", "missing", 42), 42);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nretention_period = abc\n").unwrap();
        assert_eq!(adapter.get_int("strategy", "retention_period", 42), 42);
    }

    #[test]
    fn get_double_returns_value() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ninitial_capital = 1000.5\n").unwrap();
        assert_eq!(adapter.get_double("backtest", "initial_capital", 0.0), 1000.5);
    }

    #[test]
    fn get_double_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        assert_eq!(adapter.get_double("backtest", "missing", 99.9), 99.9);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\nfee = not_a_number\n").unwrap();
        assert_eq!(adapter.get_double("backtest", "fee", 99.9), 99.9);
    }

    #[test]
    fn get_bool_returns_true_values() {
        let adapter =
            FileConfigAdapter::from_string("[report]\na = true\nb = yes\nc = 1\n").unwrap();
        assert!(adapter.get_bool("report", "a", false));
        assert!(adapter.get_bool("report", "b", false));
        assert!(adapter.get_bool("report", "c", false));
    }

    #[test]
    fn get_bool_returns_false_values() {
        let adapter =
            FileConfigAdapter::from_string("[report]\na = false\nb = no\nc = 0\n").unwrap();
        assert!(!adapter.get_bool("report", "a", true));
        assert!(!adapter.get_bool("report", "b", true));
        assert!(!adapter.get_bool("report", "c", true));
    }

    #[test]
    fn get_bool_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[report]\n").unwrap();
        assert!(adapter.get_bool("report", "missing", true));
        assert!(!adapter.get_bool("report", "missing", false));
    }

    #[test]
    fn from_file_reads_config() {
        let content = "[report]\nsignals_path = out/signals.csv\n";
        let file = create_temp_config(content);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("report", "signals_path"),
            Some("out/signals.csv".to_string())
        );
    }

    #[test]
    fn from_file_reports_the_missing_path() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(
            matches!(result, Err(GaptraderError::ConfigParse { file, .. }) if file.contains("config.ini"))
        );
    }

    #[test]
    fn handles_all_config_sections() {
        let content = r#"
[data]
base_path = data
broker = xtb
symbol = GOLD
period = 1D

[strategy]
kind = gap
merge = to-start

[backtest]
engine = long
initial_capital = 1000.0

[grid]
stop_loss = 0.01,0.02

[report]
results_path = out/results.csv
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();

        assert_eq!(adapter.get_string("data", "symbol"), Some("GOLD".to_string()));
        assert_eq!(adapter.get_string("strategy", "merge"), Some("to-start".to_string()));
        assert_eq!(adapter.get_double("backtest", "initial_capital", 0.0), 1000.0);
        assert_eq!(
            adapter.get_string("grid", "stop_loss"),
            Some("0.01,0.02".to_string())
        );
        assert_eq!(
            adapter.get_string("report", "results_path"),
            Some("out/results.csv".to_string())
        );
    }
}
