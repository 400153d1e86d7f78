//! INI file configuration adapter.
//!
//! Section and key names are case-insensitive.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

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

    const SAMPLE: &str = r#"
[data]
dir = /srv/bars
codes = 600000, 000001

[selection]
selnum_final = 30
reserve = 0.05
parallel = yes

[schedule]
triggers = 01-31,07-15

[signal]
stop_loss_atr = 3.0
max_pyramid = 3

[account]
equity = 1000000
"#;

    #[test]
    fn from_string_reads_every_section() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("data", "dir"), Some("/srv/bars".to_string()));
        assert_eq!(
            adapter.get_string("data", "codes"),
            Some("600000, 000001".to_string())
        );
        assert_eq!(adapter.get_int("selection", "selnum_final", 0), 30);
        assert_eq!(adapter.get_double("selection", "reserve", 0.0), 0.05);
        assert!(adapter.get_bool("selection", "parallel", false));
        assert_eq!(
            adapter.get_string("schedule", "triggers"),
            Some("01-31,07-15".to_string())
        );
        assert_eq!(adapter.get_double("signal", "stop_loss_atr", 0.0), 3.0);
        assert_eq!(adapter.get_double("account", "equity", 0.0), 1_000_000.0);
    }

    #[test]
    fn keys_are_case_insensitive() {
        let adapter = FileConfigAdapter::from_string("[Signal]\nATR_Period = 20\n").unwrap();
        assert_eq!(adapter.get_int("signal", "atr_period", 15), 20);
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[data]\ndir = x\n").unwrap();
        assert_eq!(adapter.get_string("data", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn numeric_getters_fall_back_to_default() {
        let adapter =
            FileConfigAdapter::from_string("[selection]\nselnum_final = abc\nreserve = lots\n").unwrap();
        assert_eq!(adapter.get_int("selection", "selnum_final", 42), 42);
        assert_eq!(adapter.get_int("selection", "missing", 7), 7);
        assert_eq!(adapter.get_double("selection", "reserve", 0.05), 0.05);
        assert_eq!(adapter.get_double("selection", "missing", 99.9), 99.9);
    }

    #[test]
    fn get_bool_values() {
        let adapter = FileConfigAdapter::from_string(
            "[selection]\na = true\nb = yes\nc = 1\nd = false\ne = no\nf = 0\ng = maybe\n",
        )
        .unwrap();
        assert!(adapter.get_bool("selection", "a", false));
        assert!(adapter.get_bool("selection", "b", false));
        assert!(adapter.get_bool("selection", "c", false));
        assert!(!adapter.get_bool("selection", "d", true));
        assert!(!adapter.get_bool("selection", "e", true));
        assert!(!adapter.get_bool("selection", "f", true));
        assert!(adapter.get_bool("selection", "g", true));
        assert!(!adapter.get_bool("selection", "missing", false));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config(SAMPLE);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_int("signal", "max_pyramid", 0), 3);
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(result.is_err());
    }
}
