use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::error::Result;
use crate::utils::constants::{
    CITIES_FILE, DEFAULT_DATA_DIR, DEFAULT_REPORT_LOCATION, ENV_PREFIX, MEASUREMENTS_FILE,
};

/// Runtime settings: defaults, then an optional TOML file, then `AIRQ_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub report_location: PathBuf,

    #[validate(length(min = 1, message = "measurements_file must not be empty"))]
    pub measurements_file: String,

    #[validate(length(min = 1, message = "cities_file must not be empty"))]
    pub cities_file: String,
}

impl AppConfig {
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        Self::load_with_env(config_file, None)
    }

    /// Like [`AppConfig::load`], reading environment overrides from `env`
    /// instead of the process environment when given.
    pub fn load_with_env(
        config_file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("data_dir", DEFAULT_DATA_DIR)?
            .set_default("report_location", DEFAULT_REPORT_LOCATION)?
            .set_default("measurements_file", MEASUREMENTS_FILE)?
            .set_default("cities_file", CITIES_FILE)?;

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(false));
        }

        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).source(env))
            .build()?;

        let app_config: AppConfig = settings.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = data_dir;
        self
    }

    pub fn measurements_path(&self) -> PathBuf {
        self.data_dir.join(&self.measurements_file)
    }

    pub fn cities_path(&self) -> PathBuf {
        self.data_dir.join(&self.cities_file)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            report_location: PathBuf::from(DEFAULT_REPORT_LOCATION),
            measurements_file: MEASUREMENTS_FILE.to_string(),
            cities_file: CITIES_FILE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MonitorError;
    use std::fs;
    use tempfile::TempDir;

    fn no_env() -> Option<HashMap<String, String>> {
        Some(HashMap::new())
    }

    #[test]
    fn test_defaults_without_file() {
        let config = AppConfig::load_with_env(None, no_env()).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.measurements_path(), PathBuf::from("data/measurements.csv"));
    }

    #[test]
    fn test_missing_file_is_optional() {
        let dir = TempDir::new().unwrap();
        let config =
            AppConfig::load_with_env(Some(&dir.path().join("absent.toml")), no_env()).unwrap();

        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_file_then_environment() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("air-quality-monitor.toml");
        fs::write(
            &path,
            "data_dir = \"/srv/airq\"\nreport_location = \"/srv/reports\"\n",
        )
        .unwrap();
        let env = HashMap::from([(
            "AIRQ_REPORT_LOCATION".to_string(),
            "/tmp/reports".to_string(),
        )]);

        let config = AppConfig::load_with_env(Some(&path), Some(env)).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/airq"));
        assert_eq!(config.report_location, PathBuf::from("/tmp/reports"));
        assert_eq!(config.cities_path(), PathBuf::from("/srv/airq/cities.json"));
    }

    #[test]
    fn test_empty_file_name_rejected() {
        let env = HashMap::from([("AIRQ_CITIES_FILE".to_string(), String::new())]);

        let result = AppConfig::load_with_env(None, Some(env));

        assert!(matches!(result, Err(MonitorError::Validation(_))));
    }
}
