//! Dashboard configuration
//! Optional JSON file; every field falls back to the reference dashboard values.

use crate::analysis::ZeroTotalPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "realty_insights.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory holding the CSV files.
    pub data_dir: PathBuf,
    pub loan_age_file: String,
    pub county_quarter_file: String,
    pub county_growth_file: String,
    /// Bars shown per bar-race frame.
    pub race_top_n: usize,
    pub frame_duration_ms: u64,
    pub ratio_baseline: String,
    pub ratio_targets: Vec<String>,
    /// Decimal places kept in ratio values.
    pub ratio_precision: u32,
    pub zero_total_policy: ZeroTotalPolicy,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            loan_age_file: "data_age.csv".to_string(),
            county_quarter_file: "data_hage_yyyqq.csv".to_string(),
            county_growth_file: "data_hage_versus.csv".to_string(),
            race_top_n: 12,
            frame_duration_ms: 600,
            ratio_baseline: "30_35".to_string(),
            ratio_targets: vec![
                "35_40".to_string(),
                "40_45".to_string(),
                "45_50".to_string(),
            ],
            ratio_precision: 2,
            zero_total_policy: ZeroTotalPolicy::Omit,
            window_width: 1400.0,
            window_height: 900.0,
        }
    }
}

impl DashboardConfig {
    /// Read and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Use `explicit` if given, else the default file when it exists, else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.race_top_n == 0 {
            return Err(ConfigError::Invalid("race_top_n must be at least 1".into()));
        }
        if self.frame_duration_ms == 0 {
            return Err(ConfigError::Invalid(
                "frame_duration_ms must be positive".into(),
            ));
        }
        if self.ratio_targets.is_empty() {
            return Err(ConfigError::Invalid("ratio_targets is empty".into()));
        }
        if self.ratio_precision > 10 {
            return Err(ConfigError::Invalid(
                "ratio_precision above 10 decimals".into(),
            ));
        }
        Ok(())
    }

    pub fn loan_age_path(&self) -> PathBuf {
        self.data_dir.join(&self.loan_age_file)
    }

    pub fn county_quarter_path(&self) -> PathBuf {
        self.data_dir.join(&self.county_quarter_file)
    }

    pub fn county_growth_path(&self) -> PathBuf {
        self.data_dir.join(&self.county_growth_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cfg.json");
        fs::write(
            &path,
            r#"{ "data_dir": "/srv/realty", "race_top_n": 5, "zero_total_policy": "abort" }"#,
        )
        .unwrap();

        let config = DashboardConfig::from_file(&path).unwrap();
        assert_eq!(config.race_top_n, 5);
        assert_eq!(config.zero_total_policy, ZeroTotalPolicy::Abort);
        assert_eq!(config.ratio_baseline, "30_35");
        assert_eq!(
            config.loan_age_path(),
            PathBuf::from("/srv/realty/data_age.csv")
        );
    }

    #[test]
    fn rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cfg.json");
        fs::write(&path, r#"{ "ratio_targets": [] }"#).unwrap();
        assert!(matches!(
            DashboardConfig::from_file(&path),
            Err(ConfigError::Invalid(_))
        ));

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            DashboardConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            DashboardConfig::discover(Some(&missing)),
            Err(ConfigError::Read { .. })
        ));
        assert!(DashboardConfig::default().validate().is_ok());
    }
}
