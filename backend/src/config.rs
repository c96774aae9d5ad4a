//! Runtime configuration.
//!
//! Two layers feed the pipeline:
//!
//! - [`Settings`]: credentials and run switches resolved from the environment
//!   (optionally seeded from a `.env` file).
//! - [`ReportConfig`]: the query domain, naming and output layout, read from a
//!   `vdp.toml` file. Every field defaults to the values the report has always
//!   used, so an absent file behaves like the stock deployment.
//!
//! Both are constructed once and handed to component constructors; nothing
//! below this module reads the environment directly.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::query::DistanceDomain;

pub const AWS_ACCESS_KEY_ID_ENV_VAR: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY_ENV_VAR: &str = "AWS_SECRET_ACCESS_KEY";
pub const REGION_NAME_ENV_VAR: &str = "REGION_NAME";
pub const DATABASE_ENV_VAR: &str = "ATHENA_DATABASE";
pub const OUTPUT_LOCATION_ENV_VAR: &str = "ATHENA_OUTPUT_LOCATION";
pub const SLEEP_TIME_ENV_VAR: &str = "SLEEP_TIME";
pub const CREATE_BAR_CHART_ENV_VAR: &str = "CREATE_BAR_CHART";

pub const DEFAULT_DATABASE: &str = "mobileye_detect_vehicle_db";
pub const DEFAULT_OUTPUT_LOCATION: &str = "s3://vehicledetectionbucket/athena_result/";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Errors raised while loading or checking configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("No vdp.toml found in standard locations")]
    NotFound,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Credentials and run switches for one pipeline run.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub region: String,
    pub database: String,
    pub output_location: String,
    /// Raw wait-duration setting; clamped by the execution client before use.
    pub wait_duration_override: Option<String>,
    pub chart_enabled: bool,
}

// Keep secrets out of logs.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("access_key_id", &self.access_key_id.as_ref().map(|_| "<set>"))
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("region", &self.region)
            .field("database", &self.database)
            .field("output_location", &self.output_location)
            .field("wait_duration_override", &self.wait_duration_override)
            .field("chart_enabled", &self.chart_enabled)
            .finish()
    }
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// A `.env` file in the working directory (or any parent) is applied first
    /// without overriding variables that are already set.
    ///
    /// # Environment Variables
    /// - `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` (optional)
    /// - `REGION_NAME` (optional, default: `us-east-1`)
    /// - `ATHENA_DATABASE` (optional, default: `mobileye_detect_vehicle_db`)
    /// - `ATHENA_OUTPUT_LOCATION` (optional, default: `s3://vehicledetectionbucket/athena_result/`)
    /// - `SLEEP_TIME` (optional): seconds to wait between submit and fetch
    /// - `CREATE_BAR_CHART` (optional): `true` (any case) enables the chart artifact
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                log::warn!("Ignoring unreadable .env file: {}", e);
            }
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key/value source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            access_key_id: non_empty(AWS_ACCESS_KEY_ID_ENV_VAR),
            secret_access_key: non_empty(AWS_SECRET_ACCESS_KEY_ENV_VAR),
            region: non_empty(REGION_NAME_ENV_VAR).unwrap_or_else(|| DEFAULT_REGION.to_string()),
            database: non_empty(DATABASE_ENV_VAR).unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            output_location: non_empty(OUTPUT_LOCATION_ENV_VAR)
                .unwrap_or_else(|| DEFAULT_OUTPUT_LOCATION.to_string()),
            wait_duration_override: lookup(SLEEP_TIME_ENV_VAR),
            chart_enabled: lookup(CREATE_BAR_CHART_ENV_VAR)
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }

    pub fn with_wait_duration(mut self, raw: impl Into<String>) -> Self {
        self.wait_duration_override = Some(raw.into());
        self
    }

    pub fn with_chart(mut self, enabled: bool) -> Self {
        self.chart_enabled = enabled;
        self
    }
}

/// Report configuration from file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub query: QuerySettings,
    #[serde(default)]
    pub report: OutputSettings,
    #[serde(default)]
    pub service: ServiceSettings,
}

/// Query domain and schema naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySettings {
    #[serde(default = "default_lower_bound")]
    pub lower_bound: i64,
    #[serde(default = "default_upper_bound")]
    pub upper_bound: i64,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_category_column")]
    pub category_column: String,
    #[serde(default = "default_distance_column")]
    pub distance_column: String,
    #[serde(default = "default_detection_column")]
    pub detection_column: String,
}

/// Output artifacts and log placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_ignore_label")]
    pub ignore_label: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

/// Query service backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSettings {
    #[serde(rename = "type", default = "default_service_type")]
    pub service_type: String,
    /// Overrides the regional endpoint, e.g. for a local emulator.
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_lower_bound() -> i64 {
    crate::query::LOWER_BOUND
}

fn default_upper_bound() -> i64 {
    crate::query::UPPER_BOUND
}

fn default_table() -> String {
    "mobileye_detect_vehicle_db.data".to_string()
}

fn default_category_column() -> String {
    "vehicle_type".to_string()
}

fn default_distance_column() -> String {
    "distance".to_string()
}

fn default_detection_column() -> String {
    "detection".to_string()
}

fn default_ignore_label() -> String {
    "ignore".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("vehicle_detection.log")
}

fn default_service_type() -> String {
    "athena".to_string()
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            lower_bound: default_lower_bound(),
            upper_bound: default_upper_bound(),
            table: default_table(),
            category_column: default_category_column(),
            distance_column: default_distance_column(),
            detection_column: default_detection_column(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            ignore_label: default_ignore_label(),
            output_dir: default_output_dir(),
            log_file: default_log_file(),
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            service_type: default_service_type(),
            endpoint: None,
        }
    }
}

impl QuerySettings {
    pub fn domain(&self) -> DistanceDomain {
        DistanceDomain::new(self.lower_bound, self.upper_bound)
    }
}

impl ReportConfig {
    /// Load report configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: ReportConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load report configuration from the default location.
    ///
    /// Searches for `vdp.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from("vdp.toml"),
            PathBuf::from("backend/vdp.toml"),
            PathBuf::from("../vdp.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(ConfigError::NotFound)
    }

    /// Load from the default location, falling back to built-in defaults when
    /// no file exists. Parse errors still surface.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::from_default_location() {
            Err(ConfigError::NotFound) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let q = &self.query;
        if q.lower_bound > q.upper_bound {
            return Err(ConfigError::Invalid(format!(
                "query.lower_bound ({}) must not exceed query.upper_bound ({})",
                q.lower_bound, q.upper_bound
            )));
        }

        let names = [
            ("query.table", &q.table),
            ("query.category_column", &q.category_column),
            ("query.distance_column", &q.distance_column),
            ("query.detection_column", &q.detection_column),
            ("report.ignore_label", &self.report.ignore_label),
        ];
        for (key, value) in names {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", key)));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings.database, DEFAULT_DATABASE);
        assert_eq!(settings.output_location, DEFAULT_OUTPUT_LOCATION);
        assert_eq!(settings.region, DEFAULT_REGION);
        assert!(settings.access_key_id.is_none());
        assert!(settings.wait_duration_override.is_none());
        assert!(!settings.chart_enabled);
    }

    #[test]
    fn test_settings_from_lookup() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("AWS_ACCESS_KEY_ID", "AKID"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("REGION_NAME", "eu-west-1"),
            ("SLEEP_TIME", "45"),
            ("CREATE_BAR_CHART", "TRUE"),
        ]));
        assert_eq!(settings.access_key_id.as_deref(), Some("AKID"));
        assert_eq!(settings.secret_access_key.as_deref(), Some("secret"));
        assert_eq!(settings.region, "eu-west-1");
        assert_eq!(settings.wait_duration_override.as_deref(), Some("45"));
        assert!(settings.chart_enabled);
    }

    #[test]
    fn test_chart_flag_requires_true() {
        for raw in ["yes", "1", "false", ""] {
            let settings = Settings::from_lookup(lookup_from(&[("CREATE_BAR_CHART", raw)]));
            assert!(!settings.chart_enabled, "{raw:?} should not enable the chart");
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let settings = Settings::from_lookup(lookup_from(&[("AWS_SECRET_ACCESS_KEY", "topsecret")]));
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("topsecret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config: ReportConfig = toml::from_str("").unwrap();
        assert_eq!(config, ReportConfig::default());
        assert_eq!(config.query.lower_bound, 1);
        assert_eq!(config.query.upper_bound, 100);
        assert_eq!(config.query.category_column, "vehicle_type");
        assert_eq!(config.report.ignore_label, "ignore");
        assert_eq!(config.service.service_type, "athena");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[query]
lower_bound = 5
upper_bound = 50
table = "fleet.events"
category_column = "class"

[report]
ignore_label = "skip"
output_dir = "out"

[service]
type = "local"
endpoint = "http://localhost:4566"
"#;

        let config: ReportConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.query.domain(), DistanceDomain::new(5, 50));
        assert_eq!(config.query.table, "fleet.events");
        assert_eq!(config.query.distance_column, "distance");
        assert_eq!(config.report.ignore_label, "skip");
        assert_eq!(config.report.output_dir, PathBuf::from("out"));
        assert_eq!(config.service.service_type, "local");
        assert_eq!(config.service.endpoint.as_deref(), Some("http://localhost:4566"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let mut config = ReportConfig::default();
        config.query.lower_bound = 10;
        config.query.upper_bound = 9;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_blank_names() {
        let mut config = ReportConfig::default();
        config.query.category_column = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("query.category_column"));
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vdp.toml");
        fs::write(&path, "[query\nlower_bound = ").unwrap();
        assert!(matches!(
            ReportConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_from_file_missing() {
        let err = ReportConfig::from_file("/nonexistent/vdp.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
