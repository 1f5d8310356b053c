/// Run configuration loader - parses flowclim.toml
///
/// Keeps station files, the analysis window and aggregation settings out of
/// the code, so a new gauge or a different comparison period only needs a
/// config edit.

use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::analysis::clip::DateWindow;
use crate::logging::LogLevel;
use crate::model::{DEFAULT_NO_DATA_SENTINELS, HydroError, METRIC_MEAN_FLOW, METRIC_PEAK_FLOW};

/// Default config path, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "flowclim.toml";

/// One gauging station to process.
#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    /// Label used in the metric tables' `Station` column (e.g. "Wildcat").
    pub label: String,
    /// Full river name for reports.
    pub name: String,
    /// 8-digit USGS site code.
    pub site_code: String,
    /// USGS daily-value export for this station.
    pub discharge_file: String,
    /// Optional USGS peak streamflow export; overrides the annual metric table
    /// as the source of annual peaks.
    pub peak_file: Option<String>,
}

/// Inclusive analysis window.
#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClimatologyConfig {
    /// Maximum number of water years averaged per month.
    #[serde(default = "default_year_span")]
    pub year_span: usize,
}

impl Default for ClimatologyConfig {
    fn default() -> Self {
        Self { year_span: default_year_span() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Discharge tokens meaning "no data".
    #[serde(default = "default_sentinels")]
    pub no_data_sentinels: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { no_data_sentinels: default_sentinels() }
    }
}

/// Metric table locations and column choices.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub annual: String,
    pub monthly: String,
    #[serde(default = "default_peak_metric")]
    pub peak_metric: String,
    /// Metric shown in the monthly climatology report.
    #[serde(default = "default_climatology_metric")]
    pub climatology_metric: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub log_file: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

/// Root configuration structure for TOML parsing
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub climatology: ClimatologyConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    pub station: Vec<StationConfig>,
}

fn default_year_span() -> usize {
    50
}

fn default_sentinels() -> Vec<String> {
    DEFAULT_NO_DATA_SENTINELS.iter().map(|s| s.to_string()).collect()
}

fn default_peak_metric() -> String {
    METRIC_PEAK_FLOW.to_string()
}

fn default_climatology_metric() -> String {
    METRIC_MEAN_FLOW.to_string()
}

fn default_workers() -> usize {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read.
    Io { path: String, source: std::io::Error },
    /// The file is not valid TOML or does not match the schema.
    Parse(String),
    /// Parsed but inconsistent (e.g. inverted window).
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => write!(f, "Failed to read {}: {}", path, source),
            ConfigError::Parse(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<HydroError> for ConfigError {
    fn from(err: HydroError) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Validated analysis window.
    pub fn window(&self) -> Result<DateWindow, HydroError> {
        DateWindow::new(self.window.start, self.window.end)
    }

    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_name(&self.pipeline.log_level).unwrap_or(LogLevel::Info)
    }

    /// Checks cross-field consistency that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.window()?;
        if self.station.is_empty() {
            return Err(ConfigError::Invalid("no [[station]] entries".to_string()));
        }
        if self.pipeline.workers == 0 {
            return Err(ConfigError::Invalid("pipeline.workers must be at least 1".to_string()));
        }
        if self.climatology.year_span == 0 {
            return Err(ConfigError::Invalid("climatology.year_span must be at least 1".to_string()));
        }
        if LogLevel::from_name(&self.pipeline.log_level).is_none() {
            return Err(ConfigError::Invalid(format!(
                "unknown pipeline.log_level '{}'",
                self.pipeline.log_level
            )));
        }
        for (i, station) in self.station.iter().enumerate() {
            if self.station[..i].iter().any(|s| s.label == station.label) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate station label '{}'",
                    station.label
                )));
            }
        }
        Ok(())
    }
}

/// Parses and validates configuration text.
pub fn parse_config(text: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Loads and validates the configuration file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&contents)
}
