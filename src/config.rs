//! Configuration management for the fraud spike engine

use crate::detection::spike::{DEFAULT_CONFIDENCE_PERCENT, DEFAULT_WINDOW_SIZE};
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub history: HistoryConfig,
    pub detection: DetectionConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming evaluation requests
    pub request_subject: String,
    /// Subject for verdicts when a request carries no reply subject
    pub verdict_subject: String,
}

/// Transaction history source
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Path to the CSV history file
    pub path: String,
    /// Whether the first row is a header
    #[serde(default = "default_has_headers")]
    pub has_headers: bool,
    /// Zero-based column holding the amount
    #[serde(default = "default_amount_column")]
    pub amount_column: usize,
    /// Zero-based column holding the timestamp
    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: usize,
}

fn default_has_headers() -> bool {
    true
}

fn default_amount_column() -> usize {
    4
}

fn default_timestamp_column() -> usize {
    5
}

/// Spike detection tunables
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    /// Trailing window length for spike scoring
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Confidence level in percent, exclusive range (0, 100)
    #[serde(default = "default_confidence_percent")]
    pub confidence_percent: f64,
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

fn default_confidence_percent() -> f64 {
    DEFAULT_CONFIDENCE_PERCENT
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            confidence_percent: DEFAULT_CONFIDENCE_PERCENT,
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of requests evaluated concurrently
    pub workers: usize,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Interval between metrics summaries
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

fn default_metrics_interval() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path.
    ///
    /// `FRAUD__SECTION__KEY` environment variables override file values,
    /// e.g. `FRAUD__DETECTION__WINDOW_SIZE=12`.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("FRAUD").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: "fraud.evaluate".to_string(),
                verdict_subject: "fraud.verdicts".to_string(),
            },
            history: HistoryConfig {
                path: "data/transaction_history.csv".to_string(),
                has_headers: true,
                amount_column: 4,
                timestamp_column: 5,
            },
            detection: DetectionConfig::default(),
            pipeline: PipelineConfig {
                workers: 4,
                timeout_ms: 1000,
                metrics_interval_secs: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}
