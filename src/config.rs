//! Service configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `MARKETCALC__SECTION__KEY` environment variables (a `.env` file
//! is read first through `dotenvy`).

use crate::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_PREFIX: &str = "MARKETCALC";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Market data provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// The chart endpoint rejects requests without a browser-like agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Period fetched for price projections
    #[serde(default = "default_projection_lookback")]
    pub projection_lookback: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_features")]
    pub default_features: Vec<String>,
    #[serde(default = "default_forest_seed")]
    pub forest_seed: u64,
    #[serde(default = "default_evaluation_start")]
    pub evaluation_start: NaiveDate,
    #[serde(default = "default_evaluation_end")]
    pub evaluation_end: NaiveDate,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) marketcalc/0.1".to_string()
}

fn default_projection_lookback() -> String {
    "1y".to_string()
}

fn default_model() -> String {
    "linear".to_string()
}

fn default_features() -> Vec<String> {
    vec![
        "returns".to_string(),
        "momentum".to_string(),
        "volatility".to_string(),
    ]
}

fn default_forest_seed() -> u64 {
    crate::models::DEFAULT_SEED
}

fn default_evaluation_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}

fn default_evaluation_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 16).unwrap_or_default()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            data: DataConfig::default(),
            forecast: ForecastConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            projection_lookback: default_projection_lookback(),
            default_model: default_model(),
            default_features: default_features(),
            forest_seed: default_forest_seed(),
            evaluation_start: default_evaluation_start(),
            evaluation_end: default_evaluation_end(),
        }
    }
}

impl Config {
    /// Load from `path` (skipped when absent) and the environment
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("forecast.default_features")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// `host:port` for the HTTP listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
