//! Configuration management for the attendance ledger

use crate::attendance::GeofenceArea;
use crate::blockchain::MAX_DIFFICULTY;
use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Pre-configured attendance area. Can also be set at runtime over HTTP.
    #[serde(default)]
    pub attendance: Option<GeofenceArea>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Required number of leading hex zeros in a block hash.
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,
    #[serde(default = "default_chain_path")]
    pub chain_path: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            chain_path: default_chain_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_difficulty() -> usize {
    2
}

fn default_chain_path() -> String {
    "blockchain.json".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

/// Parse configuration from a TOML string and validate critical values.
pub fn parse_config(config_str: &str) -> Result<Config> {
    let config: Config =
        toml::from_str(config_str).map_err(|e| LedgerError::Config(e.to_string()))?;

    if config.ledger.difficulty > MAX_DIFFICULTY {
        return Err(LedgerError::Config(format!(
            "ledger.difficulty must be at most {}",
            MAX_DIFFICULTY
        )));
    }

    if config.ledger.chain_path.is_empty() {
        return Err(LedgerError::Config(
            "ledger.chain_path must be set in config.toml".to_string(),
        ));
    }

    if let Some(area) = &config.attendance {
        if area.tolerance_m.is_nan() || area.tolerance_m < 0.0 {
            return Err(LedgerError::Config(
                "attendance.tolerance_m must be a non-negative number".to_string(),
            ));
        }
    }

    Ok(config)
}

/// Load configuration from `path`. A missing file yields the defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let config_str = fs::read_to_string(path)?;
    parse_config(&config_str)
}
