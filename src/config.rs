use crate::error::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

fn default_max_balance_retries() -> u32 {
    16
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Tuning for the transfer and reconciliation services.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EngineConfig {
    /// How many times a lost balance compare-and-set is retried before the
    /// operation gives up with `BalanceContention`.
    #[serde(default = "default_max_balance_retries")]
    pub max_balance_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_balance_retries: default_max_balance_retries(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Loads a JSON config file. Missing sections and fields take defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
