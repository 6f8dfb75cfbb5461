//! File-backed backtest configuration (TOML).
//!
//! ```toml
//! [backtest]
//! symbol = "BTCUSDT"
//! interval = "1h"
//! initial_balance = 1000.0
//!
//! [data]
//! path = "data/btc_1h.csv"
//!
//! [strategy]
//! type = "macd_ema"
//! [strategy.params]
//! fast = 12.0
//!
//! [risk]
//! stop_loss_pct = 5.0
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use signaldesk_core::engine::RunLabels;
use signaldesk_core::strategy::{self, StrategyConfig};
use signaldesk_core::RiskConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    #[serde(default)]
    pub data: DataSection,
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub risk: RiskConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    pub symbol: String,
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default = "default_initial_balance")]
    pub initial_balance: f64,
}

fn default_interval() -> String {
    "1h".into()
}

fn default_initial_balance() -> f64 {
    1000.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSection {
    /// CSV or Parquet file. Relative paths resolve against the config file's directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub synthetic: bool,
    #[serde(default = "default_synthetic_bars")]
    pub synthetic_bars: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_synthetic_bars() -> usize {
    500
}

fn default_seed() -> u64 {
    42
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            path: None,
            synthetic: false,
            synthetic_bars: default_synthetic_bars(),
            seed: default_seed(),
        }
    }
}

/// Where bars come from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Csv(PathBuf),
    Parquet(PathBuf),
    /// Seeded random walk.
    Synthetic { bars: usize, seed: u64 },
}

impl DataSection {
    pub fn source(&self) -> Result<DataSource, ConfigError> {
        if self.synthetic {
            if self.synthetic_bars < 2 {
                return Err(ConfigError::Invalid(format!(
                    "synthetic_bars must be at least 2, got {}",
                    self.synthetic_bars
                )));
            }
            return Ok(DataSource::Synthetic {
                bars: self.synthetic_bars,
                seed: self.seed,
            });
        }

        let path = self.path.clone().ok_or_else(|| {
            ConfigError::Invalid("[data] needs a path or synthetic = true".into())
        })?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(DataSource::Csv(path)),
            Some("parquet") | Some("pq") => Ok(DataSource::Parquet(path)),
            _ => Err(ConfigError::Invalid(format!(
                "unsupported data file '{}': expected .csv or .parquet",
                path.display()
            ))),
        }
    }
}

impl BacktestConfig {
    /// Load and validate. Relative data paths resolve against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;

        if let (Some(data_path), Some(dir)) = (&config.data.path, path.parent()) {
            if data_path.is_relative() {
                config.data.path = Some(dir.join(data_path));
            }
        }
        Ok(config)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Semantic checks. Exit-rule percentages are not range-checked; negative
    /// values only produce a warning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let balance = self.backtest.initial_balance;
        if !(balance.is_finite() && balance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "initial_balance must be positive, got {balance}"
            )));
        }
        let risk_pct = self.risk.risk_per_trade_pct;
        if !(risk_pct.is_finite() && risk_pct > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "risk_per_trade_pct must be positive, got {risk_pct}"
            )));
        }
        strategy::create(&self.strategy).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.data.source()?;

        for field in self.risk.negative_fields() {
            warn!(field, "negative percentage inverts the exit rule");
        }
        Ok(())
    }

    pub fn labels(&self) -> RunLabels {
        RunLabels::new(
            self.backtest.symbol.clone(),
            self.backtest.interval.clone(),
            self.strategy.kind.clone(),
        )
    }
}
