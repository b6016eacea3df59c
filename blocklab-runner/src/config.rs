//! TOML backtest configuration.
//!
//! ```toml
//! [data]
//! data_dir = "data"
//! timeframe = "15m"
//! symbols = ["EURUSD"]   # empty: every CSV in data_dir/timeframe
//! synthetic = false
//!
//! [strategy]             # any StrategyParams field; omitted fields default
//! zigzag_window_size = 12
//! n_targets = 3
//!
//! [sweep]
//! metric = "net_profit"
//! top = 20
//!
//! [sweep.grid]           # omitted lists use the default grid
//! zigzag_window_size = [9, 12, 15]
//! ```

use std::path::{Path, PathBuf};

use blocklab_core::domain::ParamsHash;
use blocklab_core::synthetic::SyntheticSpec;
use blocklab_core::{ParamsError, StrategyParams};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data_loader::LoadOptions;
use crate::fitness::FitnessMetric;
use crate::sweep::ParamGrid;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid strategy parameters: {0}")]
    Params(#[from] ParamsError),

    #[error("sweep grid has no values for '{0}'")]
    EmptyGrid(&'static str),
}

/// Where candles come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub data_dir: PathBuf,
    pub timeframe: String,
    /// Explicit symbols; empty means discover from the timeframe directory.
    pub symbols: Vec<String>,
    /// Generate synthetic candles for symbols without a data file.
    pub synthetic: bool,
    /// Length of each synthetic series.
    pub synthetic_candles: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            timeframe: "15m".to_string(),
            symbols: Vec::new(),
            synthetic: false,
            synthetic_candles: 2_000,
        }
    }
}

/// Sweep settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub grid: ParamGrid,
    pub metric: FitnessMetric,
    /// Rows to keep when ranking.
    pub top: usize,
    pub parallel: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            grid: ParamGrid::default(),
            metric: FitnessMetric::NetProfit,
            top: 20,
            parallel: true,
        }
    }
}

/// Complete configuration of a run or sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub data: DataConfig,
    pub strategy: StrategyParams,
    pub sweep: SweepConfig,
}

impl BacktestConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy.validate()?;
        self.sweep.grid.check_non_empty()?;
        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            data_dir: self.data.data_dir.clone(),
            timeframe: self.data.timeframe.clone(),
            synthetic: self.data.synthetic,
            synthetic_spec: SyntheticSpec {
                count: self.data.synthetic_candles,
                ..SyntheticSpec::default()
            },
        }
    }

    /// Deterministic hash of the whole configuration.
    ///
    /// Two runs with identical configs share the same hash.
    pub fn config_hash(&self) -> ParamsHash {
        let json = serde_json::to_string(self).unwrap_or_default();
        ParamsHash::from_bytes(json.as_bytes())
    }
}
