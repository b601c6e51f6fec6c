//! Serializable run configuration, loaded from TOML.
//!
//! ```toml
//! [backtest]
//! initial_cash = 10000.0
//! max_bars = 200
//!
//! [data]
//! source = "csv"
//! path = "data/SPY_1_min.csv"
//! symbol = "SPY"
//!
//! [strategy]
//! type = "ma_crossover"
//! fast = 10
//! slow = 30
//!
//! [execution.commission]
//! model = "per_trade"
//! per_trade_fee = 1.0
//! ```
//!
//! Every section except `[data]` has defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use replaylab_core::execution::{CommissionModel, CostModelError, SlippageModel};
use replaylab_core::portfolio::{PortfolioConfig, PortfolioError};
use replaylab_core::strategy::{MovingAverageCross, StrategyError};

/// Unique identifier for a configuration (content hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("strategy: {0}")]
    Strategy(#[from] StrategyError),

    #[error("{0}")]
    Portfolio(#[from] PortfolioError),

    #[error("execution: {0}")]
    CostModel(#[from] CostModelError),
}

/// Complete configuration for one replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BacktestConfig {
    #[serde(default)]
    pub backtest: BacktestSection,
    pub data: DataConfig,
    #[serde(default)]
    pub portfolio: PortfolioSection,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BacktestSection {
    pub initial_cash: f64,
    /// Stop after this many bars.
    pub max_bars: Option<usize>,
    /// Annualisation factor for volatility and Sharpe. 252 for daily bars.
    pub periods_per_year: f64,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            initial_cash: 10_000.0,
            max_bars: None,
            periods_per_year: 252.0,
        }
    }
}

/// Where bars come from, selected by `source`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DataConfig {
    Csv {
        path: PathBuf,
        symbol: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ts_col: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        open_col: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        high_col: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        low_col: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        close_col: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        volume_col: Option<String>,
    },
    Synthetic {
        symbol: String,
        #[serde(default = "default_synthetic_bars")]
        bars: usize,
        #[serde(default = "default_synthetic_seed")]
        seed: u64,
        #[serde(default = "default_start_price")]
        start_price: f64,
    },
}

fn default_synthetic_bars() -> usize {
    500
}

fn default_synthetic_seed() -> u64 {
    42
}

fn default_start_price() -> f64 {
    100.0
}

impl DataConfig {
    pub fn symbol(&self) -> &str {
        match self {
            DataConfig::Csv { symbol, .. } | DataConfig::Synthetic { symbol, .. } => symbol,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, DataConfig::Synthetic { .. })
    }
}

/// Portfolio sizing limits. Initial cash lives in `[backtest]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortfolioSection {
    pub target_qty: f64,
    pub max_qty: f64,
    pub est_fee_per_trade: f64,
    pub fractional: bool,
}

impl Default for PortfolioSection {
    fn default() -> Self {
        let d = PortfolioConfig::default();
        Self {
            target_qty: d.target_qty,
            max_qty: d.max_qty,
            est_fee_per_trade: d.est_fee_per_trade,
            fractional: d.fractional,
        }
    }
}

/// Strategy selection, tagged by `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    MaCrossover { fast: usize, slow: usize },
    None,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::MaCrossover { fast: 10, slow: 30 }
    }
}

impl StrategyConfig {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyConfig::MaCrossover { .. } => "ma_crossover",
            StrategyConfig::None => "none",
        }
    }
}

/// Fill cost models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionConfig {
    pub commission: CommissionModel,
    pub slippage: SlippageModel,
}

impl BacktestConfig {
    /// Read, parse and validate a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn portfolio_config(&self) -> PortfolioConfig {
        PortfolioConfig {
            initial_cash: self.backtest.initial_cash,
            target_qty: self.portfolio.target_qty,
            max_qty: self.portfolio.max_qty,
            est_fee_per_trade: self.portfolio.est_fee_per_trade,
            fractional: self.portfolio.fractional,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.portfolio_config().validate()?;

        if self.backtest.max_bars == Some(0) {
            return Err(ConfigError::Invalid {
                field: "backtest.max_bars",
                reason: "must be at least 1 when set".into(),
            });
        }
        let ppy = self.backtest.periods_per_year;
        if !ppy.is_finite() || ppy <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "backtest.periods_per_year",
                reason: format!("must be a positive number, got {ppy}"),
            });
        }

        if self.data.symbol().trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "data.symbol",
                reason: "must not be empty".into(),
            });
        }
        match &self.data {
            DataConfig::Csv { path, .. } if path.as_os_str().is_empty() => {
                return Err(ConfigError::Invalid {
                    field: "data.path",
                    reason: "must not be empty".into(),
                });
            }
            DataConfig::Synthetic { bars: 0, .. } => {
                return Err(ConfigError::Invalid {
                    field: "data.bars",
                    reason: "must be at least 1".into(),
                });
            }
            DataConfig::Synthetic { start_price, .. } if !(*start_price > 0.0 && start_price.is_finite()) => {
                return Err(ConfigError::Invalid {
                    field: "data.start_price",
                    reason: format!("must be a positive number, got {start_price}"),
                });
            }
            _ => {}
        }

        if let StrategyConfig::MaCrossover { fast, slow } = self.strategy {
            MovingAverageCross::new(self.data.symbol(), fast, slow)?;
        }

        self.execution.commission.validate()?;
        self.execution.slippage.validate()?;
        Ok(())
    }

    /// Deterministic content hash of this configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_vec(self).expect("BacktestConfig serialization failed");
        blake3::hash(&json).to_hex().to_string()
    }
}
