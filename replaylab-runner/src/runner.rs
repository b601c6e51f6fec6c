//! Replay runner: wires config, data, engine and metrics together.
//!
//! Two entry points:
//! - `run_backtest()`: loads bars from the configured source, then runs. Used by the CLI.
//! - `run_backtest_from_events()`: takes pre-loaded bars. No I/O.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use replaylab_core::domain::{MarketEvent, Timestamp};
use replaylab_core::engine::{Engine, EngineConfig, EngineError, RunSummary};
use replaylab_core::execution::{CostModelError, ExecutionSimulator};
use replaylab_core::portfolio::{Portfolio, PortfolioError};
use replaylab_core::strategy::{MovingAverageCross, NullStrategy, Strategy, StrategyError};

use crate::config::{BacktestConfig, ConfigError, RunId, StrategyConfig};
use crate::data_loader::{dataset_hash, load_market_data, LoadError};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),
    #[error("portfolio error: {0}")]
    Portfolio(#[from] PortfolioError),
    #[error("execution error: {0}")]
    CostModel(#[from] CostModelError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub symbol: String,
    pub strategy: String,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub start_ts: Option<Timestamp>,
    pub end_ts: Option<Timestamp>,
    pub warmup_bars: usize,
    pub metrics: PerformanceMetrics,
    pub summary: RunSummary,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Instantiate the configured strategy for `symbol`.
pub fn build_strategy(config: &StrategyConfig, symbol: &str) -> Result<Box<dyn Strategy>, StrategyError> {
    Ok(match *config {
        StrategyConfig::MaCrossover { fast, slow } => Box::new(MovingAverageCross::new(symbol, fast, slow)?),
        StrategyConfig::None => Box::new(NullStrategy),
    })
}

/// Load bars per `config.data` and replay them.
pub fn run_backtest(config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let loaded = load_market_data(&config.data)?;
    if loaded.report.insane_ohlc > 0 {
        tracing::warn!(
            symbol = %loaded.report.symbol,
            count = loaded.report.insane_ohlc,
            "bars with inconsistent OHLC"
        );
    }
    replay(config, loaded.bars, loaded.dataset_hash, loaded.has_synthetic)
}

/// Replay pre-loaded bars under `config`. `config.data` only supplies the
/// symbol and the synthetic flag.
pub fn run_backtest_from_events(
    config: &BacktestConfig,
    events: Vec<MarketEvent>,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let hash = dataset_hash(&events);
    replay(config, events, hash, config.data.is_synthetic())
}

fn replay(
    config: &BacktestConfig,
    events: Vec<MarketEvent>,
    dataset_hash: String,
    has_synthetic: bool,
) -> Result<BacktestResult, RunError> {
    let symbol = config.data.symbol().to_string();
    let strategy = build_strategy(&config.strategy, &symbol)?;
    let strategy_name = strategy.name().to_string();
    let warmup_bars = strategy.warmup_bars();

    let execution = ExecutionSimulator::new(config.execution.slippage, config.execution.commission)?;
    let portfolio = Portfolio::new(config.portfolio_config())?;
    let engine_config = EngineConfig {
        max_bars: config.backtest.max_bars,
    };

    let run_id = config.run_id();
    tracing::info!(%run_id, %symbol, strategy = %strategy_name, bars = events.len(), "starting replay");

    let mut engine = Engine::new(vec![strategy], execution, portfolio, engine_config);
    let summary = engine.run(events)?;

    let equity: Vec<f64> = summary.equity_history.iter().map(|p| p.equity).collect();
    let metrics = PerformanceMetrics::compute(&equity, config.backtest.periods_per_year);
    tracing::info!(
        %run_id,
        fills = summary.fills,
        final_equity = summary.final_equity,
        total_return = metrics.total_return,
        "replay finished"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        symbol,
        strategy: strategy_name,
        dataset_hash,
        has_synthetic,
        start_ts: summary.equity_history.first().map(|p| p.ts),
        end_ts: summary.equity_history.last().map(|p| p.ts),
        warmup_bars,
        metrics,
        summary,
    })
}
