//! ReplayLab Runner: configuration, data loading, orchestration, metrics, export.
//!
//! This crate builds on `replaylab-core` to provide:
//! - TOML run configuration with content-hashed run IDs
//! - CSV and synthetic bar loading with dataset fingerprints
//! - Single-replay runner producing a versioned `BacktestResult`
//! - Performance metrics over the equity history
//! - JSON, CSV and Markdown artifact export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use config::{BacktestConfig, ConfigError, DataConfig, RunId, StrategyConfig};
pub use data_loader::{dataset_hash, load_market_data, LoadError, LoadedData};
pub use export::{export_equity_csv, export_json, generate_report, import_json, save_artifacts, sparkline};
pub use metrics::PerformanceMetrics;
pub use runner::{build_strategy, run_backtest, run_backtest_from_events, BacktestResult, RunError, SCHEMA_VERSION};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn result_types_are_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
    }

    #[test]
    fn error_types_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
    }
}
