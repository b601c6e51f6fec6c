//! Strategies: consume market bars, emit directional intent.
//!
//! A strategy never sees portfolio or position state. It receives one
//! [`MarketEvent`] at a time and returns zero or more [`SignalEvent`]s; sizing
//! and risk are the portfolio's job.

pub mod ma_crossover;

pub use ma_crossover::MovingAverageCross;

use crate::domain::{EventError, MarketEvent, SignalEvent};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    #[error("strategy symbol must be a non-empty string")]
    EmptySymbol,

    #[error("fast window must be >= 1")]
    ZeroFastWindow,

    #[error("fast window ({fast}) must be shorter than slow window ({slow})")]
    WindowOrder { fast: usize, slow: usize },
}

/// Signal generator driven by market events.
pub trait Strategy: Send + Sync {
    /// Human-readable name (e.g., "ma_crossover").
    fn name(&self) -> &str;

    /// Bars consumed before the strategy can emit anything.
    fn warmup_bars(&self) -> usize {
        0
    }

    fn on_market(&mut self, event: &MarketEvent) -> Result<Vec<SignalEvent>, EventError>;
}

/// Never signals. Useful for buy-nothing baselines and equity-flatness checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStrategy;

impl Strategy for NullStrategy {
    fn name(&self) -> &str {
        "none"
    }

    fn on_market(&mut self, _event: &MarketEvent) -> Result<Vec<SignalEvent>, EventError> {
        Ok(Vec::new())
    }
}
