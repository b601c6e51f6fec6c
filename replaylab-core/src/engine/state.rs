//! Engine configuration, counters, and run summary types.

use crate::domain::EquityPoint;
use serde::{Deserialize, Serialize};

/// Configuration for a single replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Stop after this many bars. `None` replays the whole source.
    pub max_bars: Option<usize>,
}

impl EngineConfig {
    pub fn with_max_bars(max_bars: usize) -> Self {
        Self {
            max_bars: Some(max_bars),
        }
    }
}

/// Event counts accumulated while the loop runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub bars: usize,
    pub signals: usize,
    pub orders: usize,
    pub fills: usize,
}

/// Outcome of a replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub bars: usize,
    pub signals: usize,
    pub orders: usize,
    /// Fills produced by execution.
    pub fills: usize,
    /// Fills the portfolio refused to book.
    pub rejected_fills: usize,
    pub total_fees: f64,
    pub initial_cash: f64,
    pub final_cash: f64,
    pub final_equity: f64,
    pub equity_history: Vec<EquityPoint>,
}

impl RunSummary {
    /// Simple return over the run; 0 when initial cash is 0.
    pub fn total_return(&self) -> f64 {
        if self.initial_cash > 0.0 {
            self.final_equity / self.initial_cash - 1.0
        } else {
            0.0
        }
    }
}
