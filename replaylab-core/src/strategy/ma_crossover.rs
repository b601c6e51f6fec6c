//! Moving average crossover: regime signal from two simple moving averages.
//!
//! BUY while the fast SMA is above the slow SMA, SELL otherwise. A signal is
//! emitted only when the regime changes, so the first bar after warm-up always
//! emits the initial regime.

use std::collections::VecDeque;

use crate::domain::{EventError, MarketEvent, Side, SignalEvent};

use super::{Strategy, StrategyError};

/// SMA crossover over the last `slow` closes of a single symbol.
#[derive(Debug, Clone)]
pub struct MovingAverageCross {
    symbol: String,
    fast: usize,
    slow: usize,
    closes: VecDeque<f64>,
    last_side: Option<Side>,
}

impl MovingAverageCross {
    pub fn new(symbol: impl Into<String>, fast: usize, slow: usize) -> Result<Self, StrategyError> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(StrategyError::EmptySymbol);
        }
        if fast == 0 {
            return Err(StrategyError::ZeroFastWindow);
        }
        if fast >= slow {
            return Err(StrategyError::WindowOrder { fast, slow });
        }
        Ok(Self {
            symbol,
            fast,
            slow,
            closes: VecDeque::with_capacity(slow),
            last_side: None,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn last_side(&self) -> Option<Side> {
        self.last_side
    }

    /// Mean of the most recent `n` closes. Caller guarantees `n <= closes.len()`.
    fn sma(&self, n: usize) -> f64 {
        self.closes.iter().rev().take(n).sum::<f64>() / n as f64
    }
}

impl Strategy for MovingAverageCross {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn warmup_bars(&self) -> usize {
        self.slow
    }

    fn on_market(&mut self, event: &MarketEvent) -> Result<Vec<SignalEvent>, EventError> {
        if event.symbol() != self.symbol {
            return Ok(Vec::new());
        }

        if self.closes.len() == self.slow {
            self.closes.pop_front();
        }
        self.closes.push_back(event.close());

        if self.closes.len() < self.slow {
            return Ok(Vec::new());
        }

        let fast_sma = self.sma(self.fast);
        let slow_sma = self.sma(self.slow);
        let side = if fast_sma > slow_sma { Side::Buy } else { Side::Sell };

        if self.last_side == Some(side) {
            return Ok(Vec::new());
        }
        self.last_side = Some(side);

        tracing::debug!(symbol = %self.symbol, %side, fast_sma, slow_sma, "regime change");
        Ok(vec![SignalEvent::new(event.ts(), &self.symbol, side, None)?])
    }
}
