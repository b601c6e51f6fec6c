//! Portfolio: cash, positions, and the equity curve.
//!
//! Signals become orders under cash and quantity limits; fills are applied to
//! cash and positions. The account is long-only: `cash >= 0` and every position
//! is `>= 0` after any sequence of signals and fills. Limit breaches never
//! raise; they clamp or reject silently and log at debug level.

pub mod config;

pub use config::{PortfolioConfig, PortfolioError};

use std::collections::HashMap;

use crate::domain::{EquityPoint, EventError, FillEvent, OrderEvent, Side, SignalEvent, Timestamp};

const QTY_EPS: f64 = 1e-9;
const CASH_EPS: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct Portfolio {
    config: PortfolioConfig,
    cash: f64,
    positions: HashMap<String, f64>,
    last_price: HashMap<String, f64>,
    equity_history: Vec<EquityPoint>,
    total_fees: f64,
    fill_count: usize,
    rejected_fills: usize,
}

impl Portfolio {
    pub fn new(config: PortfolioConfig) -> Result<Self, PortfolioError> {
        config.validate()?;
        Ok(Self {
            config,
            cash: config.initial_cash,
            positions: HashMap::new(),
            last_price: HashMap::new(),
            equity_history: Vec::new(),
            total_fees: 0.0,
            fill_count: 0,
            rejected_fills: 0,
        })
    }

    pub fn config(&self) -> &PortfolioConfig {
        &self.config
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Held quantity, 0 when the symbol was never traded.
    pub fn position(&self, symbol: &str) -> f64 {
        self.positions.get(symbol).copied().unwrap_or(0.0)
    }

    pub fn positions(&self) -> &HashMap<String, f64> {
        &self.positions
    }

    pub fn last_price(&self, symbol: &str) -> Option<f64> {
        self.last_price.get(symbol).copied()
    }

    pub fn equity_history(&self) -> &[EquityPoint] {
        &self.equity_history
    }

    pub fn into_equity_history(self) -> Vec<EquityPoint> {
        self.equity_history
    }

    pub fn total_fees(&self) -> f64 {
        self.total_fees
    }

    pub fn fill_count(&self) -> usize {
        self.fill_count
    }

    pub fn rejected_fills(&self) -> usize {
        self.rejected_fills
    }

    pub fn update_market_price(&mut self, symbol: &str, price: f64) {
        self.last_price.insert(symbol.to_string(), price);
    }

    /// Cash plus mark-to-market value of positions with a known price.
    ///
    /// Symbols without an observed price contribute nothing.
    pub fn total_value(&self) -> f64 {
        let holdings: f64 = self
            .positions
            .iter()
            .filter_map(|(sym, qty)| self.last_price.get(sym).map(|px| qty * px))
            .sum();
        self.cash + holdings
    }

    /// Append an equity snapshot for `ts`.
    pub fn update_timeindex(&mut self, ts: Timestamp) {
        let point = EquityPoint {
            ts,
            equity: self.total_value(),
            cash: self.cash,
        };
        self.equity_history.push(point);
    }

    /// Size a market order that moves the position toward the signal's target.
    pub fn on_signal(&self, signal: &SignalEvent) -> Result<Option<OrderEvent>, EventError> {
        let symbol = signal.symbol();
        let Some(price) = self.last_price(symbol) else {
            tracing::debug!(symbol, "signal ignored: no market price yet");
            return Ok(None);
        };

        let current = self.position(symbol);
        let desired = match signal.side() {
            Side::Buy => self.config.target_qty,
            Side::Sell => 0.0,
        }
        .clamp(0.0, self.config.max_qty);

        let delta = desired - current;
        if delta.abs() < QTY_EPS {
            return Ok(None);
        }

        let (side, qty) = if delta > 0.0 {
            let affordable = (self.cash - self.config.est_fee_per_trade) / price;
            let mut qty = delta.min(affordable);
            if !self.config.fractional {
                qty = qty.floor();
            }
            if qty < delta {
                tracing::debug!(symbol, wanted = delta, qty, cash = self.cash, "buy clamped to cash");
            }
            (Side::Buy, qty)
        } else {
            (Side::Sell, (-delta).min(current))
        };

        if qty <= 0.0 {
            tracing::debug!(symbol, side = %side, "signal produced no tradable quantity");
            return Ok(None);
        }

        OrderEvent::market(signal.ts(), symbol, side, qty).map(Some)
    }

    /// Apply a fill to cash and positions.
    ///
    /// Fills that would overdraw cash are rejected. SELL quantity is clamped to
    /// the current holding; a SELL against a flat position is ignored.
    pub fn on_fill(&mut self, fill: &FillEvent) {
        let symbol = fill.symbol();
        let current = self.position(symbol);

        match fill.side() {
            Side::Buy => {
                let cost = fill.notional() + fill.fee();
                if cost > self.cash + CASH_EPS {
                    tracing::debug!(symbol, cost, cash = self.cash, "buy fill rejected: insufficient cash");
                    self.rejected_fills += 1;
                    return;
                }
                self.cash = (self.cash - cost).max(0.0);
                self.positions.insert(symbol.to_string(), current + fill.qty());
            }
            Side::Sell => {
                let qty = fill.qty().min(current);
                if qty <= 0.0 {
                    tracing::debug!(symbol, "sell fill ignored: no position");
                    self.rejected_fills += 1;
                    return;
                }
                let proceeds = qty * fill.fill_price() - fill.fee();
                if self.cash + proceeds < -CASH_EPS {
                    tracing::debug!(symbol, proceeds, cash = self.cash, "sell fill rejected: fee exceeds cash");
                    self.rejected_fills += 1;
                    return;
                }
                self.cash = (self.cash + proceeds).max(0.0);
                self.positions.insert(symbol.to_string(), current - qty);
            }
        }

        self.total_fees += fill.fee();
        self.fill_count += 1;
    }
}
