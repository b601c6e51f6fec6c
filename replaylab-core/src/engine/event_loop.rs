//! Event loop: pushes one bar at a time and drains the queue until quiet.
//!
//! Dispatch by tag:
//!
//! - Market → portfolio price, execution price, every strategy (in order)
//! - Signal → portfolio sizing
//! - Order  → execution
//! - Fill   → portfolio booking
//!
//! The equity row for a bar is recorded after its queue is empty.

use thiserror::Error;

use crate::domain::{Event, EventError, EventKind, MarketEvent, Timestamp};
use crate::execution::ExecutionSimulator;
use crate::portfolio::Portfolio;
use crate::strategy::Strategy;

use super::queue::EventQueue;
use super::state::{EngineConfig, RunCounters, RunSummary};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("bar timestamp {current} is not after previous bar {previous}")]
    NonMonotonicTimestamp {
        previous: Timestamp,
        current: Timestamp,
    },

    #[error("bar budget of {max_bars} already spent")]
    BudgetExhausted { max_bars: usize },

    #[error("failed to handle {kind} event: {source}")]
    Dispatch {
        kind: EventKind,
        #[source]
        source: EventError,
    },
}

/// Owns the queue and the three handlers, and drives them bar by bar.
pub struct Engine {
    strategies: Vec<Box<dyn Strategy>>,
    execution: ExecutionSimulator,
    portfolio: Portfolio,
    queue: EventQueue,
    config: EngineConfig,
    counters: RunCounters,
    last_ts: Option<Timestamp>,
}

impl Engine {
    pub fn new(
        strategies: Vec<Box<dyn Strategy>>,
        execution: ExecutionSimulator,
        portfolio: Portfolio,
        config: EngineConfig,
    ) -> Self {
        Self {
            strategies,
            execution,
            portfolio,
            queue: EventQueue::new(),
            config,
            counters: RunCounters::default(),
            last_ts: None,
        }
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn execution(&self) -> &ExecutionSimulator {
        &self.execution
    }

    pub fn counters(&self) -> RunCounters {
        self.counters
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    fn budget_reached(&self) -> bool {
        self.config
            .max_bars
            .is_some_and(|max| self.counters.bars >= max)
    }

    /// Replay `source` until it is exhausted or the bar budget is spent.
    pub fn run(
        &mut self,
        source: impl IntoIterator<Item = MarketEvent>,
    ) -> Result<RunSummary, EngineError> {
        let names: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        tracing::info!(strategies = ?names, max_bars = ?self.config.max_bars, "replay started");

        // budget is checked before pulling so an unused bar stays in the source
        let mut source = source.into_iter();
        while !self.budget_reached() {
            let Some(bar) = source.next() else { break };
            self.step(bar)?;
        }
        if self.budget_reached() {
            let dropped = self.queue.clear();
            tracing::info!(bars = self.counters.bars, dropped, "bar budget reached");
        }

        let summary = self.summary();
        tracing::info!(
            bars = summary.bars,
            signals = summary.signals,
            orders = summary.orders,
            fills = summary.fills,
            final_equity = summary.final_equity,
            "replay finished"
        );
        Ok(summary)
    }

    /// Process a single bar: enqueue it, drain every consequence, record equity.
    ///
    /// Fails with `BudgetExhausted` once `max_bars` bars have been processed.
    pub fn step(&mut self, bar: MarketEvent) -> Result<(), EngineError> {
        if let Some(max_bars) = self.config.max_bars.filter(|&max| self.counters.bars >= max) {
            return Err(EngineError::BudgetExhausted { max_bars });
        }
        let ts = bar.ts();
        if let Some(previous) = self.last_ts {
            if ts <= previous {
                return Err(EngineError::NonMonotonicTimestamp {
                    previous,
                    current: ts,
                });
            }
        }

        self.queue.put(bar);
        while let Some(event) = self.queue.get() {
            if let Err(err) = self.dispatch(event) {
                self.queue.clear();
                return Err(err);
            }
        }

        self.portfolio.update_timeindex(ts);
        self.last_ts = Some(ts);
        self.counters.bars += 1;
        Ok(())
    }

    fn dispatch(&mut self, event: Event) -> Result<(), EngineError> {
        let kind = event.kind();
        let wrap = |source: EventError| EngineError::Dispatch { kind, source };

        match event {
            Event::Market(bar) => {
                self.portfolio.update_market_price(bar.symbol(), bar.close());
                self.execution.on_market(&bar);
                for strategy in self.strategies.iter_mut() {
                    for signal in strategy.on_market(&bar).map_err(wrap)? {
                        self.counters.signals += 1;
                        self.queue.put(signal);
                    }
                }
            }
            Event::Signal(signal) => {
                if let Some(order) = self.portfolio.on_signal(&signal).map_err(wrap)? {
                    self.counters.orders += 1;
                    self.queue.put(order);
                }
            }
            Event::Order(order) => {
                if let Some(fill) = self.execution.on_order(&order).map_err(wrap)? {
                    self.counters.fills += 1;
                    self.queue.put(fill);
                }
            }
            Event::Fill(fill) => self.portfolio.on_fill(&fill),
        }
        Ok(())
    }

    /// Snapshot of counters, cash, equity and the equity curve so far.
    pub fn summary(&self) -> RunSummary {
        let pf = &self.portfolio;
        RunSummary {
            bars: self.counters.bars,
            signals: self.counters.signals,
            orders: self.counters.orders,
            fills: self.counters.fills,
            rejected_fills: pf.rejected_fills(),
            total_fees: pf.total_fees(),
            initial_cash: pf.config().initial_cash,
            final_cash: pf.cash(),
            final_equity: pf.total_value(),
            equity_history: pf.equity_history().to_vec(),
        }
    }
}
