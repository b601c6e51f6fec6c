//! Integration tests for the dispatch loop.
//!
//! Tests:
//! 1. Zero-trade equity flatness over a synthetic series
//! 2. MA crossover round trip through execution and portfolio
//! 3. Costs: commission and slippage land in cash and total_fees
//! 4. Cash-constrained sizing end-to-end
//! 5. Equity history shape: one row per bar, strictly increasing timestamps
//! 6. Bar budget and step-by-step use

use chrono::{Duration, TimeZone, Utc};
use replaylab_core::data::{CsvSource, CsvSourceConfig, SyntheticSource};
use replaylab_core::domain::{MarketEvent, Timestamp};
use replaylab_core::engine::{Engine, EngineConfig};
use replaylab_core::execution::{CommissionModel, ExecutionSimulator, SlippageModel};
use replaylab_core::portfolio::{Portfolio, PortfolioConfig};
use replaylab_core::strategy::{MovingAverageCross, NullStrategy, Strategy};

// ── Helpers ──────────────────────────────────────────────────────────

fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap()
}

fn flat_bars(closes: &[f64]) -> Vec<MarketEvent> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            MarketEvent::new(t0() + Duration::minutes(i as i64), "SPY", c, c, c, c, 1_000.0)
                .unwrap()
        })
        .collect()
}

fn build(
    strategy: Box<dyn Strategy>,
    execution: ExecutionSimulator,
    portfolio: PortfolioConfig,
    config: EngineConfig,
) -> Engine {
    Engine::new(vec![strategy], execution, Portfolio::new(portfolio).unwrap(), config)
}

fn ma(fast: usize, slow: usize) -> Box<dyn Strategy> {
    Box::new(MovingAverageCross::new("SPY", fast, slow).unwrap())
}

const CROSS_CLOSES: [f64; 8] = [10.0, 10.0, 10.0, 20.0, 20.0, 5.0, 5.0, 5.0];

// ── 1. Zero-trade flatness ───────────────────────────────────────────

#[test]
fn null_strategy_equity_is_flat() {
    let source = SyntheticSource::new("SPY", 250, 11, 100.0).unwrap();
    let mut engine = build(
        Box::new(NullStrategy),
        ExecutionSimulator::frictionless(),
        PortfolioConfig::default(),
        EngineConfig::default(),
    );
    let summary = engine.run(source).unwrap();

    assert_eq!(summary.bars, 250);
    assert_eq!(summary.equity_history.len(), 250);
    assert!(summary.equity_history.iter().all(|p| p.equity == 10_000.0 && p.cash == 10_000.0));
    assert_eq!((summary.signals, summary.orders, summary.fills), (0, 0, 0));
    assert_eq!(summary.total_return(), 0.0);
}

// ── 2. Round trip ────────────────────────────────────────────────────

#[test]
fn crossover_round_trip_frictionless() {
    let mut engine = build(
        ma(2, 3),
        ExecutionSimulator::frictionless(),
        PortfolioConfig::default(),
        EngineConfig::default(),
    );
    let summary = engine.run(flat_bars(&CROSS_CLOSES)).unwrap();

    // bar 3 SELL (flat, no order), bar 4 BUY, bar 6 SELL
    assert_eq!(summary.signals, 3);
    assert_eq!(summary.orders, 2);
    assert_eq!(summary.fills, 2);

    // bought 100 @ 20, sold 100 @ 5
    assert_eq!(summary.final_cash, 8_500.0);
    assert_eq!(summary.final_equity, 8_500.0);
    assert_eq!(engine.portfolio().position("SPY"), 0.0);

    let equity: Vec<f64> = summary.equity_history.iter().map(|p| p.equity).collect();
    assert_eq!(
        equity,
        vec![10_000.0, 10_000.0, 10_000.0, 10_000.0, 10_000.0, 8_500.0, 8_500.0, 8_500.0]
    );
    assert_eq!(summary.equity_history[3].cash, 8_000.0);
}

#[test]
fn equity_identity_holds_every_bar() {
    let mut engine = build(
        ma(3, 8),
        ExecutionSimulator::new(SlippageModel::bps(5.0), CommissionModel::per_share(0.01)).unwrap(),
        PortfolioConfig::default(),
        EngineConfig::default(),
    );
    for bar in SyntheticSource::new("SPY", 300, 3, 100.0).unwrap() {
        let close = bar.close();
        engine.step(bar).unwrap();
        let pf = engine.portfolio();
        let expected = pf.cash() + pf.position("SPY") * close;
        let last = pf.equity_history().last().copied().unwrap();
        assert!((last.equity - expected).abs() < 1e-6);
        assert!(pf.cash() >= 0.0);
        assert!(pf.position("SPY") >= 0.0);
    }
}

// ── 3. Costs ─────────────────────────────────────────────────────────

#[test]
fn per_trade_commission_is_charged_on_both_legs() {
    let mut engine = build(
        ma(2, 3),
        ExecutionSimulator::new(SlippageModel::None, CommissionModel::per_trade(1.0)).unwrap(),
        PortfolioConfig::default(),
        EngineConfig::default(),
    );
    let summary = engine.run(flat_bars(&CROSS_CLOSES)).unwrap();

    assert_eq!(summary.total_fees, 2.0);
    assert_eq!(summary.final_cash, 8_498.0);
}

#[test]
fn slippage_moves_fill_prices_against_the_trader() {
    let mut engine = build(
        ma(2, 3),
        ExecutionSimulator::new(SlippageModel::half_spread(0.5), CommissionModel::None).unwrap(),
        PortfolioConfig::default(),
        EngineConfig::default(),
    );
    let summary = engine.run(flat_bars(&CROSS_CLOSES)).unwrap();

    // bought 100 @ 20.5, sold 100 @ 4.5
    assert!((summary.final_cash - 8_400.0).abs() < 1e-9);
}

// ── 4. Cash-constrained sizing ───────────────────────────────────────

#[test]
fn cash_constrained_buy_end_to_end() {
    let mut engine = build(
        ma(1, 2),
        ExecutionSimulator::frictionless(),
        PortfolioConfig::default().with_initial_cash(1_000.0),
        EngineConfig::default(),
    );
    engine.run(flat_bars(&[90.0, 100.0])).unwrap();

    // (1000 - 1) / 100 floored
    assert_eq!(engine.portfolio().position("SPY"), 9.0);
    assert_eq!(engine.portfolio().cash(), 100.0);
}

// ── 5. Equity history shape ──────────────────────────────────────────

#[test]
fn equity_history_is_strictly_increasing() {
    let csv = "timestamp,open,high,low,close,volume\n\
               2024-03-01 09:30,10,10,10,10,1\n\
               2024-03-01 09:31,10,10,10,10,1\n\
               2024-03-01 09:32,10,10,10,10,1\n\
               2024-03-01 09:33,20,20,20,20,1\n\
               2024-03-01 09:34,20,20,20,20,1\n";
    let source = CsvSource::from_reader(csv.as_bytes(), &CsvSourceConfig::new("SPY")).unwrap();
    let mut engine = build(
        ma(2, 3),
        ExecutionSimulator::frictionless(),
        PortfolioConfig::default(),
        EngineConfig::default(),
    );
    let summary = engine.run(source).unwrap();

    assert_eq!(summary.equity_history.len(), 5);
    assert!(summary.equity_history.windows(2).all(|w| w[0].ts < w[1].ts));
}

// ── 6. Budget and incremental use ────────────────────────────────────

#[test]
fn bar_budget_truncates_replay() {
    let mut engine = build(
        ma(2, 3),
        ExecutionSimulator::frictionless(),
        PortfolioConfig::default(),
        EngineConfig::with_max_bars(4),
    );
    let summary = engine.run(flat_bars(&CROSS_CLOSES)).unwrap();

    assert_eq!(summary.bars, 4);
    assert_eq!(summary.equity_history.len(), 4);
    assert_eq!(engine.portfolio().position("SPY"), 100.0);
}

#[test]
fn step_matches_run() {
    let bars = flat_bars(&CROSS_CLOSES);

    let mut stepped = build(
        ma(2, 3),
        ExecutionSimulator::frictionless(),
        PortfolioConfig::default(),
        EngineConfig::default(),
    );
    for bar in bars.clone() {
        stepped.step(bar).unwrap();
    }

    let mut ran = build(
        ma(2, 3),
        ExecutionSimulator::frictionless(),
        PortfolioConfig::default(),
        EngineConfig::default(),
    );
    let summary = ran.run(bars).unwrap();

    assert_eq!(stepped.summary(), summary);
}
