//! ReplayLab Core: event model, event queue, dispatch loop, execution, portfolio.
//!
//! This crate contains the event-driven simulation engine:
//! - Immutable, validated events (Market, Signal, Order, Fill)
//! - FIFO event queue and the single-threaded dispatch loop
//! - Execution simulator with slippage and commission models
//! - Long-only portfolio with cash and quantity limits
//! - Strategy trait and a moving-average crossover
//! - CSV and synthetic bar sources

pub mod data;
pub mod domain;
pub mod engine;
pub mod execution;
pub mod portfolio;
pub mod strategy;
