//! Backtesting engine: event queue and the single-threaded dispatch loop.
//!
//! One market bar enters the queue at a time. Handlers return the events they
//! emit and the loop enqueues them, so every consequence of a bar
//! (Signal → Order → Fill → booking) is resolved before the next bar arrives.

pub mod event_loop;
pub mod queue;
pub mod state;

pub use event_loop::{Engine, EngineError};
pub use queue::EventQueue;
pub use state::{EngineConfig, RunCounters, RunSummary};
