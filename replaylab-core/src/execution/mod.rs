//! Execution: fill simulation and trading cost models.

pub mod cost_model;
pub mod simulator;

pub use cost_model::{CommissionModel, CostModelError, SlippageModel};
pub use simulator::ExecutionSimulator;
