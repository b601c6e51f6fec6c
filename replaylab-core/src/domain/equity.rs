use super::Timestamp;
use serde::{Deserialize, Serialize};

/// One row of the equity curve, recorded once per processed bar after all
/// same-bar events have settled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub ts: Timestamp,
    pub equity: f64,
    pub cash: f64,
}

impl EquityPoint {
    /// Mark-to-market value of open positions at this point.
    pub fn holdings_value(&self) -> f64 {
        self.equity - self.cash
    }
}
