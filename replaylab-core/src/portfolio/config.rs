use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortfolioError {
    #[error("portfolio config: {field} must be a finite number >= 0, got {value}")]
    InvalidParameter { field: &'static str, value: f64 },
}

/// Sizing and risk limits for a [`super::Portfolio`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    pub initial_cash: f64,
    /// Position a BUY signal aims for.
    pub target_qty: f64,
    /// Hard cap on any single position.
    pub max_qty: f64,
    /// Fee reserved out of cash when sizing a BUY.
    pub est_fee_per_trade: f64,
    /// Allow fractional BUY quantities. When false, buys are floored to whole units.
    pub fractional: bool,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            initial_cash: 10_000.0,
            target_qty: 100.0,
            max_qty: 200.0,
            est_fee_per_trade: 1.0,
            fractional: false,
        }
    }
}

impl PortfolioConfig {
    pub fn with_initial_cash(mut self, initial_cash: f64) -> Self {
        self.initial_cash = initial_cash;
        self
    }

    pub fn validate(&self) -> Result<(), PortfolioError> {
        for (field, value) in [
            ("initial_cash", self.initial_cash),
            ("target_qty", self.target_qty),
            ("max_qty", self.max_qty),
            ("est_fee_per_trade", self.est_fee_per_trade),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PortfolioError::InvalidParameter { field, value });
            }
        }
        Ok(())
    }
}
