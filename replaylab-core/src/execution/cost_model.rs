//! Cost models: slippage and commission calculation.
//!
//! Slippage is directional: buyers pay more (higher price), sellers receive less (lower price).
//! Commission is a fee in account currency computed from the slipped fill price.
//! Both models are immutable values; every call is a pure function of its arguments.

use crate::domain::Side;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CostModelError {
    #[error("{model} model: {field} must be a finite number >= 0, got {value}")]
    InvalidParameter {
        model: &'static str,
        field: &'static str,
        value: f64,
    },
}

fn check_param(model: &'static str, field: &'static str, value: f64) -> Result<(), CostModelError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CostModelError::InvalidParameter { model, field, value });
    }
    Ok(())
}

/// Commission charged per fill, selected by the `model` field.
///
/// Defaults to [`CommissionModel::None`] when unset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum CommissionModel {
    /// Fixed fee per trade regardless of size.
    PerTrade {
        #[serde(default)]
        per_trade_fee: f64,
    },
    /// Fraction of notional traded (0.0005 = 5 bps).
    Percent {
        #[serde(default)]
        percent_rate: f64,
    },
    /// Fee per share/unit traded.
    PerShare {
        #[serde(default)]
        per_share_fee: f64,
    },
    #[default]
    None,
}

impl CommissionModel {
    pub fn per_trade(fee: f64) -> Self {
        Self::PerTrade { per_trade_fee: fee }
    }

    pub fn percent(rate: f64) -> Self {
        Self::Percent { percent_rate: rate }
    }

    pub fn per_share(fee: f64) -> Self {
        Self::PerShare { per_share_fee: fee }
    }

    pub fn validate(&self) -> Result<(), CostModelError> {
        match *self {
            Self::PerTrade { per_trade_fee } => check_param("per_trade", "per_trade_fee", per_trade_fee),
            Self::Percent { percent_rate } => check_param("percent", "percent_rate", percent_rate),
            Self::PerShare { per_share_fee } => check_param("per_share", "per_share_fee", per_share_fee),
            Self::None => Ok(()),
        }
    }

    /// Fee for a fill of `qty` units at `price`.
    pub fn calculate(&self, qty: f64, price: f64) -> f64 {
        let qty = qty.abs();
        match *self {
            Self::PerTrade { per_trade_fee } => per_trade_fee,
            Self::Percent { percent_rate } => qty * price * percent_rate,
            Self::PerShare { per_share_fee } => qty * per_share_fee,
            Self::None => 0.0,
        }
    }
}

/// Price adjustment applied to the reference fill price, selected by the `model` field.
///
/// Defaults to [`SlippageModel::None`] when unset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum SlippageModel {
    /// Basis points of price (1 bp = 0.01%).
    Bps {
        #[serde(default)]
        bps: f64,
    },
    /// Fixed half-spread in price units.
    HalfSpread {
        #[serde(default)]
        half_spread: f64,
    },
    #[default]
    None,
}

impl SlippageModel {
    pub fn bps(bps: f64) -> Self {
        Self::Bps { bps }
    }

    pub fn half_spread(half_spread: f64) -> Self {
        Self::HalfSpread { half_spread }
    }

    pub fn validate(&self) -> Result<(), CostModelError> {
        match *self {
            Self::Bps { bps } => check_param("bps", "bps", bps),
            Self::HalfSpread { half_spread } => check_param("half_spread", "half_spread", half_spread),
            Self::None => Ok(()),
        }
    }

    /// Adjust `price` against the trader: BUY pays more, SELL receives less.
    pub fn apply(&self, side: Side, price: f64) -> f64 {
        match *self {
            Self::Bps { bps } => {
                let adj = bps / 10_000.0;
                match side {
                    Side::Buy => price * (1.0 + adj),
                    Side::Sell => price * (1.0 - adj),
                }
            }
            Self::HalfSpread { half_spread } => match side {
                Side::Buy => price + half_spread,
                Side::Sell => price - half_spread,
            },
            Self::None => price,
        }
    }
}
