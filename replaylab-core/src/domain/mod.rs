//! Domain types for ReplayLab

pub mod equity;
pub mod event;

pub use equity::EquityPoint;
pub use event::{
    Event, EventError, EventKind, FillEvent, MarketEvent, OrderEvent, SignalEvent,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp used on every event: an absolute instant in UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Direction of a signal, order or fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type. Market orders fill at the last observed close,
/// limit orders only at the limit price when it is marketable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    #[serde(rename = "MKT")]
    Market,
    #[serde(rename = "LMT")]
    Limit,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "MKT"),
            OrderType::Limit => write!(f, "LMT"),
        }
    }
}
