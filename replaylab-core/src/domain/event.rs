//! Event model: the four immutable event variants that flow through the queue.
//!
//! Every event is validated exactly once, in its constructor. Fields are private
//! and only exposed through accessors, so an event that exists is an event that
//! passed validation. Handlers never mutate an event; they consume it and emit
//! new ones.

use super::{OrderType, Side, Timestamp};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Tag of an event variant, used for dispatch diagnostics and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Market,
    Signal,
    Order,
    Fill,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Market => "MARKET",
            EventKind::Signal => "SIGNAL",
            EventKind::Order => "ORDER",
            EventKind::Fill => "FILL",
        };
        f.write_str(name)
    }
}

/// Construction-time validation failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventError {
    #[error("{kind} event: symbol must be a non-empty string")]
    EmptySymbol { kind: EventKind },

    #[error("unrecognized timestamp format: {raw:?}")]
    InvalidTimestamp { raw: String },

    #[error("{kind} event: {field} must be a finite number, got {value}")]
    NonFinite {
        kind: EventKind,
        field: &'static str,
        value: f64,
    },

    #[error("{kind} event: {field} must be > 0, got {value}")]
    NonPositive {
        kind: EventKind,
        field: &'static str,
        value: f64,
    },

    #[error("{kind} event: {field} must be >= 0, got {value}")]
    Negative {
        kind: EventKind,
        field: &'static str,
        value: f64,
    },

    #[error("ORDER event: limit_price is required for LMT orders")]
    MissingLimitPrice,

    #[error("ORDER event: limit_price is not allowed for MKT orders, got {0}")]
    UnexpectedLimitPrice(f64),
}

fn check_symbol(kind: EventKind, symbol: String) -> Result<String, EventError> {
    if symbol.trim().is_empty() {
        return Err(EventError::EmptySymbol { kind });
    }
    Ok(symbol)
}

fn check_finite(kind: EventKind, field: &'static str, value: f64) -> Result<f64, EventError> {
    if !value.is_finite() {
        return Err(EventError::NonFinite { kind, field, value });
    }
    Ok(value)
}

fn check_positive(kind: EventKind, field: &'static str, value: f64) -> Result<f64, EventError> {
    let value = check_finite(kind, field, value)?;
    if value <= 0.0 {
        return Err(EventError::NonPositive { kind, field, value });
    }
    Ok(value)
}

fn check_non_negative(kind: EventKind, field: &'static str, value: f64) -> Result<f64, EventError> {
    let value = check_finite(kind, field, value)?;
    if value < 0.0 {
        return Err(EventError::Negative { kind, field, value });
    }
    Ok(value)
}

/// One OHLCV bar for one symbol.
///
/// Prices must be finite and positive and volume non-negative. The OHLC
/// relationship (`high >= max(open, close)` etc.) is deliberately not enforced
/// here; see [`MarketEvent::is_sane`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketEvent {
    ts: Timestamp,
    symbol: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl MarketEvent {
    pub fn new(
        ts: Timestamp,
        symbol: impl Into<String>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, EventError> {
        let kind = EventKind::Market;
        Ok(Self {
            ts,
            symbol: check_symbol(kind, symbol.into())?,
            open: check_positive(kind, "open", open)?,
            high: check_positive(kind, "high", high)?,
            low: check_positive(kind, "low", low)?,
            close: check_positive(kind, "close", close)?,
            volume: check_non_negative(kind, "volume", volume)?,
        })
    }

    pub fn ts(&self) -> Timestamp {
        self.ts
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn open(&self) -> f64 {
        self.open
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn close(&self) -> f64 {
        self.close
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// OHLC sanity: high >= max(open, close), low <= min(open, close), high >= low.
    pub fn is_sane(&self) -> bool {
        self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
            && self.high >= self.low
    }
}

/// Directional intent emitted by a strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalEvent {
    ts: Timestamp,
    symbol: String,
    side: Side,
    strength: Option<f64>,
}

impl SignalEvent {
    pub fn new(
        ts: Timestamp,
        symbol: impl Into<String>,
        side: Side,
        strength: Option<f64>,
    ) -> Result<Self, EventError> {
        let kind = EventKind::Signal;
        let strength = strength
            .map(|s| check_positive(kind, "strength", s))
            .transpose()?;
        Ok(Self {
            ts,
            symbol: check_symbol(kind, symbol.into())?,
            side,
            strength,
        })
    }

    pub fn ts(&self) -> Timestamp {
        self.ts
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn strength(&self) -> Option<f64> {
        self.strength
    }
}

/// Order request produced by the portfolio.
///
/// `limit_price` is present if and only if the order type is [`OrderType::Limit`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderEvent {
    ts: Timestamp,
    symbol: String,
    side: Side,
    qty: f64,
    order_type: OrderType,
    limit_price: Option<f64>,
}

impl OrderEvent {
    pub fn new(
        ts: Timestamp,
        symbol: impl Into<String>,
        side: Side,
        qty: f64,
        order_type: OrderType,
        limit_price: Option<f64>,
    ) -> Result<Self, EventError> {
        let kind = EventKind::Order;
        let symbol = check_symbol(kind, symbol.into())?;
        let qty = check_positive(kind, "qty", qty)?;
        let limit_price = match (order_type, limit_price) {
            (OrderType::Limit, Some(px)) => Some(check_positive(kind, "limit_price", px)?),
            (OrderType::Limit, None) => return Err(EventError::MissingLimitPrice),
            (OrderType::Market, Some(px)) => return Err(EventError::UnexpectedLimitPrice(px)),
            (OrderType::Market, None) => None,
        };
        Ok(Self {
            ts,
            symbol,
            side,
            qty,
            order_type,
            limit_price,
        })
    }

    pub fn market(
        ts: Timestamp,
        symbol: impl Into<String>,
        side: Side,
        qty: f64,
    ) -> Result<Self, EventError> {
        Self::new(ts, symbol, side, qty, OrderType::Market, None)
    }

    pub fn limit(
        ts: Timestamp,
        symbol: impl Into<String>,
        side: Side,
        qty: f64,
        limit_price: f64,
    ) -> Result<Self, EventError> {
        Self::new(ts, symbol, side, qty, OrderType::Limit, Some(limit_price))
    }

    pub fn ts(&self) -> Timestamp {
        self.ts
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn qty(&self) -> f64 {
        self.qty
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn limit_price(&self) -> Option<f64> {
        self.limit_price
    }
}

/// Executed trade reported by the execution simulator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillEvent {
    ts: Timestamp,
    symbol: String,
    side: Side,
    qty: f64,
    fill_price: f64,
    fee: f64,
}

impl FillEvent {
    pub fn new(
        ts: Timestamp,
        symbol: impl Into<String>,
        side: Side,
        qty: f64,
        fill_price: f64,
        fee: f64,
    ) -> Result<Self, EventError> {
        let kind = EventKind::Fill;
        Ok(Self {
            ts,
            symbol: check_symbol(kind, symbol.into())?,
            side,
            qty: check_positive(kind, "qty", qty)?,
            fill_price: check_positive(kind, "fill_price", fill_price)?,
            fee: check_non_negative(kind, "fee", fee)?,
        })
    }

    pub fn ts(&self) -> Timestamp {
        self.ts
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn qty(&self) -> f64 {
        self.qty
    }

    pub fn fill_price(&self) -> f64 {
        self.fill_price
    }

    pub fn fee(&self) -> f64 {
        self.fee
    }

    /// qty × fill_price, before fees.
    pub fn notional(&self) -> f64 {
        self.qty * self.fill_price
    }
}

/// Tagged union of everything that can sit in the event queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    Market(MarketEvent),
    Signal(SignalEvent),
    Order(OrderEvent),
    Fill(FillEvent),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Market(_) => EventKind::Market,
            Event::Signal(_) => EventKind::Signal,
            Event::Order(_) => EventKind::Order,
            Event::Fill(_) => EventKind::Fill,
        }
    }

    pub fn ts(&self) -> Timestamp {
        match self {
            Event::Market(e) => e.ts(),
            Event::Signal(e) => e.ts(),
            Event::Order(e) => e.ts(),
            Event::Fill(e) => e.ts(),
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Event::Market(e) => e.symbol(),
            Event::Signal(e) => e.symbol(),
            Event::Order(e) => e.symbol(),
            Event::Fill(e) => e.symbol(),
        }
    }
}

impl From<MarketEvent> for Event {
    fn from(e: MarketEvent) -> Self {
        Event::Market(e)
    }
}

impl From<SignalEvent> for Event {
    fn from(e: SignalEvent) -> Self {
        Event::Signal(e)
    }
}

impl From<OrderEvent> for Event {
    fn from(e: OrderEvent) -> Self {
        Event::Order(e)
    }
}

impl From<FillEvent> for Event {
    fn from(e: FillEvent) -> Self {
        Event::Fill(e)
    }
}
