//! Execution simulator: turns orders into fills against the last observed close.
//!
//! Market orders fill at the last close. Limit orders are immediate-or-cancel:
//! a marketable limit fills at the limit price, anything else is dropped and
//! never retried. The reference price is then slipped and charged commission.

use std::collections::HashMap;

use crate::domain::{EventError, FillEvent, MarketEvent, OrderEvent, OrderType, Side};

use super::cost_model::{CommissionModel, CostModelError, SlippageModel};

/// Converts [`OrderEvent`]s into [`FillEvent`]s.
///
/// Keeps its own last-price cache, independent of the portfolio's.
#[derive(Debug, Clone, Default)]
pub struct ExecutionSimulator {
    slippage: SlippageModel,
    commission: CommissionModel,
    last_price: HashMap<String, f64>,
}

impl ExecutionSimulator {
    pub fn new(slippage: SlippageModel, commission: CommissionModel) -> Result<Self, CostModelError> {
        slippage.validate()?;
        commission.validate()?;
        Ok(Self {
            slippage,
            commission,
            last_price: HashMap::new(),
        })
    }

    /// No slippage, no commission.
    pub fn frictionless() -> Self {
        Self::default()
    }

    pub fn slippage(&self) -> SlippageModel {
        self.slippage
    }

    pub fn commission(&self) -> CommissionModel {
        self.commission
    }

    pub fn last_price(&self, symbol: &str) -> Option<f64> {
        self.last_price.get(symbol).copied()
    }

    pub fn on_market(&mut self, event: &MarketEvent) {
        self.last_price.insert(event.symbol().to_string(), event.close());
    }

    /// Evaluate an order once. Returns `Ok(None)` when the order is dropped
    /// (no price observed yet, or a limit that is not marketable).
    pub fn on_order(&self, order: &OrderEvent) -> Result<Option<FillEvent>, EventError> {
        let Some(last) = self.last_price(order.symbol()) else {
            tracing::debug!(symbol = order.symbol(), "order dropped: no market price yet");
            return Ok(None);
        };

        let reference = match (order.order_type(), order.limit_price()) {
            (OrderType::Market, _) => last,
            (OrderType::Limit, Some(limit)) => {
                let marketable = match order.side() {
                    Side::Buy => last <= limit,
                    Side::Sell => last >= limit,
                };
                if !marketable {
                    tracing::debug!(
                        symbol = order.symbol(),
                        side = %order.side(),
                        limit,
                        last,
                        "limit order not marketable, cancelled"
                    );
                    return Ok(None);
                }
                limit
            }
            (OrderType::Limit, None) => return Err(EventError::MissingLimitPrice),
        };

        let price = self.slippage.apply(order.side(), reference);
        let fee = self.commission.calculate(order.qty(), price);

        FillEvent::new(order.ts(), order.symbol(), order.side(), order.qty(), price, fee).map(Some)
    }
}
