//! Seeded random-walk bars for demos, benches, and tests.

use chrono::{Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{EventError, MarketEvent, Timestamp};

/// Maximum per-bar close-to-close move.
const MAX_STEP: f64 = 0.01;
/// Maximum wick beyond the open/close body.
const MAX_WICK: f64 = 0.002;

/// Deterministic one-minute bars: same seed, same series.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    bars: Vec<MarketEvent>,
}

impl SyntheticSource {
    pub fn new(
        symbol: impl Into<String>,
        bars: usize,
        seed: u64,
        start_price: f64,
    ) -> Result<Self, EventError> {
        let symbol = symbol.into();
        let mut rng = StdRng::seed_from_u64(seed);
        let start = Self::start_ts();
        let mut close = start_price;
        let mut out = Vec::with_capacity(bars);

        for i in 0..bars {
            let open = close;
            close = open * (1.0 + rng.gen_range(-MAX_STEP..MAX_STEP));
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..MAX_WICK));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..MAX_WICK));
            let volume = rng.gen_range(1_000.0..10_000.0_f64).round();
            let ts = start + Duration::minutes(i as i64);
            out.push(MarketEvent::new(ts, symbol.as_str(), open, high, low, close, volume)?);
        }

        Ok(Self { bars: out })
    }

    /// First bar timestamp: 2024-01-02 14:30 UTC (US cash open).
    pub fn start_ts() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0)
            .single()
            .unwrap_or_default()
    }

    pub fn bars(&self) -> &[MarketEvent] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

impl IntoIterator for SyntheticSource {
    type Item = MarketEvent;
    type IntoIter = std::vec::IntoIter<MarketEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.into_iter()
    }
}
