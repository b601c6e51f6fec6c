//! Performance metrics over an equity series.
//!
//! Every metric is a pure function: equity in, scalar out. Per-bar returns
//! are annualised with a caller-supplied `periods_per_year`.

use serde::{Deserialize, Serialize};

/// Aggregate performance metrics for one replay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    /// Largest peak-to-trough decline, as a non-positive fraction.
    pub max_drawdown: f64,
    pub volatility: f64,
    pub sharpe: f64,
    pub bar_count: usize,
}

impl PerformanceMetrics {
    pub fn compute(equity: &[f64], periods_per_year: f64) -> Self {
        Self {
            total_return: total_return(equity),
            max_drawdown: max_drawdown(equity),
            volatility: volatility(equity, periods_per_year),
            sharpe: sharpe_ratio(equity, periods_per_year),
            bar_count: equity.len(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// (final - initial) / initial. Zero for fewer than two points or a
/// non-positive start.
pub fn total_return(equity: &[f64]) -> f64 {
    match (equity.first(), equity.last()) {
        (Some(&first), Some(&last)) if equity.len() >= 2 && first > 0.0 => (last - first) / first,
        _ => 0.0,
    }
}

/// Running drawdown from the high-water mark at each point.
pub fn drawdown_series(equity: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    equity
        .iter()
        .map(|&eq| {
            peak = peak.max(eq);
            if peak > 0.0 {
                (eq - peak) / peak
            } else {
                0.0
            }
        })
        .collect()
}

/// Worst drawdown as a negative fraction (0.0 if equity never falls).
pub fn max_drawdown(equity: &[f64]) -> f64 {
    drawdown_series(equity).into_iter().fold(0.0, f64::min)
}

/// Simple per-bar returns. Bars following a non-positive value yield 0.
pub fn returns(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

/// Annualised standard deviation of per-bar returns.
pub fn volatility(equity: &[f64], periods_per_year: f64) -> f64 {
    std_dev(&returns(equity)) * periods_per_year.sqrt()
}

/// Annualised Sharpe ratio with a zero risk-free rate.
///
/// Returns 0.0 when returns have no dispersion.
pub fn sharpe_ratio(equity: &[f64], periods_per_year: f64) -> f64 {
    let rets = returns(equity);
    let std = std_dev(&rets);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(&rets) / std * periods_per_year.sqrt()
}

pub fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}
