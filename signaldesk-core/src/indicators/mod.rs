//! Technical indicators used by the built-in strategies.
//!
//! Indicators are pure functions: bar history in, numeric series out, same
//! length as the input. Warmup values are `f64::NAN`. No value at bar t
//! depends on bars after t.
//!
//! Multi-series indicators (Bollinger, MACD) are exposed as separate
//! instances per output line, keeping the single-series trait unchanged.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bollinger::{Bollinger, BollingerBand};
pub use ema::{ema_of_series, Ema};
pub use macd::{Macd, MacdLine};
pub use rsi::Rsi;
pub use sma::Sma;

use crate::domain::Bar;

pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute over the whole series. The first `lookback()` values are NaN.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Synthetic bars from close prices for tests.
///
/// open = previous close, high/low = max/min(open, close) ± 1, volume = 1000,
/// one bar per hour.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: chrono::DateTime::from_timestamp(i as i64 * 3600, 0).unwrap(),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
