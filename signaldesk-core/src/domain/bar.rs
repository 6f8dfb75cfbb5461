//! Candle data fed to strategies and the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV candle. The engine trades on `close`; the other fields feed
/// strategy filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Candle open time.
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// A candle where every price is `price`.
    pub fn flat(timestamp: DateTime<Utc>, price: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
        }
    }

    /// Prices bracket each other the way a real candle does and nothing is NaN.
    pub fn is_sane(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().chain([&self.volume]).any(|v| !v.is_finite()) {
            return false;
        }
        let body_top = self.open.max(self.close);
        let body_bottom = self.open.min(self.close);
        self.high >= body_top && body_bottom >= self.low && self.low >= 0.0 && self.volume >= 0.0
    }

    /// Wilder's true range: the candle range extended to the previous close.
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        let range = self.high - self.low;
        match prev_close {
            Some(prev) => range
                .max((self.high - prev).abs())
                .max((self.low - prev).abs()),
            None => range,
        }
    }
}
