//! MACD crossover in the direction of the long-term EMA trend, RSI-filtered.
//!
//! BUY: close > EMA(trend) and MACD crosses above its signal line and RSI > oversold.
//! SELL: close < EMA(trend) and MACD crosses below its signal line and RSI < overbought.

use crate::domain::{Bar, Signal};
use crate::indicators::{ema_of_series, Indicator, Macd, MacdLine, Rsi};

use super::{all_valid, crossed_above, crossed_below, SignalGenerator};

#[derive(Debug, Clone, PartialEq)]
pub struct MacdEma {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
    pub trend_period: usize,
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
}

impl Default for MacdEma {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
            trend_period: 200,
            rsi_period: 14,
            rsi_oversold: 40.0,
            rsi_overbought: 60.0,
        }
    }
}

impl SignalGenerator for MacdEma {
    fn name(&self) -> &str {
        "macd_ema"
    }

    fn generate(&self, bars: &[Bar]) -> Vec<Signal> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let macd = Macd::new(self.fast, self.slow, self.signal, MacdLine::Line).compute_all(bars);
        let trend = ema_of_series(&closes, self.trend_period);
        let rsi = Rsi::new(self.rsi_period).compute(bars);

        (0..bars.len())
            .map(|i| {
                if !all_valid(&[trend[i], rsi[i]]) {
                    return Signal::Hold;
                }
                let close = closes[i];
                if close > trend[i]
                    && crossed_above(&macd.line, &macd.signal, i)
                    && rsi[i] > self.rsi_oversold
                {
                    Signal::Buy
                } else if close < trend[i]
                    && crossed_below(&macd.line, &macd.signal, i)
                    && rsi[i] < self.rsi_overbought
                {
                    Signal::Sell
                } else {
                    Signal::Hold
                }
            })
            .collect()
    }
}
