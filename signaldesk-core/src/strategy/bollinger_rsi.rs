//! Volatility breakout: close outside a Bollinger band, confirmed by RSI,
//! elevated true-range volatility and above-average volume.
//!
//! BUY: close < lower band and RSI < oversold. SELL: close > upper band and
//! RSI > overbought. Both require true range % > min_volatility × its
//! rolling mean and volume > its rolling mean (over `filter_window` bars).

use crate::domain::{Bar, Signal};
use crate::indicators::sma::sma_of_series;
use crate::indicators::{Bollinger, Indicator, Rsi};

use super::{all_valid, SignalGenerator};

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerRsi {
    pub period: usize,
    pub std_multiplier: f64,
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub min_volatility: f64,
    pub filter_window: usize,
}

impl Default for BollingerRsi {
    fn default() -> Self {
        Self {
            period: 20,
            std_multiplier: 2.0,
            rsi_period: 14,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            min_volatility: 1.5,
            filter_window: 24,
        }
    }
}

/// True range as a percent of close. The first bar uses high - low.
fn true_range_pct(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let prev_close = i.checked_sub(1).map(|p| bars[p].close);
            bar.true_range(prev_close) / bar.close * 100.0
        })
        .collect()
}

impl SignalGenerator for BollingerRsi {
    fn name(&self) -> &str {
        "bollinger_rsi"
    }

    fn generate(&self, bars: &[Bar]) -> Vec<Signal> {
        let upper = Bollinger::upper(self.period, self.std_multiplier).compute(bars);
        let lower = Bollinger::lower(self.period, self.std_multiplier).compute(bars);
        let rsi = Rsi::new(self.rsi_period).compute(bars);

        let volatility = true_range_pct(bars);
        let avg_volatility = sma_of_series(&volatility, self.filter_window);
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
        let avg_volume = sma_of_series(&volumes, self.filter_window);

        bars.iter()
            .enumerate()
            .map(|(i, bar)| {
                if !all_valid(&[upper[i], lower[i], rsi[i], avg_volatility[i], avg_volume[i]]) {
                    return Signal::Hold;
                }
                let active = volatility[i] > avg_volatility[i] * self.min_volatility
                    && bar.volume > avg_volume[i];
                if !active {
                    Signal::Hold
                } else if bar.close < lower[i] && rsi[i] < self.rsi_oversold {
                    Signal::Buy
                } else if bar.close > upper[i] && rsi[i] > self.rsi_overbought {
                    Signal::Sell
                } else {
                    Signal::Hold
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    /// 30 quiet bars at 100, then one high-volume shock to `shock_close`.
    fn shock(shock_close: f64, shock_volume: f64) -> Vec<Bar> {
        let mut closes = vec![100.0; 30];
        closes.push(shock_close);
        let mut bars = make_bars(&closes);
        bars[30].volume = shock_volume;
        bars
    }

    #[test]
    fn crash_on_volume_buys() {
        let signals = BollingerRsi::default().generate(&shock(80.0, 5000.0));
        assert_eq!(signals[30], Signal::Buy);
        assert!(signals[..30].iter().all(|s| *s == Signal::Hold));
    }

    #[test]
    fn spike_on_volume_sells() {
        let signals = BollingerRsi::default().generate(&shock(120.0, 5000.0));
        assert_eq!(signals[30], Signal::Sell);
    }

    #[test]
    fn crash_without_volume_holds() {
        let signals = BollingerRsi::default().generate(&shock(80.0, 1000.0));
        assert_eq!(signals[30], Signal::Hold);
    }

    #[test]
    fn first_bar_true_range_is_high_low() {
        let bars = make_bars(&[100.0, 100.0]);
        let tr = true_range_pct(&bars);
        assert!((tr[0] - 2.0).abs() < 1e-9);
    }
}
