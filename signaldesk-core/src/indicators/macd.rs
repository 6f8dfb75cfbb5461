//! Moving Average Convergence Divergence (MACD).
//!
//! - Line: EMA(close, fast) - EMA(close, slow)
//! - Signal: EMA(line, signal)
//! - Histogram: line - signal
//!
//! Lookback: slow - 1 for the line, slow + signal - 2 for the others.

use crate::domain::Bar;

use super::ema::ema_of_series;
use super::Indicator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Line,
    Signal,
    Histogram,
}

/// All three MACD outputs computed in one pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    output: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, output: MacdLine) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be < slow period");
        let suffix = match output {
            MacdLine::Line => "line",
            MacdLine::Signal => "signal",
            MacdLine::Histogram => "hist",
        };
        Self {
            fast,
            slow,
            signal,
            output,
            name: format!("macd_{suffix}_{fast}_{slow}_{signal}"),
        }
    }

    /// Line, signal and histogram together.
    pub fn compute_all(&self, bars: &[Bar]) -> MacdSeries {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let fast = ema_of_series(&closes, self.fast);
        let slow = ema_of_series(&closes, self.slow);

        let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = ema_of_series(&line, self.signal);
        let histogram = line.iter().zip(&signal).map(|(l, s)| l - s).collect();

        MacdSeries {
            line,
            signal,
            histogram,
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.output {
            MacdLine::Line => self.slow - 1,
            MacdLine::Signal | MacdLine::Histogram => self.slow + self.signal - 2,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let all = self.compute_all(bars);
        match self.output {
            MacdLine::Line => all.line,
            MacdLine::Signal => all.signal,
            MacdLine::Histogram => all.histogram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    fn rising(n: usize) -> Vec<Bar> {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        make_bars(&closes)
    }

    #[test]
    fn warmup_matches_lookback() {
        let bars = rising(20);
        for output in [MacdLine::Line, MacdLine::Signal, MacdLine::Histogram] {
            let macd = Macd::new(3, 6, 4, output);
            let values = macd.compute(&bars);
            let lookback = macd.lookback();
            assert!(values[..lookback].iter().all(|v| v.is_nan()), "{output:?}");
            assert!(!values[lookback].is_nan(), "{output:?}");
        }
    }

    #[test]
    fn rising_prices_give_positive_line() {
        let all = Macd::new(3, 6, 4, MacdLine::Line).compute_all(&rising(20));
        assert!(all.line[10] > 0.0);
    }

    #[test]
    fn histogram_is_line_minus_signal() {
        let all = Macd::new(3, 6, 4, MacdLine::Histogram).compute_all(&rising(20));
        for i in 8..20 {
            assert_approx(all.histogram[i], all.line[i] - all.signal[i], DEFAULT_EPSILON);
        }
    }

    #[test]
    fn constant_prices_give_zero() {
        let all = Macd::new(3, 6, 4, MacdLine::Line).compute_all(&make_bars(&[50.0; 15]));
        assert_approx(all.line[10], 0.0, DEFAULT_EPSILON);
        assert_approx(all.histogram[10], 0.0, DEFAULT_EPSILON);
    }
}
