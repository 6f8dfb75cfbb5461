//! Moving average crossover — BUY on a golden cross, SELL on a death cross.

use crate::domain::{Bar, Signal};
use crate::indicators::{Indicator, Sma};

use super::{crossed_above, crossed_below, SignalGenerator};

#[derive(Debug, Clone)]
pub struct MaCrossover {
    pub fast_period: usize,
    pub slow_period: usize,
}

impl MaCrossover {
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        assert!(fast_period >= 1, "fast_period must be >= 1");
        assert!(slow_period > fast_period, "slow_period must be > fast_period");
        Self {
            fast_period,
            slow_period,
        }
    }
}

impl SignalGenerator for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn generate(&self, bars: &[Bar]) -> Vec<Signal> {
        let fast = Sma::new(self.fast_period).compute(bars);
        let slow = Sma::new(self.slow_period).compute(bars);

        (0..bars.len())
            .map(|i| {
                if crossed_above(&fast, &slow, i) {
                    Signal::Buy
                } else if crossed_below(&fast, &slow, i) {
                    Signal::Sell
                } else {
                    Signal::Hold
                }
            })
            .collect()
    }
}
