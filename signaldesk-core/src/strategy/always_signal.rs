//! Test strategy that trades constantly.
//!
//! Every `frequency`-th bar (by index) carries a signal: BUY when the bar's
//! timestamp in whole seconds is even, SELL when odd. All other bars HOLD.

use crate::domain::{Bar, Signal};

use super::SignalGenerator;

#[derive(Debug, Clone)]
pub struct AlwaysSignal {
    pub frequency: usize,
}

impl AlwaysSignal {
    pub fn new(frequency: usize) -> Self {
        assert!(frequency >= 1, "signal frequency must be >= 1");
        Self { frequency }
    }
}

impl Default for AlwaysSignal {
    fn default() -> Self {
        Self::new(2)
    }
}

impl SignalGenerator for AlwaysSignal {
    fn name(&self) -> &str {
        "always_signal"
    }

    fn generate(&self, bars: &[Bar]) -> Vec<Signal> {
        bars.iter()
            .enumerate()
            .map(|(i, bar)| {
                if i % self.frequency != 0 {
                    Signal::Hold
                } else if bar.timestamp.timestamp().rem_euclid(2) == 0 {
                    Signal::Buy
                } else {
                    Signal::Sell
                }
            })
            .collect()
    }
}
