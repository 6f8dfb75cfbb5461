//! Pass-through: keep the signal column already present on the series.

use crate::domain::{Bar, SeriesError, Signal, SignalSeries};

use super::SignalGenerator;

#[derive(Debug, Clone, Copy, Default)]
pub struct Precomputed;

impl SignalGenerator for Precomputed {
    fn name(&self) -> &str {
        "precomputed"
    }

    /// Bars alone carry no signals.
    fn generate(&self, bars: &[Bar]) -> Vec<Signal> {
        vec![Signal::Hold; bars.len()]
    }

    fn apply(&self, series: &SignalSeries) -> Result<SignalSeries, SeriesError> {
        Ok(series.clone())
    }

    fn reads_signal_column(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn apply_keeps_existing_signals() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let series =
            SignalSeries::from_parts(bars, vec![Signal::Buy, Signal::Sell, Signal::Hold]).unwrap();
        assert_eq!(Precomputed.apply(&series).unwrap(), series);
    }
}
