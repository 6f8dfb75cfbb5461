//! SignalSeries — bars paired one-to-one with trading signals.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bar::Bar;
use super::signal::Signal;

/// Errors raised while assembling a signal series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("missing 'signal' column")]
    MissingSignal,

    #[error("column '{column}' is invalid: {reason}")]
    InvalidColumn { column: String, reason: String },

    #[error("{bars} bars but {signals} signals")]
    LengthMismatch { bars: usize, signals: usize },

    #[error("frame error: {0}")]
    Frame(String),
}

/// Distribution of signals across a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct SignalCounts {
    pub buy: usize,
    pub sell: usize,
    pub hold: usize,
}

impl SignalCounts {
    pub fn total(&self) -> usize {
        self.buy + self.sell + self.hold
    }

    fn record(&mut self, signal: Signal) {
        match signal {
            Signal::Buy => self.buy += 1,
            Signal::Sell => self.sell += 1,
            Signal::Hold => self.hold += 1,
        }
    }
}

/// Ordered sequence of `(Bar, Signal)` pairs.
///
/// The signal column is never null: absent or unrecognized signals are HOLD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSeries {
    bars: Vec<Bar>,
    signals: Vec<Signal>,
}

impl SignalSeries {
    pub fn from_parts(bars: Vec<Bar>, signals: Vec<Signal>) -> Result<Self, SeriesError> {
        if bars.len() != signals.len() {
            return Err(SeriesError::LengthMismatch {
                bars: bars.len(),
                signals: signals.len(),
            });
        }
        Ok(Self { bars, signals })
    }

    /// Bars with an all-HOLD signal column.
    pub fn from_bars(bars: Vec<Bar>) -> Self {
        let signals = vec![Signal::Hold; bars.len()];
        Self { bars, signals }
    }

    /// Same bars, new signal column.
    pub fn with_signals(&self, signals: Vec<Signal>) -> Result<Self, SeriesError> {
        Self::from_parts(self.bars.clone(), signals)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn get(&self, index: usize) -> Option<(&Bar, Signal)> {
        Some((self.bars.get(index)?, *self.signals.get(index)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Bar, Signal)> + '_ {
        self.bars.iter().zip(self.signals.iter().copied())
    }

    pub fn signal_counts(&self) -> SignalCounts {
        let mut counts = SignalCounts::default();
        for &signal in &self.signals {
            counts.record(signal);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| Bar {
                timestamp: DateTime::from_timestamp_millis(i as i64 * 60_000).unwrap(),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
                volume: 10.0,
            })
            .collect()
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = SignalSeries::from_parts(bars(3), vec![Signal::Buy]).unwrap_err();
        assert_eq!(err, SeriesError::LengthMismatch { bars: 3, signals: 1 });
    }

    #[test]
    fn from_bars_defaults_to_hold() {
        let series = SignalSeries::from_bars(bars(4));
        assert_eq!(series.len(), 4);
        assert!(series.signals().iter().all(|s| *s == Signal::Hold));
    }

    #[test]
    fn counts_signals() {
        let series = SignalSeries::from_parts(
            bars(5),
            vec![Signal::Buy, Signal::Hold, Signal::Sell, Signal::Buy, Signal::Hold],
        )
        .unwrap();
        let counts = series.signal_counts();
        assert_eq!(counts.buy, 2);
        assert_eq!(counts.sell, 1);
        assert_eq!(counts.hold, 2);
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn get_pairs_bar_and_signal() {
        let series =
            SignalSeries::from_parts(bars(2), vec![Signal::Hold, Signal::Sell]).unwrap();
        let (bar, signal) = series.get(1).unwrap();
        assert_eq!(bar.timestamp.timestamp_millis(), 60_000);
        assert_eq!(signal, Signal::Sell);
        assert!(series.get(2).is_none());
    }
}
