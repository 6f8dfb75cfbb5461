//! Position state machine: FLAT, LONG_OPEN, SHORT_OPEN.
//!
//! Per bar, with a position open: fold the close into the water mark, run
//! the exit rules, then check for an opposing signal. With no position:
//! open on BUY or SELL. A bar that closes a position never opens one.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, ExitReason, Position, Side, Signal, Trade};

use super::exit_rules::ExitRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookState {
    Flat,
    LongOpen,
    ShortOpen,
}

/// What happened to the book on one bar.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Stay,
    Opened { side: Side, size: f64 },
    Closed(Trade),
}

/// The single open-position slot of a backtest.
#[derive(Debug, Clone, Default)]
pub struct PositionBook {
    position: Option<Position>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BookState {
        match self.position.as_ref().map(|p| p.side) {
            None => BookState::Flat,
            Some(Side::Long) => BookState::LongOpen,
            Some(Side::Short) => BookState::ShortOpen,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// Mark-to-market P&L of the open position at `price` (0 when flat).
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.position
            .as_ref()
            .map_or(0.0, |p| p.unrealized_pnl(price))
    }

    /// Advance the book by one bar. `entry_size` is the notional to commit
    /// if this bar opens a position.
    pub fn on_bar(
        &mut self,
        index: usize,
        bar: &Bar,
        signal: Signal,
        rules: &ExitRules,
        entry_size: f64,
    ) -> Transition {
        if let Some(mut position) = self.position.take() {
            position.update_mark(bar.close);

            let reason = rules.evaluate(&position, bar.close).or_else(|| {
                (signal == position.side.opposing_signal()).then_some(ExitReason::Signal)
            });

            return match reason {
                Some(reason) => {
                    Transition::Closed(position.close(bar.timestamp, index, bar.close, reason))
                }
                None => {
                    self.position = Some(position);
                    Transition::Stay
                }
            };
        }

        match Side::from_entry_signal(signal) {
            Some(side) => {
                self.position = Some(Position::open(
                    side,
                    bar.timestamp,
                    index,
                    bar.close,
                    entry_size,
                ));
                Transition::Opened {
                    side,
                    size: entry_size,
                }
            }
            None => Transition::Stay,
        }
    }

    /// Consume the book, returning any position still open.
    pub fn into_open_position(self) -> Option<Position> {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskConfig;
    use chrono::DateTime;

    fn bar(i: i64, close: f64) -> Bar {
        Bar {
            timestamp: DateTime::from_timestamp_millis(i * 60_000).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn buy_opens_long_sell_opens_short() {
        let rules = ExitRules::default();
        let mut book = PositionBook::new();
        assert_eq!(book.state(), BookState::Flat);

        let t = book.on_bar(1, &bar(1, 100.0), Signal::Buy, &rules, 10.0);
        assert_eq!(t, Transition::Opened { side: Side::Long, size: 10.0 });
        assert_eq!(book.state(), BookState::LongOpen);

        let mut book = PositionBook::new();
        book.on_bar(1, &bar(1, 100.0), Signal::Sell, &rules, 10.0);
        assert_eq!(book.state(), BookState::ShortOpen);
    }

    #[test]
    fn hold_keeps_book_flat() {
        let mut book = PositionBook::new();
        let t = book.on_bar(1, &bar(1, 100.0), Signal::Hold, &ExitRules::default(), 10.0);
        assert_eq!(t, Transition::Stay);
        assert!(book.is_flat());
    }

    #[test]
    fn opposing_signal_closes_without_reversing() {
        let rules = ExitRules::default();
        let mut book = PositionBook::new();
        book.on_bar(1, &bar(1, 100.0), Signal::Buy, &rules, 10.0);

        // Same-side signal is ignored while open.
        assert_eq!(
            book.on_bar(2, &bar(2, 101.0), Signal::Buy, &rules, 10.0),
            Transition::Stay
        );

        match book.on_bar(3, &bar(3, 102.0), Signal::Sell, &rules, 10.0) {
            Transition::Closed(trade) => {
                assert_eq!(trade.exit_reason, ExitReason::Signal);
                assert_eq!(trade.bars_held, 2);
            }
            other => panic!("expected close, got {other:?}"),
        }
        assert_eq!(book.state(), BookState::Flat);
    }

    #[test]
    fn exit_rule_beats_opposing_signal() {
        let rules = ExitRules::from_risk(&RiskConfig::default().with_stop_loss(5.0));
        let mut book = PositionBook::new();
        book.on_bar(1, &bar(1, 100.0), Signal::Buy, &rules, 10.0);

        match book.on_bar(2, &bar(2, 90.0), Signal::Sell, &rules, 10.0) {
            Transition::Closed(trade) => assert_eq!(trade.exit_reason, ExitReason::StopLoss),
            other => panic!("expected close, got {other:?}"),
        }
    }

    #[test]
    fn water_mark_updates_before_rules() {
        let rules = ExitRules::from_risk(&RiskConfig::default().with_trailing_stop(2.0));
        let mut book = PositionBook::new();
        book.on_bar(1, &bar(1, 100.0), Signal::Buy, &rules, 10.0);
        book.on_bar(2, &bar(2, 115.0), Signal::Hold, &rules, 10.0);
        assert_eq!(book.position().unwrap().high_water_mark(), Some(115.0));
    }

    #[test]
    fn quiet_bar_leaves_position_in_place() {
        let rules = ExitRules::from_risk(&RiskConfig::default().with_stop_loss(5.0));
        let mut book = PositionBook::new();
        book.on_bar(1, &bar(1, 100.0), Signal::Sell, &rules, 10.0);

        for i in 2..5 {
            assert_eq!(
                book.on_bar(i, &bar(i as i64, 99.0), Signal::Hold, &rules, 10.0),
                Transition::Stay
            );
        }
        let position = book.position().unwrap();
        assert_eq!(book.state(), BookState::ShortOpen);
        assert_eq!(position.entry_index, 1);
        assert_eq!(position.entry_price, 100.0);
    }
}
