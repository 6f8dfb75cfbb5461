//! Trade — a closed position, immutable once appended to the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::position::Side;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    TrailingStop,
    TrailingProfit,
    /// An opposing signal arrived while no exit rule fired.
    Signal,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::TrailingStop => "trailing_stop",
            ExitReason::TrailingProfit => "trailing_profit",
            ExitReason::Signal => "signal",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete round trip: entry → exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub side: Side,

    // ── Entry ──
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,

    /// Notional committed at entry.
    pub size: f64,

    // ── PnL ──
    pub profit_loss: f64,
    pub profit_loss_pct: f64,

    pub exit_reason: ExitReason,
    pub bars_held: usize,
}

impl Trade {
    /// Losers include break-even trades.
    pub fn is_winner(&self) -> bool {
        self.profit_loss > 0.0
    }

    pub fn hold_duration(&self) -> chrono::Duration {
        self.exit_time - self.entry_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trade(pnl: f64) -> Trade {
        Trade {
            side: Side::Long,
            entry_time: DateTime::from_timestamp_millis(0).unwrap(),
            entry_price: 100.0,
            exit_time: DateTime::from_timestamp_millis(3_600_000).unwrap(),
            exit_price: 100.0 + pnl,
            size: 100.0,
            profit_loss: pnl,
            profit_loss_pct: pnl,
            exit_reason: ExitReason::Signal,
            bars_held: 1,
        }
    }

    #[test]
    fn break_even_is_not_a_winner() {
        assert!(sample_trade(1.0).is_winner());
        assert!(!sample_trade(0.0).is_winner());
        assert!(!sample_trade(-1.0).is_winner());
    }

    #[test]
    fn hold_duration() {
        assert_eq!(sample_trade(0.0).hold_duration(), chrono::Duration::hours(1));
    }

    #[test]
    fn exit_reason_serializes_snake_case() {
        let json = serde_json::to_string(&ExitReason::TrailingProfit).unwrap();
        assert_eq!(json, "\"trailing_profit\"");
    }
}
