//! Ledger — realized balance, equity curve, balance history, closed trades.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Trade;

/// One `(timestamp, value)` sample of the equity curve or balance history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Summary statistics derived at run end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub total_profit_loss: f64,
    pub total_profit_loss_pct: f64,
    pub max_drawdown_pct: f64,
}

#[derive(Debug, Clone)]
pub struct Ledger {
    initial_balance: f64,
    balance: f64,
    trades: Vec<Trade>,
    equity_curve: Vec<EquityPoint>,
    balance_history: Vec<EquityPoint>,
}

impl Ledger {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            initial_balance,
            balance: initial_balance,
            trades: Vec::new(),
            equity_curve: Vec::new(),
            balance_history: Vec::new(),
        }
    }

    pub fn with_capacity(initial_balance: f64, bars: usize) -> Self {
        Self {
            equity_curve: Vec::with_capacity(bars),
            balance_history: Vec::with_capacity(bars),
            ..Self::new(initial_balance)
        }
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    pub fn balance_history(&self) -> &[EquityPoint] {
        &self.balance_history
    }

    /// Record equity (balance plus open P&L) and the realized balance.
    pub fn snapshot(&mut self, timestamp: DateTime<Utc>, unrealized_pnl: f64) {
        self.equity_curve.push(EquityPoint {
            timestamp,
            value: self.balance + unrealized_pnl,
        });
        self.balance_history.push(EquityPoint {
            timestamp,
            value: self.balance,
        });
    }

    /// Realize a closed trade.
    pub fn record_trade(&mut self, trade: Trade) {
        self.balance += trade.profit_loss;
        self.trades.push(trade);
    }

    pub fn stats(&self) -> LedgerStats {
        let total_trades = self.trades.len();
        let winning_trades = self.trades.iter().filter(|t| t.is_winner()).count();
        let losing_trades = total_trades - winning_trades;
        let win_rate = if total_trades == 0 {
            0.0
        } else {
            winning_trades as f64 / total_trades as f64 * 100.0
        };
        let total_profit_loss = self.balance - self.initial_balance;

        LedgerStats {
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            total_profit_loss,
            total_profit_loss_pct: total_profit_loss / self.initial_balance * 100.0,
            max_drawdown_pct: max_drawdown_pct(&self.equity_curve),
        }
    }

    pub fn into_parts(self) -> (Vec<Trade>, Vec<EquityPoint>, Vec<EquityPoint>) {
        (self.trades, self.equity_curve, self.balance_history)
    }
}

/// Largest peak-to-trough decline in percent of the running peak.
///
/// The peak starts at 0, so the first positive value becomes the first peak.
pub fn max_drawdown_pct(curve: &[EquityPoint]) -> f64 {
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;

    for point in curve {
        if point.value > peak {
            peak = point.value;
        }
        if peak > 0.0 {
            let dd = (peak - point.value) / peak * 100.0;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExitReason, Side};

    fn ts(i: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(i * 1000).unwrap()
    }

    fn point(i: i64, value: f64) -> EquityPoint {
        EquityPoint {
            timestamp: ts(i),
            value,
        }
    }

    fn trade(pnl: f64) -> Trade {
        Trade {
            side: Side::Long,
            entry_time: ts(0),
            entry_price: 100.0,
            exit_time: ts(1),
            exit_price: 100.0,
            size: 10.0,
            profit_loss: pnl,
            profit_loss_pct: pnl * 10.0,
            exit_reason: ExitReason::Signal,
            bars_held: 1,
        }
    }

    #[test]
    fn snapshot_separates_equity_and_balance() {
        let mut ledger = Ledger::new(1000.0);
        ledger.snapshot(ts(1), 5.0);
        assert_eq!(ledger.equity_curve()[0].value, 1005.0);
        assert_eq!(ledger.balance_history()[0].value, 1000.0);
    }

    #[test]
    fn trades_move_balance() {
        let mut ledger = Ledger::new(1000.0);
        ledger.record_trade(trade(12.0));
        ledger.record_trade(trade(-2.0));
        ledger.record_trade(trade(0.0));
        assert!((ledger.balance() - 1010.0).abs() < 1e-9);

        let stats = ledger.stats();
        assert_eq!(stats.total_trades, 3);
        assert_eq!(stats.winning_trades, 1);
        // Breakeven counts as a loss.
        assert_eq!(stats.losing_trades, 2);
        assert!((stats.win_rate - 100.0 / 3.0).abs() < 1e-9);
        assert!((stats.total_profit_loss_pct - 1.0).abs() < 1e-9);
    }

    #[test]
    fn no_trades_zero_win_rate() {
        let stats = Ledger::new(1000.0).stats();
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.total_profit_loss, 0.0);
    }

    #[test]
    fn drawdown_from_running_peak() {
        let curve = vec![
            point(0, 100.0),
            point(1, 120.0),
            point(2, 90.0),
            point(3, 130.0),
            point(4, 117.0),
        ];
        assert!((max_drawdown_pct(&curve) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn drawdown_ignores_leading_zero_equity() {
        let curve = vec![point(0, 0.0), point(1, 50.0), point(2, 40.0)];
        assert!((max_drawdown_pct(&curve) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn drawdown_empty_curve() {
        assert_eq!(max_drawdown_pct(&[]), 0.0);
    }
}
