//! Backtest orchestrator — validates input, drives the bar loop, builds the result.
//!
//! Per bar from index 1:
//! 1. Snapshot equity and balance
//! 2. Exit rules on the open position (close and skip to next bar on a hit)
//! 3. Opposing signal closes the position (skip to next bar)
//! 4. BUY or SELL while flat opens a position

use polars::prelude::DataFrame;
use tracing::{debug, info, warn};

use crate::domain::SignalSeries;
use crate::fingerprint::run_id;
use crate::risk::RiskConfig;

use super::error::{BacktestError, RunStatus};
use super::exit_rules::ExitRules;
use super::ledger::Ledger;
use super::result::{BacktestResult, DateRange, RunLabels};
use super::state::{PositionBook, Transition};

/// A configured backtest. Holds no mutable state, so one instance can run
/// many series, including from several threads.
#[derive(Debug, Clone)]
pub struct Backtester {
    risk: RiskConfig,
    initial_balance: f64,
    labels: RunLabels,
}

impl Backtester {
    pub fn new(risk: RiskConfig, initial_balance: f64) -> Self {
        Self {
            risk,
            initial_balance,
            labels: RunLabels::default(),
        }
    }

    pub fn with_labels(mut self, labels: RunLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn risk(&self) -> &RiskConfig {
        &self.risk
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    pub fn labels(&self) -> &RunLabels {
        &self.labels
    }

    /// Run, reporting why the input was rejected if it could not run.
    pub fn try_run(&self, series: &SignalSeries) -> Result<BacktestResult, BacktestError> {
        self.validate(series)?;
        Ok(self.simulate(series))
    }

    /// Run without failing: rejected input yields a zero-activity result
    /// whose `status` carries the reason.
    pub fn run(&self, series: &SignalSeries) -> BacktestResult {
        self.try_run(series)
            .unwrap_or_else(|err| self.rejected(&err))
    }

    /// Adapt a table and run it. Missing columns yield a rejected result.
    pub fn try_run_frame(&self, df: &DataFrame) -> Result<BacktestResult, BacktestError> {
        let series = SignalSeries::from_frame(df)?;
        self.try_run(&series)
    }

    pub fn run_frame(&self, df: &DataFrame) -> BacktestResult {
        self.try_run_frame(df)
            .unwrap_or_else(|err| self.rejected(&err))
    }

    /// Zero-activity result for input rejected before the run, e.g. a table
    /// the caller could not adapt.
    pub fn rejected(&self, err: &BacktestError) -> BacktestResult {
        warn!(
            symbol = %self.labels.symbol,
            strategy = %self.labels.strategy,
            error = %err,
            "backtest input rejected"
        );
        BacktestResult::rejected(&self.labels, self.risk, self.initial_balance, err)
    }

    fn validate(&self, series: &SignalSeries) -> Result<(), BacktestError> {
        if series.is_empty() {
            return Err(BacktestError::EmptySeries);
        }
        if series.len() < 2 {
            return Err(BacktestError::TooShort { len: series.len() });
        }
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            return Err(BacktestError::InvalidBalance(self.initial_balance));
        }
        let risk_pct = self.risk.risk_per_trade_pct;
        if !(risk_pct.is_finite() && risk_pct > 0.0) {
            return Err(BacktestError::InvalidRiskPerTrade(risk_pct));
        }

        let bars = series.bars();
        for (index, bar) in bars.iter().enumerate() {
            if !(bar.close.is_finite() && bar.close > 0.0) {
                return Err(BacktestError::NonPositivePrice {
                    index,
                    price: bar.close,
                });
            }
        }
        for (index, pair) in bars.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(BacktestError::UnorderedTimestamps { index: index + 1 });
            }
        }
        Ok(())
    }

    fn simulate(&self, series: &SignalSeries) -> BacktestResult {
        info!(
            symbol = %self.labels.symbol,
            interval = %self.labels.interval,
            strategy = %self.labels.strategy,
            bars = series.len(),
            "starting backtest"
        );

        let rules = ExitRules::from_risk(&self.risk);
        let mut book = PositionBook::new();
        let mut ledger = Ledger::with_capacity(self.initial_balance, series.len() - 1);

        for (index, (bar, signal)) in series.iter().enumerate().skip(1) {
            ledger.snapshot(bar.timestamp, book.unrealized_pnl(bar.close));

            let entry_size = self.risk.position_size(ledger.balance());
            match book.on_bar(index, bar, signal, &rules, entry_size) {
                Transition::Stay => {}
                Transition::Opened { side, size } => {
                    debug!(
                        bar = index,
                        side = side.as_str(),
                        price = bar.close,
                        size,
                        "opened position"
                    );
                }
                Transition::Closed(trade) => {
                    debug!(
                        bar = index,
                        side = trade.side.as_str(),
                        entry = trade.entry_price,
                        exit = trade.exit_price,
                        pnl = trade.profit_loss,
                        reason = %trade.exit_reason,
                        "closed position"
                    );
                    ledger.record_trade(trade);
                }
            }
        }

        let stats = ledger.stats();
        let final_balance = ledger.balance();
        let bars = series.bars();
        let date_range = DateRange {
            start: bars[1].timestamp,
            end: bars[bars.len() - 1].timestamp,
        };

        info!(
            symbol = %self.labels.symbol,
            trades = stats.total_trades,
            final_balance,
            win_rate = stats.win_rate,
            max_drawdown_pct = stats.max_drawdown_pct,
            "backtest complete"
        );

        let (trades, equity_curve, balance_history) = ledger.into_parts();
        BacktestResult {
            run_id: run_id(series, &self.risk, self.initial_balance, &self.labels),
            status: RunStatus::Completed,
            symbol: self.labels.symbol.clone(),
            interval: self.labels.interval.clone(),
            strategy: self.labels.strategy.clone(),
            initial_balance: self.initial_balance,
            final_balance,
            total_profit_loss: stats.total_profit_loss,
            total_profit_loss_pct: stats.total_profit_loss_pct,
            total_trades: stats.total_trades,
            winning_trades: stats.winning_trades,
            losing_trades: stats.losing_trades,
            win_rate: stats.win_rate,
            max_drawdown_pct: stats.max_drawdown_pct,
            max_drawdown: stats.max_drawdown_pct,
            trades,
            equity_curve,
            balance_history,
            open_position: book.into_open_position(),
            risk: self.risk,
            signal_stats: series.signal_counts(),
            date_range: Some(date_range),
            bars_processed: series.len() - 1,
        }
    }
}

/// Run one backtest with default labels. Never fails; see [`Backtester::run`].
pub fn run_backtest(
    series: &SignalSeries,
    risk: &RiskConfig,
    initial_balance: f64,
) -> BacktestResult {
    Backtester::new(*risk, initial_balance).run(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, Signal};
    use chrono::DateTime;

    fn series(closes: &[f64], signals: &[Signal]) -> SignalSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                timestamp: DateTime::from_timestamp_millis(i as i64 * 3_600_000).unwrap(),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1.0,
            })
            .collect();
        SignalSeries::from_parts(bars, signals.to_vec()).unwrap()
    }

    #[test]
    fn first_bar_is_never_traded() {
        let s = series(&[100.0, 101.0, 102.0], &[Signal::Buy, Signal::Hold, Signal::Hold]);
        let result = run_backtest(&s, &RiskConfig::default(), 1000.0);
        assert!(result.is_completed());
        assert_eq!(result.total_trades, 0);
        assert!(result.open_position.is_none());
        assert_eq!(result.equity_curve.len(), 2);
    }

    #[test]
    fn rejects_single_bar() {
        let s = series(&[100.0], &[Signal::Buy]);
        let bt = Backtester::new(RiskConfig::default(), 1000.0);
        assert_eq!(bt.try_run(&s), Err(BacktestError::TooShort { len: 1 }));
        let r = bt.run(&s);
        assert_eq!(r.final_balance, 1000.0);
        assert!(!r.is_completed());
    }

    #[test]
    fn rejects_empty_series() {
        let s = series(&[], &[]);
        let bt = Backtester::new(RiskConfig::default(), 1000.0);
        assert_eq!(bt.try_run(&s), Err(BacktestError::EmptySeries));
    }

    #[test]
    fn rejects_non_positive_close() {
        let s = series(&[100.0, 0.0, 101.0], &[Signal::Hold; 3]);
        let bt = Backtester::new(RiskConfig::default(), 1000.0);
        assert_eq!(
            bt.try_run(&s),
            Err(BacktestError::NonPositivePrice { index: 1, price: 0.0 })
        );
    }

    #[test]
    fn rejects_bad_balance_and_risk() {
        let s = series(&[100.0, 101.0], &[Signal::Hold; 2]);
        assert_eq!(
            Backtester::new(RiskConfig::default(), 0.0).try_run(&s),
            Err(BacktestError::InvalidBalance(0.0))
        );
        assert_eq!(
            Backtester::new(RiskConfig::default().with_risk_per_trade(0.0), 1000.0).try_run(&s),
            Err(BacktestError::InvalidRiskPerTrade(0.0))
        );
    }

    #[test]
    fn rejects_unordered_timestamps() {
        let mut s = series(&[100.0, 101.0, 102.0], &[Signal::Hold; 3]);
        let mut bars = s.bars().to_vec();
        bars[2].timestamp = bars[1].timestamp;
        s = SignalSeries::from_parts(bars, vec![Signal::Hold; 3]).unwrap();
        assert_eq!(
            Backtester::new(RiskConfig::default(), 1000.0).try_run(&s),
            Err(BacktestError::UnorderedTimestamps { index: 2 })
        );
    }

    #[test]
    fn position_left_open_is_not_realized() {
        let s = series(&[100.0, 100.0, 120.0], &[Signal::Hold, Signal::Buy, Signal::Hold]);
        let r = run_backtest(&s, &RiskConfig::default(), 1000.0);
        assert_eq!(r.total_trades, 0);
        assert_eq!(r.final_balance, 1000.0);
        assert!(r.open_position.is_some());
        // Entry at 100 with 10 notional, marked at 120.
        assert!((r.equity_curve[1].value - 1002.0).abs() < 1e-9);
    }

    #[test]
    fn size_tracks_current_balance() {
        let s = series(
            &[100.0, 100.0, 200.0, 200.0, 200.0],
            &[Signal::Hold, Signal::Buy, Signal::Sell, Signal::Buy, Signal::Hold],
        );
        let r = run_backtest(&s, &RiskConfig::default().with_risk_per_trade(10.0), 1000.0);
        assert_eq!(r.total_trades, 1);
        assert!((r.final_balance - 1100.0).abs() < 1e-9);
        let open = r.open_position.unwrap();
        assert!((open.size - 110.0).abs() < 1e-9);
    }
}
