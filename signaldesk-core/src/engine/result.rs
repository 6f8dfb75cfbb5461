//! BacktestResult — the read-only report of one run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::{Position, SignalCounts, Trade};
use crate::risk::RiskConfig;

use super::error::{BacktestError, RunStatus};
use super::ledger::EquityPoint;

/// Descriptive labels carried through to the report. They do not affect the simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLabels {
    pub symbol: String,
    pub interval: String,
    pub strategy: String,
}

impl RunLabels {
    pub fn new(
        symbol: impl Into<String>,
        interval: impl Into<String>,
        strategy: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
            strategy: strategy.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub run_id: String,
    pub status: RunStatus,

    // ── Labels ──
    pub symbol: String,
    pub interval: String,
    pub strategy: String,

    // ── Balances ──
    pub initial_balance: f64,
    pub final_balance: f64,
    pub total_profit_loss: f64,
    pub total_profit_loss_pct: f64,

    // ── Trade stats ──
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub max_drawdown_pct: f64,
    /// Same value as `max_drawdown_pct`.
    pub max_drawdown: f64,

    // ── Series ──
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub balance_history: Vec<EquityPoint>,
    /// Position still open when the series ended, if any. Not realized.
    pub open_position: Option<Position>,

    // ── Inputs ──
    pub risk: RiskConfig,
    pub signal_stats: SignalCounts,
    pub date_range: Option<DateRange>,
    pub bars_processed: usize,
}

impl BacktestResult {
    /// Zero-activity result for an input that could not run.
    ///
    /// `final_balance == initial_balance`, no trades, empty curves.
    pub fn rejected(
        labels: &RunLabels,
        risk: RiskConfig,
        initial_balance: f64,
        error: &BacktestError,
    ) -> Self {
        Self {
            run_id: String::new(),
            status: RunStatus::from(error),
            symbol: labels.symbol.clone(),
            interval: labels.interval.clone(),
            strategy: labels.strategy.clone(),
            initial_balance,
            final_balance: initial_balance,
            total_profit_loss: 0.0,
            total_profit_loss_pct: 0.0,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: 0.0,
            max_drawdown_pct: 0.0,
            max_drawdown: 0.0,
            trades: Vec::new(),
            equity_curve: Vec::new(),
            balance_history: Vec::new(),
            open_position: None,
            risk,
            signal_stats: SignalCounts::default(),
            date_range: None,
            bars_processed: 0,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    /// Flat key/value report: scalar statistics, the risk parameters used,
    /// plus the equity curve, balance history and trade list as arrays.
    pub fn to_flat_map(&self) -> BTreeMap<String, Value> {
        let mut map = self.scalar_entries();
        map.insert(
            "equity_curve".into(),
            json!(self
                .equity_curve
                .iter()
                .map(|p| json!([p.timestamp.to_rfc3339(), p.value]))
                .collect::<Vec<_>>()),
        );
        map.insert(
            "balance_history".into(),
            json!(self
                .balance_history
                .iter()
                .map(|p| json!([p.timestamp.to_rfc3339(), p.value]))
                .collect::<Vec<_>>()),
        );
        map.insert(
            "trades".into(),
            json!(self
                .trades
                .iter()
                .map(|t| json!({
                    "side": t.side.as_str(),
                    "entry_time": t.entry_time.to_rfc3339(),
                    "entry_price": t.entry_price,
                    "exit_time": t.exit_time.to_rfc3339(),
                    "exit_price": t.exit_price,
                    "size": t.size,
                    "profit_loss": t.profit_loss,
                    "profit_loss_pct": t.profit_loss_pct,
                    "exit_reason": t.exit_reason.as_str(),
                }))
                .collect::<Vec<_>>()),
        );
        map
    }

    /// The scalar part of [`to_flat_map`](Self::to_flat_map).
    pub fn scalar_entries(&self) -> BTreeMap<String, Value> {
        let mut map = BTreeMap::new();
        let mut put = |key: &str, value: Value| {
            map.insert(key.to_string(), value);
        };

        put("run_id", json!(self.run_id));
        put(
            "status",
            json!(match &self.status {
                RunStatus::Completed => "completed".to_string(),
                RunStatus::Rejected { reason } => format!("rejected: {reason}"),
            }),
        );
        put("symbol", json!(self.symbol));
        put("interval", json!(self.interval));
        put("strategy", json!(self.strategy));
        put("initial_balance", json!(self.initial_balance));
        put("final_balance", json!(self.final_balance));
        put("total_profit_loss", json!(self.total_profit_loss));
        put("total_profit_loss_pct", json!(self.total_profit_loss_pct));
        put("total_trades", json!(self.total_trades));
        put("winning_trades", json!(self.winning_trades));
        put("losing_trades", json!(self.losing_trades));
        put("win_rate", json!(self.win_rate));
        put("max_drawdown_pct", json!(self.max_drawdown_pct));
        put("take_profit_pct", json!(self.risk.take_profit_pct));
        put("stop_loss_pct", json!(self.risk.stop_loss_pct));
        put("trailing_stop_pct", json!(self.risk.trailing_stop_pct));
        put("trailing_profit_pct", json!(self.risk.trailing_profit_pct));
        put("risk_per_trade_pct", json!(self.risk.risk_per_trade_pct));
        put("bars_processed", json!(self.bars_processed));
        put("signals_buy", json!(self.signal_stats.buy));
        put("signals_sell", json!(self.signal_stats.sell));
        put("signals_hold", json!(self.signal_stats.hold));
        if let Some(range) = &self.date_range {
            put("start", json!(range.start.to_rfc3339()));
            put("end", json!(range.end.to_rfc3339()));
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected() -> BacktestResult {
        BacktestResult::rejected(
            &RunLabels::new("BTCUSDT", "1h", "macd_ema"),
            RiskConfig::default().with_stop_loss(5.0),
            1000.0,
            &BacktestError::MissingColumn("close".into()),
        )
    }

    #[test]
    fn rejected_is_zero_activity() {
        let r = rejected();
        assert!(!r.is_completed());
        assert_eq!(r.total_trades, 0);
        assert_eq!(r.final_balance, r.initial_balance);
        assert!(r.equity_curve.is_empty());
        assert_eq!(
            r.status.rejection_reason(),
            Some("missing required column 'close'")
        );
    }

    #[test]
    fn flat_map_lists_risk_and_series() {
        let map = rejected().to_flat_map();
        assert_eq!(map["stop_loss_pct"], json!(5.0));
        assert_eq!(map["take_profit_pct"], Value::Null);
        assert_eq!(map["initial_balance"], json!(1000.0));
        assert_eq!(map["trades"], json!([]));
        assert!(map.contains_key("equity_curve"));
        assert!(map.contains_key("balance_history"));
    }

    #[test]
    fn scalar_entries_have_no_arrays() {
        let map = rejected().scalar_entries();
        assert!(map.values().all(|v| !v.is_array()));
    }
}
