//! Performance metrics derived from a finished run.
//!
//! Pure functions: trade list and/or equity curve in, scalar out. Ratios use
//! per-bar returns without annualization since the bar interval varies
//! between runs.

use serde::{Deserialize, Serialize};

use signaldesk_core::engine::EquityPoint;
use signaldesk_core::{BacktestResult, Trade};

/// Profit factor when there are no losing trades.
pub const PROFIT_FACTOR_CAP: f64 = 100.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub sharpe: f64,
    pub sortino: f64,
    pub profit_factor: f64,
    pub avg_trade: f64,
    pub avg_win: f64,
    /// Negative or zero.
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_bars_held: f64,
    pub avg_hold_secs: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
}

impl PerformanceMetrics {
    /// All zero for a rejected run or one with no trades and a flat curve.
    pub fn compute(result: &BacktestResult) -> Self {
        let returns = bar_returns(&result.equity_curve);
        let trades = &result.trades;
        Self {
            sharpe: sharpe_ratio(&returns),
            sortino: sortino_ratio(&returns),
            profit_factor: profit_factor(trades),
            avg_trade: avg_trade(trades),
            avg_win: avg_win(trades),
            avg_loss: avg_loss(trades),
            largest_win: largest_win(trades),
            largest_loss: largest_loss(trades),
            avg_bars_held: avg_bars_held(trades),
            avg_hold_secs: avg_hold_secs(trades),
            max_consecutive_wins: max_consecutive(trades, true),
            max_consecutive_losses: max_consecutive(trades, false),
        }
    }
}

// ─── Curve metrics ──────────────────────────────────────────────────

/// Simple returns between consecutive equity snapshots.
pub fn bar_returns(curve: &[EquityPoint]) -> Vec<f64> {
    curve
        .windows(2)
        .map(|w| {
            if w[0].value > 0.0 {
                (w[1].value - w[0].value) / w[0].value
            } else {
                0.0
            }
        })
        .collect()
}

/// mean / sample std of per-bar returns. 0 with fewer than two returns or zero variance.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean(returns) / std
}

/// mean / downside deviation. 0 when no return is negative.
pub fn sortino_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let downside_sq: f64 = returns.iter().filter(|r| **r < 0.0).map(|r| r * r).sum();
    if downside_sq == 0.0 {
        return 0.0;
    }
    let downside_std = (downside_sq / returns.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    mean(returns) / downside_std
}

// ─── Trade metrics ──────────────────────────────────────────────────

/// Gross profit / gross loss, capped at [`PROFIT_FACTOR_CAP`].
pub fn profit_factor(trades: &[Trade]) -> f64 {
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.profit_loss > 0.0)
        .map(|t| t.profit_loss)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.profit_loss < 0.0)
        .map(|t| -t.profit_loss)
        .sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { PROFIT_FACTOR_CAP } else { 0.0 };
    }
    (gross_profit / gross_loss).min(PROFIT_FACTOR_CAP)
}

pub fn avg_trade(trades: &[Trade]) -> f64 {
    mean(&trades.iter().map(|t| t.profit_loss).collect::<Vec<_>>())
}

pub fn avg_win(trades: &[Trade]) -> f64 {
    mean(&pnls(trades, true))
}

/// Break-even trades count as losses.
pub fn avg_loss(trades: &[Trade]) -> f64 {
    mean(&pnls(trades, false))
}

pub fn largest_win(trades: &[Trade]) -> f64 {
    trades
        .iter()
        .map(|t| t.profit_loss)
        .fold(0.0_f64, f64::max)
}

pub fn largest_loss(trades: &[Trade]) -> f64 {
    trades
        .iter()
        .map(|t| t.profit_loss)
        .fold(0.0_f64, f64::min)
}

pub fn avg_bars_held(trades: &[Trade]) -> f64 {
    mean(&trades.iter().map(|t| t.bars_held as f64).collect::<Vec<_>>())
}

pub fn avg_hold_secs(trades: &[Trade]) -> f64 {
    mean(
        &trades
            .iter()
            .map(|t| t.hold_duration().num_seconds() as f64)
            .collect::<Vec<_>>(),
    )
}

/// Longest run of winners (`winners = true`) or losers.
pub fn max_consecutive(trades: &[Trade], winners: bool) -> usize {
    let mut max_streak = 0;
    let mut current = 0;
    for trade in trades {
        if trade.is_winner() == winners {
            current += 1;
            max_streak = max_streak.max(current);
        } else {
            current = 0;
        }
    }
    max_streak
}

// ─── Helpers ────────────────────────────────────────────────────────

fn pnls(trades: &[Trade], winners: bool) -> Vec<f64> {
    trades
        .iter()
        .filter(|t| t.is_winner() == winners)
        .map(|t| t.profit_loss)
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use signaldesk_core::{ExitReason, Side};

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn trade(pnl: f64, bars: usize) -> Trade {
        Trade {
            side: Side::Long,
            entry_time: t0(),
            entry_price: 100.0,
            exit_time: t0() + Duration::hours(bars as i64),
            exit_price: 100.0 + pnl,
            size: 100.0,
            profit_loss: pnl,
            profit_loss_pct: pnl,
            exit_reason: ExitReason::Signal,
            bars_held: bars,
        }
    }

    fn curve(values: &[f64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| EquityPoint {
                timestamp: t0() + Duration::hours(i as i64),
                value: *v,
            })
            .collect()
    }

    #[test]
    fn empty_inputs_are_zero() {
        assert_eq!(sharpe_ratio(&[]), 0.0);
        assert_eq!(sortino_ratio(&[]), 0.0);
        assert_eq!(profit_factor(&[]), 0.0);
        assert_eq!(avg_trade(&[]), 0.0);
        assert_eq!(largest_win(&[]), 0.0);
        assert_eq!(largest_loss(&[]), 0.0);
        assert_eq!(avg_hold_secs(&[]), 0.0);
        assert_eq!(max_consecutive(&[], true), 0);
    }

    #[test]
    fn bar_returns_between_snapshots() {
        let r = bar_returns(&curve(&[100.0, 110.0, 99.0]));
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.1).abs() < 1e-12);
        assert!((r[1] + 0.1).abs() < 1e-12);
    }

    #[test]
    fn sharpe_zero_for_constant_curve() {
        let r = bar_returns(&curve(&[100.0; 10]));
        assert_eq!(sharpe_ratio(&r), 0.0);
    }

    #[test]
    fn sharpe_sign_follows_drift() {
        let up = [0.01, 0.02, 0.005, 0.015];
        let down = [-0.01, -0.02, -0.005, -0.015];
        assert!(sharpe_ratio(&up) > 0.0);
        assert!(sharpe_ratio(&down) < 0.0);
    }

    #[test]
    fn sortino_zero_without_downside() {
        assert_eq!(sortino_ratio(&[0.01, 0.02, 0.0]), 0.0);
        assert!(sortino_ratio(&[0.03, -0.01, 0.02]) > 0.0);
    }

    #[test]
    fn profit_factor_ratio_and_cap() {
        let trades = vec![trade(30.0, 1), trade(-10.0, 1), trade(10.0, 1)];
        assert!((profit_factor(&trades) - 4.0).abs() < 1e-12);
        assert_eq!(profit_factor(&[trade(5.0, 1)]), PROFIT_FACTOR_CAP);
        assert_eq!(profit_factor(&[trade(-5.0, 1)]), 0.0);
    }

    #[test]
    fn win_loss_averages() {
        let trades = vec![trade(30.0, 2), trade(-10.0, 4), trade(10.0, 6), trade(0.0, 8)];
        assert!((avg_trade(&trades) - 7.5).abs() < 1e-12);
        assert!((avg_win(&trades) - 20.0).abs() < 1e-12);
        assert!((avg_loss(&trades) + 5.0).abs() < 1e-12);
        assert_eq!(largest_win(&trades), 30.0);
        assert_eq!(largest_loss(&trades), -10.0);
        assert!((avg_bars_held(&trades) - 5.0).abs() < 1e-12);
        assert!((avg_hold_secs(&trades) - 5.0 * 3600.0).abs() < 1e-9);
    }

    #[test]
    fn streaks() {
        let trades: Vec<Trade> = [1.0, 2.0, -1.0, 3.0, 4.0, 5.0, -2.0, -3.0]
            .iter()
            .map(|p| trade(*p, 1))
            .collect();
        assert_eq!(max_consecutive(&trades, true), 3);
        assert_eq!(max_consecutive(&trades, false), 2);
    }
}
