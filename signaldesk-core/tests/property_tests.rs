//! Property tests for engine invariants.
//!
//! 1. Curve lengths — equity curve and balance history have len(series) - 1 points
//! 2. Determinism — identical inputs give identical results
//! 3. Balance identity — final = initial + sum of trade P&L
//! 4. Win rate identity — 0 without trades, else 100 * winners / trades
//! 5. Single position — trades never overlap; a close never re-opens on the same bar

use chrono::DateTime;
use proptest::prelude::*;
use signaldesk_core::domain::{Bar, Signal, SignalSeries};
use signaldesk_core::engine::run_backtest;
use signaldesk_core::RiskConfig;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_signal() -> impl Strategy<Value = Signal> {
    prop_oneof![
        3 => Just(Signal::Hold),
        1 => Just(Signal::Buy),
        1 => Just(Signal::Sell),
    ]
}

fn arb_series() -> impl Strategy<Value = SignalSeries> {
    prop::collection::vec((1.0..1000.0_f64, arb_signal()), 2..120).prop_map(|rows| {
        let (bars, signals): (Vec<Bar>, Vec<Signal>) = rows
            .into_iter()
            .enumerate()
            .map(|(i, (close, signal))| {
                let bar = Bar {
                    timestamp: DateTime::from_timestamp(i as i64 * 60, 0).unwrap(),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 1.0,
                };
                (bar, signal)
            })
            .unzip();
        SignalSeries::from_parts(bars, signals).unwrap()
    })
}

fn arb_pct() -> impl Strategy<Value = Option<f64>> {
    prop::option::of(0.0..50.0_f64)
}

fn arb_risk() -> impl Strategy<Value = RiskConfig> {
    (arb_pct(), arb_pct(), arb_pct(), arb_pct(), 0.1..100.0_f64).prop_map(
        |(tp, sl, ts, tpf, risk)| RiskConfig {
            take_profit_pct: tp,
            stop_loss_pct: sl,
            trailing_stop_pct: ts,
            trailing_profit_pct: tpf,
            risk_per_trade_pct: risk,
        },
    )
}

proptest! {
    #[test]
    fn curves_have_one_point_per_processed_bar(series in arb_series(), risk in arb_risk()) {
        let result = run_backtest(&series, &risk, 1000.0);
        prop_assert!(result.is_completed());
        prop_assert_eq!(result.equity_curve.len(), series.len() - 1);
        prop_assert_eq!(result.balance_history.len(), series.len() - 1);
    }

    #[test]
    fn runs_are_deterministic(series in arb_series(), risk in arb_risk()) {
        let a = run_backtest(&series, &risk, 1000.0);
        let b = run_backtest(&series, &risk, 1000.0);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn final_balance_is_initial_plus_realized(series in arb_series(), risk in arb_risk()) {
        let result = run_backtest(&series, &risk, 1000.0);
        let realized: f64 = result.trades.iter().map(|t| t.profit_loss).sum();
        let expected = result.initial_balance + realized;
        prop_assert!(
            (result.final_balance - expected).abs() <= 1e-9 * expected.abs().max(1.0),
            "final={} expected={}", result.final_balance, expected
        );
    }

    #[test]
    fn win_rate_matches_counts(series in arb_series(), risk in arb_risk()) {
        let result = run_backtest(&series, &risk, 1000.0);
        prop_assert_eq!(result.winning_trades + result.losing_trades, result.total_trades);
        if result.total_trades == 0 {
            prop_assert_eq!(result.win_rate, 0.0);
        } else {
            let expected = 100.0 * result.winning_trades as f64 / result.total_trades as f64;
            prop_assert!((result.win_rate - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn positions_never_overlap(series in arb_series(), risk in arb_risk()) {
        let result = run_backtest(&series, &risk, 1000.0);
        for pair in result.trades.windows(2) {
            prop_assert!(pair[1].entry_time > pair[0].exit_time);
        }
        for trade in &result.trades {
            prop_assert!(trade.exit_time > trade.entry_time);
        }
        if let (Some(open), Some(last)) = (&result.open_position, result.trades.last()) {
            prop_assert!(open.entry_time > last.exit_time);
        }
    }

    #[test]
    fn balance_history_only_moves_on_closes(series in arb_series(), risk in arb_risk()) {
        let result = run_backtest(&series, &risk, 1000.0);
        let changes = result
            .balance_history
            .windows(2)
            .filter(|w| w[0].value != w[1].value)
            .count();
        prop_assert!(changes <= result.total_trades);
    }
}
