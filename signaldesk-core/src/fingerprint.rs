//! Run fingerprinting — a deterministic identifier for one backtest's inputs.
//!
//! The id is a BLAKE3 hash over the bars, the signal column, the risk
//! parameters, the initial balance and the labels. Floats are hashed by
//! their bit pattern so identical inputs always give identical ids.

use crate::domain::SignalSeries;
use crate::engine::RunLabels;
use crate::risk::RiskConfig;

/// Length of the hex id kept on results.
pub const RUN_ID_LEN: usize = 16;

pub fn run_id(
    series: &SignalSeries,
    risk: &RiskConfig,
    initial_balance: f64,
    labels: &RunLabels,
) -> String {
    let mut hasher = blake3::Hasher::new();

    for (bar, signal) in series.iter() {
        hasher.update(&bar.timestamp.timestamp_millis().to_le_bytes());
        for value in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
            hasher.update(&value.to_bits().to_le_bytes());
        }
        hasher.update(signal.as_str().as_bytes());
    }

    for pct in [
        risk.take_profit_pct,
        risk.stop_loss_pct,
        risk.trailing_stop_pct,
        risk.trailing_profit_pct,
    ] {
        match pct {
            Some(v) => {
                hasher.update(&[1]);
                hasher.update(&v.to_bits().to_le_bytes());
            }
            None => {
                hasher.update(&[0]);
            }
        }
    }
    hasher.update(&risk.risk_per_trade_pct.to_bits().to_le_bytes());
    hasher.update(&initial_balance.to_bits().to_le_bytes());

    for label in [&labels.symbol, &labels.interval, &labels.strategy] {
        hasher.update(&(label.len() as u64).to_le_bytes());
        hasher.update(label.as_bytes());
    }

    let hex = hasher.finalize().to_hex();
    hex.as_str()[..RUN_ID_LEN].to_string()
}
