//! Risk-parameter sweeps.
//!
//! A grid lists candidate values per risk field; every combination runs
//! independently over the same immutable series, in parallel.
//!
//! ```toml
//! [grid]
//! stop_loss_pct = [2.0, 5.0]
//! take_profit_pct = [5.0, 10.0, 20.0]
//! ```
//!
//! An absent or empty list keeps the base configuration's value.

use std::cmp::Ordering;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use signaldesk_core::{BacktestError, Backtester, RiskConfig, SignalSeries};

use crate::config::{BacktestConfig, ConfigError};
use crate::runner::{prepare_series, RunError, RunReport};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepGrid {
    pub take_profit_pct: Vec<f64>,
    pub stop_loss_pct: Vec<f64>,
    pub trailing_stop_pct: Vec<f64>,
    pub trailing_profit_pct: Vec<f64>,
    pub risk_per_trade_pct: Vec<f64>,
}

#[derive(Deserialize)]
struct GridFile {
    grid: SweepGrid,
}

/// One grid point and its report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    /// Position of this combination in grid order.
    pub index: usize,
    pub risk: RiskConfig,
    pub report: RunReport,
}

impl SweepGrid {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: GridFile = toml::from_str(content)?;
        let grid = file.grid;
        if grid.values().any(|(_, v)| v.iter().any(|x| !x.is_finite())) {
            return Err(ConfigError::Invalid("grid values must be finite".into()));
        }
        Ok(grid)
    }

    /// Number of combinations. Empty lists count as one (the base value).
    pub fn size(&self) -> usize {
        self.values().map(|(_, v)| v.len().max(1)).product()
    }

    /// Every combination in grid order: the last field varies fastest.
    pub fn combinations(&self, base: &RiskConfig) -> Vec<RiskConfig> {
        let mut configs = vec![*base];
        for (field, values) in self.values() {
            if values.is_empty() {
                continue;
            }
            configs = configs
                .into_iter()
                .flat_map(|config| values.iter().map(move |v| set_field(config, field, *v)))
                .collect();
        }
        configs
    }

    fn values(&self) -> impl Iterator<Item = (RiskField, &Vec<f64>)> {
        [
            (RiskField::TakeProfit, &self.take_profit_pct),
            (RiskField::StopLoss, &self.stop_loss_pct),
            (RiskField::TrailingStop, &self.trailing_stop_pct),
            (RiskField::TrailingProfit, &self.trailing_profit_pct),
            (RiskField::RiskPerTrade, &self.risk_per_trade_pct),
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, Copy)]
enum RiskField {
    TakeProfit,
    StopLoss,
    TrailingStop,
    TrailingProfit,
    RiskPerTrade,
}

fn set_field(mut config: RiskConfig, field: RiskField, value: f64) -> RiskConfig {
    match field {
        RiskField::TakeProfit => config.take_profit_pct = Some(value),
        RiskField::StopLoss => config.stop_loss_pct = Some(value),
        RiskField::TrailingStop => config.trailing_stop_pct = Some(value),
        RiskField::TrailingProfit => config.trailing_profit_pct = Some(value),
        RiskField::RiskPerTrade => config.risk_per_trade_pct = value,
    }
    config
}

/// Run every grid combination against `series`.
///
/// `base` supplies the initial balance, labels, and the risk values the grid
/// leaves alone. Results are ranked: completed runs first, then total P&L
/// descending, then max drawdown ascending, then grid order.
pub fn sweep(series: &SignalSeries, grid: &SweepGrid, base: &Backtester) -> Vec<SweepEntry> {
    let combos = grid.combinations(base.risk());
    info!(combinations = combos.len(), bars = series.len(), "starting sweep");

    let mut entries: Vec<SweepEntry> = combos
        .into_par_iter()
        .enumerate()
        .map(|(index, risk)| {
            let result = Backtester::new(risk, base.initial_balance())
                .with_labels(base.labels().clone())
                .run(series);
            SweepEntry {
                index,
                risk,
                report: RunReport::new(result),
            }
        })
        .collect();

    entries.sort_by(rank);
    entries
}

/// Load the config's data once, then sweep it.
///
/// A table the adapter cannot read rejects every combination, each entry
/// carrying the reason.
pub fn sweep_from_config(
    config: &BacktestConfig,
    grid: &SweepGrid,
) -> Result<Vec<SweepEntry>, RunError> {
    let source = config.data.source()?;
    let base = Backtester::new(config.risk, config.backtest.initial_balance)
        .with_labels(config.labels());
    match prepare_series(&source, &config.strategy) {
        Ok(series) => Ok(sweep(&series, grid, &base)),
        Err(RunError::Series(err)) => Ok(reject_all(grid, &base, &BacktestError::from(err))),
        Err(err) => Err(err),
    }
}

fn reject_all(grid: &SweepGrid, base: &Backtester, err: &BacktestError) -> Vec<SweepEntry> {
    grid.combinations(base.risk())
        .into_iter()
        .enumerate()
        .map(|(index, risk)| SweepEntry {
            index,
            risk,
            report: RunReport::new(
                Backtester::new(risk, base.initial_balance())
                    .with_labels(base.labels().clone())
                    .rejected(err),
            ),
        })
        .collect()
}

fn rank(a: &SweepEntry, b: &SweepEntry) -> Ordering {
    let (ra, rb) = (&a.report.result, &b.report.result);
    rb.is_completed()
        .cmp(&ra.is_completed())
        .then_with(|| rb.total_profit_loss.total_cmp(&ra.total_profit_loss))
        .then_with(|| ra.max_drawdown_pct.total_cmp(&rb.max_drawdown_pct))
        .then_with(|| a.index.cmp(&b.index))
}
