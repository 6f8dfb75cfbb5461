//! Single-run orchestration: load bars, generate signals, run the engine,
//! derive metrics.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use signaldesk_core::data::{bars_from_frame, series_from_frame};
use signaldesk_core::domain::SeriesError;
use signaldesk_core::engine::RunLabels;
use signaldesk_core::strategy::{self, StrategyConfig, StrategyError};
use signaldesk_core::{BacktestError, BacktestResult, Backtester, RiskConfig, SignalSeries};

use crate::config::{BacktestConfig, ConfigError, DataSource};
use crate::data_loader::{load_frame, LoadError};
use crate::metrics::PerformanceMetrics;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),
    #[error("series error: {0}")]
    Series(#[from] SeriesError),
}

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Engine result plus the metrics derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub result: BacktestResult,
    pub metrics: PerformanceMetrics,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl RunReport {
    pub fn new(result: BacktestResult) -> Self {
        let metrics = PerformanceMetrics::compute(&result);
        Self {
            schema_version: SCHEMA_VERSION,
            result,
            metrics,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.result.is_completed()
    }
}

/// Load the configured data and write the configured strategy's signals onto it.
///
/// Only `precomputed` needs a `signal` column in the input. The other
/// strategies build their signals from the OHLCV columns alone. Tables the
/// adapter cannot read come back as [`RunError::Series`].
pub fn prepare_series(
    source: &DataSource,
    strategy_config: &StrategyConfig,
) -> Result<SignalSeries, RunError> {
    let generator = strategy::create(strategy_config)?;
    let df = load_frame(source)?;
    let series = if generator.reads_signal_column() {
        series_from_frame(&df)?
    } else {
        generator.apply(&SignalSeries::from_bars(bars_from_frame(&df)?))?
    };

    let counts = series.signal_counts();
    info!(
        strategy = generator.name(),
        bars = series.len(),
        buy = counts.buy,
        sell = counts.sell,
        "signals generated"
    );
    Ok(series)
}

/// Run the engine over an already prepared series. Never fails: a rejected
/// input shows up in the report's status.
pub fn run_series(
    series: &SignalSeries,
    risk: RiskConfig,
    initial_balance: f64,
    labels: RunLabels,
) -> RunReport {
    let result = Backtester::new(risk, initial_balance)
        .with_labels(labels)
        .run(series);
    RunReport::new(result)
}

/// Full pipeline for one config file.
///
/// A table the engine cannot take (missing OHLCV column, non-numeric prices,
/// no signals for `precomputed`) gives a rejected report rather than an error.
/// Errors are left for config, I/O and parse failures.
pub fn run_from_config(config: &BacktestConfig) -> Result<RunReport, RunError> {
    let source = config.data.source()?;
    let backtester = Backtester::new(config.risk, config.backtest.initial_balance)
        .with_labels(config.labels());
    let result = match prepare_series(&source, &config.strategy) {
        Ok(series) => backtester.run(&series),
        Err(RunError::Series(err)) => backtester.rejected(&BacktestError::from(err)),
        Err(err) => return Err(err),
    };
    Ok(RunReport::new(result))
}
