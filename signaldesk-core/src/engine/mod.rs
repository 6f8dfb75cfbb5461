//! Backtesting engine — a sequential fold over one signal series.
//!
//! - [`exit_rules`]: stop-loss, take-profit, trailing stop and trailing profit
//! - [`state`]: the FLAT / LONG_OPEN / SHORT_OPEN position state machine
//! - [`ledger`]: balance, equity curve, balance history, trade list, summary stats
//! - [`backtester`]: input validation and the bar loop
//!
//! A run is deterministic: no randomness, no clock, no I/O inside the loop.

pub mod backtester;
pub mod error;
pub mod exit_rules;
pub mod ledger;
pub mod result;
pub mod state;

pub use backtester::{run_backtest, Backtester};
pub use error::{BacktestError, RunStatus};
pub use exit_rules::{ExitLevels, ExitRules};
pub use ledger::{max_drawdown_pct, EquityPoint, Ledger, LedgerStats};
pub use result::{BacktestResult, DateRange, RunLabels};
pub use state::{BookState, PositionBook, Transition};
