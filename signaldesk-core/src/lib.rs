//! SignalDesk Core — signal-driven backtesting engine.
//!
//! - Domain types (bars, signals, signal series, positions, trades)
//! - Frame adapter: polars table → signal series
//! - Exit-rule evaluator, position state machine, ledger, orchestrator
//! - Risk configuration and run fingerprinting
//! - Indicators and the strategy contract with built-in strategies
//!
//! No I/O: loading, configuration files and reports live in `signaldesk-runner`.

pub mod data;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod indicators;
pub mod risk;
pub mod strategy;

pub use domain::{Bar, ExitReason, Position, Side, Signal, SignalCounts, SignalSeries, Trade};
pub use engine::{run_backtest, BacktestError, BacktestResult, Backtester, RunLabels, RunStatus};
pub use risk::RiskConfig;
pub use strategy::{SignalGenerator, StrategyConfig, StrategyError};
