//! SignalDesk Runner — everything around the engine that touches the outside world.
//!
//! This crate builds on `signaldesk-core` to provide:
//! - TOML run configuration and sweep grids
//! - Data loading from CSV, Parquet, or a seeded synthetic random walk
//! - Single-run orchestration with extended performance metrics
//! - Parallel risk-parameter sweeps
//! - Report export (JSON, flat key/value summary, trades and equity CSV)

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod sweep;

pub use config::{BacktestConfig, ConfigError, DataSource};
pub use data_loader::{load_frame, load_series, LoadError};
pub use export::{export_flat, export_json, import_json, load_artifacts, save_artifacts};
pub use metrics::PerformanceMetrics;
pub use runner::{prepare_series, run_from_config, run_series, RunError, RunReport, SCHEMA_VERSION};
pub use sweep::{sweep, sweep_from_config, SweepEntry, SweepGrid};
