//! SignalDesk CLI — run, sweep, and inspect commands.
//!
//! Commands:
//! - `run` — execute a backtest from a TOML config file and save artifacts
//! - `sweep` — run a risk-parameter grid over one config's data
//! - `inspect` — summarize a CSV/Parquet data file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signaldesk_runner::config::DataSection;
use signaldesk_runner::export::flat_entries;
use signaldesk_runner::{
    load_series, run_from_config, save_artifacts, sweep_from_config, BacktestConfig, RunReport,
    SweepEntry, SweepGrid,
};

/// Exit code for a backtest whose input the engine rejected.
const EXIT_REJECTED: i32 = 2;

#[derive(Parser)]
#[command(
    name = "signaldesk",
    about = "SignalDesk CLI — signal-driven backtesting engine"
)]
struct Cli {
    /// Debug-level logging (RUST_LOG overrides).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for the artifact set.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Sweep risk parameters over one config's data.
    Sweep {
        /// Path to a TOML config file (base risk values, data, strategy).
        #[arg(long)]
        config: PathBuf,

        /// Path to a TOML file with a [grid] table.
        #[arg(long)]
        grid: PathBuf,

        /// Number of ranked entries to print.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Also write every entry as JSON to this file.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Print row count, date range, and signal distribution of a data file.
    Inspect {
        /// CSV or Parquet file.
        #[arg(long)]
        data: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run { config, output_dir } => run_cmd(&config, &output_dir),
        Commands::Sweep {
            config,
            grid,
            top,
            json,
        } => sweep_cmd(&config, &grid, top, json.as_deref()),
        Commands::Inspect { data } => inspect_cmd(&data),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("signaldesk={level},signaldesk_core={level},signaldesk_runner={level}")
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_cmd(config_path: &Path, output_dir: &Path) -> Result<()> {
    let config = BacktestConfig::from_file(config_path)?;
    let report = run_from_config(&config)?;

    print_summary(&report)?;
    let run_dir = save_artifacts(&report, output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    if let Some(reason) = report.result.status.rejection_reason() {
        eprintln!("Backtest rejected: {reason}");
        std::process::exit(EXIT_REJECTED);
    }
    Ok(())
}

fn sweep_cmd(config_path: &Path, grid_path: &Path, top: usize, json: Option<&Path>) -> Result<()> {
    let config = BacktestConfig::from_file(config_path)?;
    let grid = SweepGrid::from_file(grid_path)?;
    info!(combinations = grid.size(), "sweep grid loaded");

    let entries = sweep_from_config(&config, &grid)?;
    print_sweep_table(&entries, top);

    if let Some(path) = json {
        let body = serde_json::to_string_pretty(&entries).context("failed to serialize sweep")?;
        std::fs::write(path, body)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Sweep written to: {}", path.display());
    }
    Ok(())
}

fn inspect_cmd(data: &Path) -> Result<()> {
    let section = DataSection {
        path: Some(data.to_path_buf()),
        ..DataSection::default()
    };
    let series = load_series(&section.source()?)?;
    let counts = series.signal_counts();

    println!("File: {}", data.display());
    println!("Rows: {}", series.len());
    if let (Some(first), Some(last)) = (series.bars().first(), series.bars().last()) {
        println!("Range: {} to {}", first.timestamp, last.timestamp);
        println!("Close: {:.4} → {:.4}", first.close, last.close);
    }
    println!(
        "Signals: BUY {}  SELL {}  HOLD {}",
        counts.buy, counts.sell, counts.hold
    );
    Ok(())
}

fn print_summary(report: &RunReport) -> Result<()> {
    let entries = flat_entries(report)?;
    let width = entries.keys().map(String::len).max().unwrap_or(0);
    println!();
    for (key, value) in &entries {
        let rendered = match value {
            serde_json::Value::Null => "-".to_string(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        println!("  {key:<width$}  {rendered}");
    }
    println!();
    Ok(())
}

fn print_sweep_table(entries: &[SweepEntry], top: usize) {
    fn opt(v: Option<f64>) -> String {
        v.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
    }

    println!(
        "{:>4} {:>7} {:>7} {:>7} {:>7} {:>6} {:>7} {:>12} {:>8} {:>8}",
        "#", "TP%", "SL%", "TS%", "TPr%", "Risk%", "Trades", "P&L", "Win%", "MaxDD%"
    );
    println!("{}", "-".repeat(84));
    for entry in entries.iter().take(top) {
        let r = &entry.report.result;
        println!(
            "{:>4} {:>7} {:>7} {:>7} {:>7} {:>6.2} {:>7} {:>12.4} {:>8.2} {:>8.2}",
            entry.index,
            opt(entry.risk.take_profit_pct),
            opt(entry.risk.stop_loss_pct),
            opt(entry.risk.trailing_stop_pct),
            opt(entry.risk.trailing_profit_pct),
            entry.risk.risk_per_trade_pct,
            r.total_trades,
            r.total_profit_loss,
            r.win_rate,
            r.max_drawdown_pct,
        );
    }
    if entries.len() > top {
        println!("... {} more", entries.len() - top);
    }
}
