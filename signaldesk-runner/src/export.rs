//! Report export: JSON, flat key/value text, and CSV.
//!
//! Persisted reports carry a `schema_version`; newer versions than this
//! build understands are rejected on load.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::Value;

use signaldesk_core::engine::EquityPoint;
use signaldesk_core::Trade;

use crate::runner::{RunReport, SCHEMA_VERSION};

pub const RESULT_FILE: &str = "result.json";
pub const SUMMARY_FILE: &str = "summary.txt";
pub const TRADES_FILE: &str = "trades.csv";
pub const EQUITY_FILE: &str = "equity.csv";

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize run report to JSON")
}

pub fn import_json(json: &str) -> Result<RunReport> {
    let report: RunReport =
        serde_json::from_str(json).context("failed to deserialize run report from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── Flat key/value ─────────────────────────────────────────────────

/// Scalar statistics, risk parameters, and extended metrics in one flat map.
pub fn flat_entries(report: &RunReport) -> Result<BTreeMap<String, Value>> {
    let mut map = report.result.scalar_entries();
    let metrics =
        serde_json::to_value(&report.metrics).context("failed to serialize metrics")?;
    if let Value::Object(fields) = metrics {
        map.extend(fields);
    }
    Ok(map)
}

/// One `key=value` line per flat entry, keys sorted. Unset options are empty.
pub fn export_flat(report: &RunReport) -> Result<String> {
    let mut out = String::new();
    for (key, value) in flat_entries(report)? {
        let rendered = match value {
            Value::Null => String::new(),
            Value::String(s) => s,
            other => other.to_string(),
        };
        out.push_str(&key);
        out.push('=');
        out.push_str(&rendered);
        out.push('\n');
    }
    Ok(out)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Columns: side, entry_time, entry_price, exit_time, exit_price, size,
/// profit_loss, profit_loss_pct, exit_reason, bars_held
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "side",
        "entry_time",
        "entry_price",
        "exit_time",
        "exit_price",
        "size",
        "profit_loss",
        "profit_loss_pct",
        "exit_reason",
        "bars_held",
    ])?;

    for t in trades {
        wtr.write_record([
            t.side.as_str().to_string(),
            t.entry_time.to_rfc3339(),
            format!("{:.6}", t.entry_price),
            t.exit_time.to_rfc3339(),
            format!("{:.6}", t.exit_price),
            format!("{:.6}", t.size),
            format!("{:.6}", t.profit_loss),
            format!("{:.4}", t.profit_loss_pct),
            t.exit_reason.as_str().to_string(),
            t.bars_held.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: timestamp, equity, balance. Both series share timestamps.
pub fn export_equity_csv(equity: &[EquityPoint], balance: &[EquityPoint]) -> Result<String> {
    if equity.len() != balance.len() {
        bail!(
            "equity curve has {} points but balance history has {}",
            equity.len(),
            balance.len()
        );
    }
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "equity", "balance"])?;
    for (e, b) in equity.iter().zip(balance) {
        wtr.write_record([
            e.timestamp.to_rfc3339(),
            format!("{:.6}", e.value),
            format!("{:.6}", b.value),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write the artifact set for one run under `output_dir/{symbol}_{run_id}/`:
/// `result.json`, `summary.txt`, `trades.csv`, `equity.csv`.
///
/// Returns the created directory.
pub fn save_artifacts(report: &RunReport, output_dir: &Path) -> Result<PathBuf> {
    let result = &report.result;
    let run_tag = if result.run_id.is_empty() {
        "rejected"
    } else {
        result.run_id.as_str()
    };
    let run_dir = output_dir.join(format!("{}_{}", result.symbol, run_tag));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write_file(&run_dir.join(RESULT_FILE), &export_json(report)?)?;
    write_file(&run_dir.join(SUMMARY_FILE), &export_flat(report)?)?;
    write_file(&run_dir.join(TRADES_FILE), &export_trades_csv(&result.trades)?)?;
    write_file(
        &run_dir.join(EQUITY_FILE),
        &export_equity_csv(&result.equity_curve, &result.balance_history)?,
    )?;

    Ok(run_dir)
}

/// Read a report back from an artifact directory.
pub fn load_artifacts(dir: &Path) -> Result<RunReport> {
    let path = dir.join(RESULT_FILE);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
