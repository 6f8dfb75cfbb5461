//! Bar loading for the runner.
//!
//! Three sources feed the engine the same shape of table:
//! - CSV files, parsed with the `csv` crate (header row = column names)
//! - Parquet files, read with polars
//! - a seeded synthetic random walk for demos and tests
//!
//! Every source produces a polars `DataFrame`; [`load_series`] then runs it
//! through the core frame adapter. A file without a `signal` column is plain
//! candles and reads as all HOLD.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use signaldesk_core::data::{series_from_frame_or_hold, REQUIRED_COLUMNS};
use signaldesk_core::domain::{SeriesError, SignalSeries};

use crate::config::DataSource;

/// Synthetic series start at 2024-01-01T00:00:00Z.
pub const SYNTHETIC_START_MS: i64 = 1_704_067_200_000;
const SYNTHETIC_STEP_MS: i64 = 3_600_000;
const SYNTHETIC_START_PRICE: f64 = 100.0;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}: row {row}, column '{column}': cannot parse '{value}'")]
    Cell {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },

    #[error("{0} contains no rows")]
    Empty(PathBuf),

    #[error("polars error: {0}")]
    Frame(String),

    #[error(transparent)]
    Series(#[from] SeriesError),
}

/// Load the configured source as a DataFrame.
pub fn load_frame(source: &DataSource) -> Result<DataFrame, LoadError> {
    let df = match source {
        DataSource::Csv(path) => read_csv(path)?,
        DataSource::Parquet(path) => read_parquet(path)?,
        DataSource::Synthetic { bars, seed } => synthetic_frame(*bars, *seed)?,
    };
    info!(rows = df.height(), columns = df.width(), "loaded bars");
    Ok(df)
}

/// Load the configured source and convert it into a signal series.
pub fn load_series(source: &DataSource) -> Result<SignalSeries, LoadError> {
    let df = load_frame(source)?;
    Ok(series_from_frame_or_hold(&df)?)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Read a CSV file into a DataFrame.
///
/// OHLCV columns must parse as numbers (empty cells become nulls).
/// `timestamp` accepts epoch milliseconds, RFC 3339, or
/// `YYYY-MM-DD HH:MM:SS` (UTC). Any other column, `signal` included, is
/// numeric when every non-empty cell parses and text otherwise.
pub fn read_csv(path: &Path) -> Result<DataFrame, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let csv_err = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.to_ascii_lowercase())
        .collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        for (col, value) in cells.iter_mut().zip(record.iter()) {
            col.push(value.to_string());
        }
    }
    if cells.first().map_or(true, Vec::is_empty) {
        return Err(LoadError::Empty(path.to_path_buf()));
    }

    let mut columns = Vec::with_capacity(headers.len());
    for (name, values) in headers.iter().zip(cells) {
        let column = match name.as_str() {
            "timestamp" => Column::new(name.as_str().into(), parse_timestamps(path, name, &values)?),
            n if REQUIRED_COLUMNS.contains(&n) => {
                Column::new(name.as_str().into(), parse_numbers(path, name, &values)?)
            }
            _ => match parse_numbers(path, name, &values) {
                Ok(numbers) => Column::new(name.as_str().into(), numbers),
                Err(_) => Column::new(name.as_str().into(), values),
            },
        };
        columns.push(column);
    }

    debug!(path = %path.display(), columns = ?headers, "parsed CSV");
    DataFrame::new(columns).map_err(|e| LoadError::Frame(e.to_string()))
}

fn parse_numbers(path: &Path, column: &str, values: &[String]) -> Result<Vec<Option<f64>>, LoadError> {
    values
        .iter()
        .enumerate()
        .map(|(row, raw)| {
            if raw.is_empty() {
                return Ok(None);
            }
            raw.parse::<f64>().map(Some).map_err(|_| LoadError::Cell {
                path: path.to_path_buf(),
                row: row + 1,
                column: column.to_string(),
                value: raw.clone(),
            })
        })
        .collect()
}

fn parse_timestamps(path: &Path, column: &str, values: &[String]) -> Result<Vec<i64>, LoadError> {
    values
        .iter()
        .enumerate()
        .map(|(row, raw)| {
            parse_timestamp_ms(raw).ok_or_else(|| LoadError::Cell {
                path: path.to_path_buf(),
                row: row + 1,
                column: column.to_string(),
                value: raw.clone(),
            })
        })
        .collect()
}

fn parse_timestamp_ms(raw: &str) -> Option<i64> {
    if let Ok(ms) = raw.parse::<i64>() {
        return Some(ms);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive).timestamp_millis())
}

// ─── Parquet ────────────────────────────────────────────────────────

pub fn read_parquet(path: &Path) -> Result<DataFrame, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| LoadError::Frame(format!("read {}: {e}", path.display())))?;
    if df.height() == 0 {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    Ok(df)
}

// ─── Synthetic ──────────────────────────────────────────────────────

/// Hourly random walk from a price of 100.0 with every signal HOLD.
///
/// Same seed, same frame.
pub fn synthetic_frame(bars: usize, seed: u64) -> Result<DataFrame, LoadError> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(seed);
    let mut timestamps = Vec::with_capacity(bars);
    let mut opens = Vec::with_capacity(bars);
    let mut highs = Vec::with_capacity(bars);
    let mut lows = Vec::with_capacity(bars);
    let mut closes = Vec::with_capacity(bars);
    let mut volumes = Vec::with_capacity(bars);

    let mut price = SYNTHETIC_START_PRICE;
    for i in 0..bars {
        let bar_return: f64 = rng.gen_range(-0.02..0.02);
        let open = price;
        let close = price * (1.0 + bar_return);
        timestamps.push(SYNTHETIC_START_MS + i as i64 * SYNTHETIC_STEP_MS);
        opens.push(open);
        highs.push(open.max(close) * (1.0 + rng.gen_range(0.0..0.005)));
        lows.push(open.min(close) * (1.0 - rng.gen_range(0.0..0.005)));
        closes.push(close);
        volumes.push(rng.gen_range(100.0..10_000.0));
        price = close;
    }

    DataFrame::new(vec![
        Column::new("timestamp".into(), timestamps),
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
        Column::new("signal".into(), vec!["HOLD"; bars]),
    ])
    .map_err(|e| LoadError::Frame(e.to_string()))
}
