//! Signal Series Adapter — normalizes a bar-indexed polars table into a
//! [`SignalSeries`].
//!
//! Expected columns:
//! - `open`, `high`, `low`, `close`, `volume`: any numeric dtype (cast to f64)
//! - `signal`: strings (`BUY`/`SELL`/`HOLD`, case-insensitive) or numbers
//!   (`> 0` BUY, `< 0` SELL, `0` HOLD). Nulls and unknown labels are HOLD.
//! - `timestamp` (optional): integer epoch milliseconds or a Datetime column.
//!   When absent, row `i` is stamped `i` seconds after the epoch.

use chrono::{DateTime, Utc};
use polars::prelude::*;

use crate::domain::{Bar, SeriesError, Signal, SignalSeries};

/// OHLCV columns every input table must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

pub const SIGNAL_COLUMN: &str = "signal";
pub const TIMESTAMP_COLUMN: &str = "timestamp";

impl SignalSeries {
    /// See [`series_from_frame`].
    pub fn from_frame(df: &DataFrame) -> Result<Self, SeriesError> {
        series_from_frame(df)
    }
}

/// Convert a DataFrame into a signal series. The `signal` column is required.
pub fn series_from_frame(df: &DataFrame) -> Result<SignalSeries, SeriesError> {
    let bars = bars_from_frame(df)?;
    let signal_col = df
        .column(SIGNAL_COLUMN)
        .map_err(|_| SeriesError::MissingSignal)?;
    SignalSeries::from_parts(bars, signal_values(signal_col)?)
}

/// Like [`series_from_frame`], but a table without a `signal` column reads
/// as all HOLD.
pub fn series_from_frame_or_hold(df: &DataFrame) -> Result<SignalSeries, SeriesError> {
    if df.column(SIGNAL_COLUMN).is_ok() {
        series_from_frame(df)
    } else {
        Ok(SignalSeries::from_bars(bars_from_frame(df)?))
    }
}

/// Read the OHLCV (and optional timestamp) columns, ignoring any signals.
pub fn bars_from_frame(df: &DataFrame) -> Result<Vec<Bar>, SeriesError> {
    for name in REQUIRED_COLUMNS {
        if df.column(name).is_err() {
            return Err(SeriesError::MissingColumn(name.to_string()));
        }
    }

    let opens = numeric_column(df, "open")?;
    let highs = numeric_column(df, "high")?;
    let lows = numeric_column(df, "low")?;
    let closes = numeric_column(df, "close")?;
    let volumes = numeric_column(df, "volume")?;
    let timestamps = timestamp_column(df)?;

    Ok((0..df.height())
        .map(|i| Bar {
            timestamp: timestamps[i],
            open: opens[i],
            high: highs[i],
            low: lows[i],
            close: closes[i],
            volume: volumes[i],
        })
        .collect())
}

/// Convert a series back into a DataFrame with the canonical column set.
pub fn series_to_frame(series: &SignalSeries) -> Result<DataFrame, SeriesError> {
    let bars = series.bars();
    let timestamps: Vec<i64> = bars.iter().map(|b| b.timestamp.timestamp_millis()).collect();
    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    let signals: Vec<&str> = series.signals().iter().map(|s| s.as_str()).collect();

    DataFrame::new(vec![
        Column::new(TIMESTAMP_COLUMN.into(), timestamps),
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
        Column::new(SIGNAL_COLUMN.into(), signals),
    ])
    .map_err(|e| SeriesError::Frame(e.to_string()))
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>, SeriesError> {
    let col = df
        .column(name)
        .map_err(|_| SeriesError::MissingColumn(name.to_string()))?;

    if matches!(col.dtype(), DataType::String | DataType::Boolean) {
        return Err(SeriesError::InvalidColumn {
            column: name.to_string(),
            reason: format!("expected numeric values, found {}", col.dtype()),
        });
    }

    let cast = col
        .cast(&DataType::Float64)
        .map_err(|e| SeriesError::InvalidColumn {
            column: name.to_string(),
            reason: e.to_string(),
        })?;
    let ca = cast.f64().map_err(|e| SeriesError::InvalidColumn {
        column: name.to_string(),
        reason: e.to_string(),
    })?;

    Ok(ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

fn timestamp_column(df: &DataFrame) -> Result<Vec<DateTime<Utc>>, SeriesError> {
    let Ok(col) = df.column(TIMESTAMP_COLUMN) else {
        return (0..df.height())
            .map(|i| millis_to_datetime(i as i64 * 1000))
            .collect();
    };

    let divisor = match col.dtype() {
        DataType::Datetime(TimeUnit::Milliseconds, _) => 1,
        DataType::Datetime(TimeUnit::Microseconds, _) => 1_000,
        DataType::Datetime(TimeUnit::Nanoseconds, _) => 1_000_000,
        DataType::Int64 | DataType::Int32 | DataType::UInt64 | DataType::UInt32 => 1,
        other => {
            return Err(SeriesError::InvalidColumn {
                column: TIMESTAMP_COLUMN.to_string(),
                reason: format!("unsupported dtype {other}"),
            })
        }
    };

    let raw = col
        .cast(&DataType::Int64)
        .map_err(|e| SeriesError::InvalidColumn {
            column: TIMESTAMP_COLUMN.to_string(),
            reason: e.to_string(),
        })?;
    let ca = raw.i64().map_err(|e| SeriesError::InvalidColumn {
        column: TIMESTAMP_COLUMN.to_string(),
        reason: e.to_string(),
    })?;

    ca.into_iter()
        .enumerate()
        .map(|(i, v)| {
            let value = v.ok_or_else(|| SeriesError::InvalidColumn {
                column: TIMESTAMP_COLUMN.to_string(),
                reason: format!("null at row {i}"),
            })?;
            millis_to_datetime(value / divisor)
        })
        .collect()
}

fn signal_values(col: &Column) -> Result<Vec<Signal>, SeriesError> {
    if col.dtype() == &DataType::String {
        let ca = col.str().map_err(|e| SeriesError::InvalidColumn {
            column: SIGNAL_COLUMN.to_string(),
            reason: e.to_string(),
        })?;
        return Ok(ca
            .into_iter()
            .map(|v| v.map(Signal::from_label).unwrap_or_default())
            .collect());
    }

    let cast = col
        .cast(&DataType::Float64)
        .map_err(|e| SeriesError::InvalidColumn {
            column: SIGNAL_COLUMN.to_string(),
            reason: e.to_string(),
        })?;
    let ca = cast.f64().map_err(|e| SeriesError::InvalidColumn {
        column: SIGNAL_COLUMN.to_string(),
        reason: e.to_string(),
    })?;
    Ok(ca
        .into_iter()
        .map(|v| v.map(Signal::from_numeric).unwrap_or_default())
        .collect())
}

fn millis_to_datetime(ms: i64) -> Result<DateTime<Utc>, SeriesError> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| SeriesError::InvalidColumn {
        column: TIMESTAMP_COLUMN.to_string(),
        reason: format!("timestamp {ms} out of range"),
    })
}
