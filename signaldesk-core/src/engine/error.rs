//! Input rejection reasons and run status.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::SeriesError;

/// Why a backtest could not run. Raised before the bar loop starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BacktestError {
    #[error("series is empty")]
    EmptySeries,

    #[error("series has {len} bar(s), need at least 2")]
    TooShort { len: usize },

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("missing 'signal' column")]
    MissingSignal,

    #[error("column '{column}' is invalid: {reason}")]
    InvalidColumn { column: String, reason: String },

    #[error("close at bar {index} is not a positive finite price: {price}")]
    NonPositivePrice { index: usize, price: f64 },

    #[error("timestamp at bar {index} does not increase")]
    UnorderedTimestamps { index: usize },

    #[error("initial balance must be positive, got {0}")]
    InvalidBalance(f64),

    #[error("risk per trade must be positive, got {0}")]
    InvalidRiskPerTrade(f64),
}

impl From<SeriesError> for BacktestError {
    fn from(err: SeriesError) -> Self {
        match err {
            SeriesError::MissingColumn(name) => BacktestError::MissingColumn(name),
            SeriesError::MissingSignal => BacktestError::MissingSignal,
            SeriesError::InvalidColumn { column, reason } => {
                BacktestError::InvalidColumn { column, reason }
            }
            SeriesError::LengthMismatch { bars, signals } => BacktestError::InvalidColumn {
                column: "signal".into(),
                reason: format!("{signals} signals for {bars} bars"),
            },
            SeriesError::Frame(reason) => BacktestError::InvalidColumn {
                column: "*".into(),
                reason,
            },
        }
    }
}

/// Outcome flag carried on every result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Completed,
    Rejected {
        reason: String,
    },
}

impl RunStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            RunStatus::Completed => None,
            RunStatus::Rejected { reason } => Some(reason),
        }
    }
}

impl From<&BacktestError> for RunStatus {
    fn from(err: &BacktestError) -> Self {
        RunStatus::Rejected {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_errors_map_onto_backtest_errors() {
        let err: BacktestError = SeriesError::MissingColumn("close".into()).into();
        assert_eq!(err, BacktestError::MissingColumn("close".into()));
        assert_eq!(
            BacktestError::from(SeriesError::MissingSignal),
            BacktestError::MissingSignal
        );
    }

    #[test]
    fn rejection_carries_message() {
        let status = RunStatus::from(&BacktestError::TooShort { len: 1 });
        assert!(!status.is_completed());
        assert_eq!(
            status.rejection_reason(),
            Some("series has 1 bar(s), need at least 2")
        );
    }

    #[test]
    fn status_serializes_tagged() {
        let json = serde_json::to_string(&RunStatus::Completed).unwrap();
        assert_eq!(json, r#"{"state":"completed"}"#);
    }
}
