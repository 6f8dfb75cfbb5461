//! Strategy contract — given a price series, produce one signal per bar.
//!
//! The engine never sees strategy internals; it consumes the signal column
//! a generator writes onto a [`SignalSeries`].

pub mod always_signal;
pub mod bollinger_rsi;
pub mod ma_crossover;
pub mod macd_ema;
pub mod precomputed;

pub use always_signal::AlwaysSignal;
pub use bollinger_rsi::BollingerRsi;
pub use ma_crossover::MaCrossover;
pub use macd_ema::MacdEma;
pub use precomputed::Precomputed;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Bar, SeriesError, Signal, SignalSeries};

pub trait SignalGenerator: Send + Sync {
    /// Human-readable name (e.g., "macd_ema").
    fn name(&self) -> &str;

    /// One signal per bar. Output length equals `bars.len()`; bars before
    /// warmup are HOLD. The signal at bar t only uses `bars[..=t]`.
    fn generate(&self, bars: &[Bar]) -> Vec<Signal>;

    /// Replace the series' signal column with this generator's output.
    fn apply(&self, series: &SignalSeries) -> Result<SignalSeries, SeriesError> {
        series.with_signals(self.generate(series.bars()))
    }

    /// Whether the input table's own `signal` column feeds this generator.
    /// Generators that compute signals from bars ignore it.
    fn reads_signal_column(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("unknown strategy type: {0}")]
    Unknown(String),

    #[error("invalid parameter '{name}' for {strategy}: {reason}")]
    InvalidParam {
        strategy: String,
        name: String,
        reason: String,
    },
}

/// A strategy selection: type name plus numeric parameters.
///
/// `BTreeMap` keeps parameter order deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl StrategyConfig {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }
}

/// Names accepted by [`create`].
pub const STRATEGY_TYPES: [&str; 5] = [
    "macd_ema",
    "bollinger_rsi",
    "ma_crossover",
    "always_signal",
    "precomputed",
];

fn param(config: &StrategyConfig, name: &str, default: f64) -> f64 {
    config.params.get(name).copied().unwrap_or(default)
}

/// A period-like parameter: a whole number of at least 1.
fn param_period(config: &StrategyConfig, name: &str, default: usize) -> Result<usize, StrategyError> {
    let Some(&value) = config.params.get(name) else {
        return Ok(default);
    };
    if value.is_finite() && value >= 1.0 && value.fract() == 0.0 {
        Ok(value as usize)
    } else {
        Err(StrategyError::InvalidParam {
            strategy: config.kind.clone(),
            name: name.to_string(),
            reason: format!("expected a whole number >= 1, got {value}"),
        })
    }
}

fn require_ordered(
    config: &StrategyConfig,
    fast_name: &str,
    fast: usize,
    slow: usize,
) -> Result<(), StrategyError> {
    if fast < slow {
        Ok(())
    } else {
        Err(StrategyError::InvalidParam {
            strategy: config.kind.clone(),
            name: fast_name.to_string(),
            reason: format!("must be below the slow period ({fast} >= {slow})"),
        })
    }
}

/// Build a generator from its configuration.
pub fn create(config: &StrategyConfig) -> Result<Box<dyn SignalGenerator>, StrategyError> {
    match config.kind.as_str() {
        "macd_ema" => {
            let fast = param_period(config, "fast", 12)?;
            let slow = param_period(config, "slow", 26)?;
            require_ordered(config, "fast", fast, slow)?;
            Ok(Box::new(MacdEma {
                fast,
                slow,
                signal: param_period(config, "signal", 9)?,
                trend_period: param_period(config, "trend_period", 200)?,
                rsi_period: param_period(config, "rsi_period", 14)?,
                rsi_oversold: param(config, "rsi_oversold", 40.0),
                rsi_overbought: param(config, "rsi_overbought", 60.0),
            }))
        }
        "bollinger_rsi" => Ok(Box::new(BollingerRsi {
            period: param_period(config, "period", 20)?,
            std_multiplier: param(config, "std_multiplier", 2.0),
            rsi_period: param_period(config, "rsi_period", 14)?,
            rsi_oversold: param(config, "rsi_oversold", 30.0),
            rsi_overbought: param(config, "rsi_overbought", 70.0),
            min_volatility: param(config, "min_volatility", 1.5),
            filter_window: param_period(config, "filter_window", 24)?,
        })),
        "ma_crossover" => {
            let fast = param_period(config, "fast", 10)?;
            let slow = param_period(config, "slow", 50)?;
            require_ordered(config, "fast", fast, slow)?;
            Ok(Box::new(MaCrossover::new(fast, slow)))
        }
        "always_signal" => Ok(Box::new(AlwaysSignal::new(param_period(
            config,
            "signal_frequency",
            2,
        )?))),
        "precomputed" => Ok(Box::new(Precomputed)),
        other => Err(StrategyError::Unknown(other.to_string())),
    }
}

/// True where `a` crosses above `b` between bars `i - 1` and `i`.
pub(crate) fn crossed_above(a: &[f64], b: &[f64], i: usize) -> bool {
    i > 0 && all_valid(&[a[i - 1], b[i - 1], a[i], b[i]]) && a[i - 1] <= b[i - 1] && a[i] > b[i]
}

/// True where `a` crosses below `b` between bars `i - 1` and `i`.
pub(crate) fn crossed_below(a: &[f64], b: &[f64], i: usize) -> bool {
    i > 0 && all_valid(&[a[i - 1], b[i - 1], a[i], b[i]]) && a[i - 1] >= b[i - 1] && a[i] < b[i]
}

pub(crate) fn all_valid(values: &[f64]) -> bool {
    values.iter().all(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_every_known_type() {
        for kind in STRATEGY_TYPES {
            let generator = create(&StrategyConfig::new(kind)).unwrap();
            assert_eq!(generator.name(), kind);
        }
    }

    #[test]
    fn only_precomputed_reads_the_signal_column() {
        for kind in STRATEGY_TYPES {
            let generator = create(&StrategyConfig::new(kind)).unwrap();
            assert_eq!(generator.reads_signal_column(), kind == "precomputed", "{kind}");
        }
    }

    #[test]
    fn unknown_type_is_error() {
        let err = create(&StrategyConfig::new("rci_ema")).err().unwrap();
        assert_eq!(err, StrategyError::Unknown("rci_ema".into()));
    }

    #[test]
    fn fractional_period_is_rejected() {
        let config = StrategyConfig::new("ma_crossover").with_param("fast", 2.5);
        assert!(matches!(
            create(&config),
            Err(StrategyError::InvalidParam { name, .. }) if name == "fast"
        ));
    }

    #[test]
    fn fast_must_be_below_slow() {
        let config = StrategyConfig::new("macd_ema")
            .with_param("fast", 30.0)
            .with_param("slow", 26.0);
        assert!(create(&config).is_err());
    }

    #[test]
    fn crossings() {
        let a = [1.0, 3.0, 1.0];
        let b = [2.0, 2.0, 2.0];
        assert!(crossed_above(&a, &b, 1));
        assert!(crossed_below(&a, &b, 2));
        assert!(!crossed_above(&a, &b, 0));
        assert!(!crossed_above(&[f64::NAN, 3.0], &b, 1));
    }
}
