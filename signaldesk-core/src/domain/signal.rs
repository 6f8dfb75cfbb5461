//! Per-bar discrete trading decision.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading decision attached to a single bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Signal {
    /// Parse a textual signal. Anything outside BUY/SELL/HOLD is HOLD.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "BUY" => Signal::Buy,
            "SELL" => Signal::Sell,
            _ => Signal::Hold,
        }
    }

    /// Numeric encoding used by some strategy outputs: 1 = BUY, -1 = SELL, 0 = HOLD.
    pub fn from_numeric(value: f64) -> Self {
        if value > 0.0 {
            Signal::Buy
        } else if value < 0.0 {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!(Signal::from_label("BUY"), Signal::Buy);
        assert_eq!(Signal::from_label(" sell "), Signal::Sell);
        assert_eq!(Signal::from_label("Hold"), Signal::Hold);
    }

    #[test]
    fn unknown_label_is_hold() {
        assert_eq!(Signal::from_label("STRONG_BUY"), Signal::Hold);
        assert_eq!(Signal::from_label(""), Signal::Hold);
    }

    #[test]
    fn numeric_encoding() {
        assert_eq!(Signal::from_numeric(1.0), Signal::Buy);
        assert_eq!(Signal::from_numeric(-1.0), Signal::Sell);
        assert_eq!(Signal::from_numeric(0.0), Signal::Hold);
        assert_eq!(Signal::from_numeric(f64::NAN), Signal::Hold);
    }

    #[test]
    fn serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Signal::Buy).unwrap(), "\"BUY\"");
        let parsed: Signal = serde_json::from_str("\"SELL\"").unwrap();
        assert_eq!(parsed, Signal::Sell);
    }
}
