//! Risk parameters for a single backtest run.

use serde::{Deserialize, Serialize};

pub const DEFAULT_RISK_PER_TRADE_PCT: f64 = 1.0;

/// Exit thresholds and position sizing. `None` disables a rule.
///
/// All percentages are in percent units (`5.0` means 5%). Values are not
/// range-checked: a negative take-profit inverts the trigger silently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub take_profit_pct: Option<f64>,
    pub stop_loss_pct: Option<f64>,
    pub trailing_stop_pct: Option<f64>,
    pub trailing_profit_pct: Option<f64>,
    /// Share of the current balance committed to each new position.
    pub risk_per_trade_pct: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            take_profit_pct: None,
            stop_loss_pct: None,
            trailing_stop_pct: None,
            trailing_profit_pct: None,
            risk_per_trade_pct: DEFAULT_RISK_PER_TRADE_PCT,
        }
    }
}

impl RiskConfig {
    pub fn with_take_profit(mut self, pct: f64) -> Self {
        self.take_profit_pct = Some(pct);
        self
    }

    pub fn with_stop_loss(mut self, pct: f64) -> Self {
        self.stop_loss_pct = Some(pct);
        self
    }

    pub fn with_trailing_stop(mut self, pct: f64) -> Self {
        self.trailing_stop_pct = Some(pct);
        self
    }

    pub fn with_trailing_profit(mut self, pct: f64) -> Self {
        self.trailing_profit_pct = Some(pct);
        self
    }

    pub fn with_risk_per_trade(mut self, pct: f64) -> Self {
        self.risk_per_trade_pct = pct;
        self
    }

    /// Notional committed when opening from `balance`.
    pub fn position_size(&self, balance: f64) -> f64 {
        balance * self.risk_per_trade_pct / 100.0
    }

    /// Percent fields that are set to a negative value.
    pub fn negative_fields(&self) -> Vec<&'static str> {
        [
            ("take_profit_pct", self.take_profit_pct),
            ("stop_loss_pct", self.stop_loss_pct),
            ("trailing_stop_pct", self.trailing_stop_pct),
            ("trailing_profit_pct", self.trailing_profit_pct),
        ]
        .into_iter()
        .filter_map(|(name, v)| v.filter(|pct| *pct < 0.0).map(|_| name))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_disables_all_exits() {
        let risk = RiskConfig::default();
        assert!(risk.take_profit_pct.is_none());
        assert!(risk.stop_loss_pct.is_none());
        assert!(risk.trailing_stop_pct.is_none());
        assert!(risk.trailing_profit_pct.is_none());
        assert_eq!(risk.risk_per_trade_pct, 1.0);
    }

    #[test]
    fn position_size_is_share_of_balance() {
        let risk = RiskConfig::default().with_risk_per_trade(2.5);
        assert!((risk.position_size(1000.0) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn partial_input_keeps_defaults() {
        let risk: RiskConfig = serde_json::from_str(r#"{"stop_loss_pct": 5.0}"#).unwrap();
        assert_eq!(risk.stop_loss_pct, Some(5.0));
        assert_eq!(risk.risk_per_trade_pct, 1.0);
    }

    #[test]
    fn negative_fields_are_listed() {
        let risk = RiskConfig::default()
            .with_take_profit(-1.0)
            .with_stop_loss(5.0);
        assert_eq!(risk.negative_fields(), vec!["take_profit_pct"]);
    }
}
