//! Exit-rule evaluator — stop-loss, take-profit, trailing stop, trailing profit.
//!
//! Long thresholds (short mirrors them through [`Side`]):
//! - stop loss:       entry * (1 - sl%), fires when close <= level
//! - take profit:     entry * (1 + tp%), fires when close >= level
//! - trailing stop:   high_water * (1 - ts%), fires when close <= level and close > entry
//! - trailing profit: high_water * (1 - tp'%), fires when close <= level once armed
//!
//! Rules are checked in that order and the first hit wins. The caller folds
//! the current close into the water mark before evaluating.

use crate::domain::{ExitReason, Position, Side};
use crate::risk::RiskConfig;

/// Trigger prices for an open position. `None` means the rule is disabled
/// (or, for trailing profit, not yet armed).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExitLevels {
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub trailing_stop: Option<f64>,
    pub trailing_profit: Option<f64>,
}

/// The exit thresholds of one run, as percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExitRules {
    stop_loss_pct: Option<f64>,
    take_profit_pct: Option<f64>,
    trailing_stop_pct: Option<f64>,
    trailing_profit_pct: Option<f64>,
}

impl ExitRules {
    pub fn from_risk(risk: &RiskConfig) -> Self {
        Self {
            stop_loss_pct: risk.stop_loss_pct,
            take_profit_pct: risk.take_profit_pct,
            // Trailing distances of zero or less would trail at the extreme itself.
            trailing_stop_pct: risk.trailing_stop_pct.filter(|pct| *pct > 0.0),
            trailing_profit_pct: risk.trailing_profit_pct.filter(|pct| *pct > 0.0),
        }
    }

    /// True when no rule can ever fire.
    pub fn is_empty(&self) -> bool {
        self.stop_loss_pct.is_none()
            && self.take_profit_pct.is_none()
            && self.trailing_stop_pct.is_none()
            && self.trailing_profit_pct.is_none()
    }

    pub fn levels(&self, position: &Position) -> ExitLevels {
        let side = position.side;
        let entry = position.entry_price;
        let mark = position.water_mark();

        let take_profit = self
            .take_profit_pct
            .map(|pct| side.favorable_offset(entry, pct));

        ExitLevels {
            stop_loss: self
                .stop_loss_pct
                .map(|pct| side.adverse_offset(entry, pct)),
            take_profit,
            trailing_stop: self
                .trailing_stop_pct
                .map(|pct| side.adverse_offset(mark, pct)),
            trailing_profit: self
                .trailing_profit_pct
                .filter(|_| trailing_profit_armed(side, entry, mark, take_profit))
                .map(|pct| side.adverse_offset(mark, pct)),
        }
    }

    /// The first rule that fires at `close`, if any.
    pub fn evaluate(&self, position: &Position, close: f64) -> Option<ExitReason> {
        let side = position.side;
        let levels = self.levels(position);

        if levels.stop_loss.is_some_and(|lvl| side.breached(close, lvl)) {
            return Some(ExitReason::StopLoss);
        }
        if levels.take_profit.is_some_and(|lvl| side.reached(close, lvl)) {
            return Some(ExitReason::TakeProfit);
        }
        if levels
            .trailing_stop
            .is_some_and(|lvl| side.breached(close, lvl) && side.beyond(close, position.entry_price))
        {
            return Some(ExitReason::TrailingStop);
        }
        if levels
            .trailing_profit
            .is_some_and(|lvl| side.breached(close, lvl))
        {
            return Some(ExitReason::TrailingProfit);
        }
        None
    }
}

/// Trailing profit arms once the favourable extreme has touched the
/// take-profit level, or moved past entry when no take-profit is set.
fn trailing_profit_armed(side: Side, entry: f64, mark: f64, take_profit: Option<f64>) -> bool {
    match take_profit {
        Some(level) => side.reached(mark, level),
        None => side.beyond(mark, entry),
    }
}
