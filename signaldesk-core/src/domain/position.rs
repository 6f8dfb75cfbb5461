//! Position side and the single open-position slot.
//!
//! All side-dependent arithmetic lives on [`Side`] so the engine never
//! branches on LONG/SHORT: a short is a long with the sign flipped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::signal::Signal;
use super::trade::{ExitReason, Trade};

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// The side a flat book opens on this signal, if any.
    pub fn from_entry_signal(signal: Signal) -> Option<Self> {
        match signal {
            Signal::Buy => Some(Side::Long),
            Signal::Sell => Some(Side::Short),
            Signal::Hold => None,
        }
    }

    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    /// The signal that closes a position held on this side.
    pub fn opposing_signal(self) -> Signal {
        match self {
            Side::Long => Signal::Sell,
            Side::Short => Signal::Buy,
        }
    }

    /// Fractional return of moving from `entry` to `price`, positive when favourable.
    ///
    /// Long: `price / entry - 1`. Short: `1 - price / entry`.
    pub fn return_fraction(self, entry: f64, price: f64) -> f64 {
        match self {
            Side::Long => price / entry - 1.0,
            Side::Short => 1.0 - price / entry,
        }
    }

    /// `price` moved `pct` percent in the favourable direction.
    pub fn favorable_offset(self, price: f64, pct: f64) -> f64 {
        price * (1.0 + self.sign() * pct / 100.0)
    }

    /// `price` moved `pct` percent in the adverse direction.
    pub fn adverse_offset(self, price: f64, pct: f64) -> f64 {
        price * (1.0 - self.sign() * pct / 100.0)
    }

    /// True when `price` is at or beyond `level` in the favourable direction.
    pub fn reached(self, price: f64, level: f64) -> bool {
        match self {
            Side::Long => price >= level,
            Side::Short => price <= level,
        }
    }

    /// True when `price` is at or beyond `level` in the adverse direction.
    pub fn breached(self, price: f64, level: f64) -> bool {
        match self {
            Side::Long => price <= level,
            Side::Short => price >= level,
        }
    }

    /// True when `price` is strictly beyond `level` in the favourable direction.
    pub fn beyond(self, price: f64, level: f64) -> bool {
        match self {
            Side::Long => price > level,
            Side::Short => price < level,
        }
    }

    /// The more favourable of two prices (max for long, min for short).
    pub fn best_of(self, a: f64, b: f64) -> f64 {
        match self {
            Side::Long => a.max(b),
            Side::Short => a.min(b),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Long => "LONG",
            Side::Short => "SHORT",
        }
    }
}

/// The open position. At most one exists per backtest at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    pub entry_time: DateTime<Utc>,
    pub entry_index: usize,
    pub entry_price: f64,
    /// Notional committed at entry.
    pub size: f64,
    /// Most favourable close seen since entry (high-water for long, low-water for short).
    water_mark: f64,
}

impl Position {
    pub fn open(
        side: Side,
        entry_time: DateTime<Utc>,
        entry_index: usize,
        entry_price: f64,
        size: f64,
    ) -> Self {
        debug_assert!(entry_price > 0.0, "entry price must be positive");
        Self {
            side,
            entry_time,
            entry_index,
            entry_price,
            size,
            water_mark: entry_price,
        }
    }

    /// Fold the current close into the favourable extreme.
    pub fn update_mark(&mut self, close: f64) {
        self.water_mark = self.side.best_of(self.water_mark, close);
    }

    pub fn water_mark(&self) -> f64 {
        self.water_mark
    }

    /// Maximum close since entry. Only tracked for longs.
    pub fn high_water_mark(&self) -> Option<f64> {
        (self.side == Side::Long).then_some(self.water_mark)
    }

    /// Minimum close since entry. Only tracked for shorts.
    pub fn low_water_mark(&self) -> Option<f64> {
        (self.side == Side::Short).then_some(self.water_mark)
    }

    /// Mark-to-market P&L at `price`.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.size * self.side.return_fraction(self.entry_price, price)
    }

    /// Consume the position into an immutable trade record.
    pub fn close(
        self,
        exit_time: DateTime<Utc>,
        exit_index: usize,
        exit_price: f64,
        exit_reason: ExitReason,
    ) -> Trade {
        let ratio = self.side.return_fraction(self.entry_price, exit_price);
        Trade {
            side: self.side,
            entry_time: self.entry_time,
            entry_price: self.entry_price,
            exit_time,
            exit_price,
            size: self.size,
            profit_loss: self.size * ratio,
            profit_loss_pct: ratio * 100.0,
            exit_reason,
            bars_held: exit_index.saturating_sub(self.entry_index),
        }
    }
}
