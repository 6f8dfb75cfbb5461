//! Domain types for the signal backtester.

pub mod bar;
pub mod position;
pub mod series;
pub mod signal;
pub mod trade;

pub use bar::Bar;
pub use position::{Position, Side};
pub use series::{SeriesError, SignalCounts, SignalSeries};
pub use signal::Signal;
pub use trade::{ExitReason, Trade};
