//! Input adapters: tabular data in, [`SignalSeries`](crate::domain::SignalSeries) out.

pub mod frame;

pub use frame::{
    bars_from_frame, series_from_frame, series_from_frame_or_hold, series_to_frame,
    REQUIRED_COLUMNS,
};
