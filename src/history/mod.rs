//! Run-history aggregation and demo data.
//!
//! Produces the completion time-of-day trend shown in the history tab,
//! plus a deterministic synthetic generator for demos.

mod aggregate;
mod synthetic;

pub use aggregate::{
    daily_trend, RunHistoryStore, RunRecord, TrendPoint, DEFAULT_WINDOW_DAYS,
};
pub use synthetic::{synthetic_history, SyntheticHistoryConfig};
