//! Error types for occurrence-engine operations.

use chrono::{Duration, NaiveTime};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid interval: {0} (must be a positive integer)")]
    InvalidInterval(u32),

    #[error("Invalid recurrence: count and until cannot both be set")]
    CountAndUntil,

    #[error("Invalid exception date: {0}")]
    InvalidException(String),

    /// Weekday indexes run from 0 (Monday) to 6 (Sunday).
    #[error("Invalid weekday index: {0} (must be 0..=6)")]
    InvalidWeekday(u8),

    #[error("Unsupported monthly mode: {0}")]
    UnsupportedMonthlyMode(String),

    #[error("Period is unbounded")]
    UnboundedPeriod,

    #[error("Invalid time window: {start} is not before {end}")]
    InvalidTimeWindow { start: NaiveTime, end: NaiveTime },

    #[error("Negative duration: {0}")]
    NegativeDuration(Duration),

    #[error("Duration out of range: {0}")]
    DurationOverflow(Duration),

    #[error("Invalid {kind}: {value}")]
    InvalidToken { kind: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;
