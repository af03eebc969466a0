//! Half-open periods over floating local instants, and the timed-entity shape
//! shared by events and occurrences.

use chrono::{Days, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Anything with a start instant and a duration.
pub trait Timed {
    fn start(&self) -> NaiveDateTime;

    fn duration(&self) -> Duration;

    /// Exclusive end instant (`start + duration`), saturating at
    /// [`NaiveDateTime::MAX`].
    fn end(&self) -> NaiveDateTime {
        self.start()
            .checked_add_signed(self.duration())
            .unwrap_or(NaiveDateTime::MAX)
    }
}

/// A bare `{start, duration}` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEntity {
    pub start: NaiveDateTime,
    pub duration: Duration,
}

impl TimedEntity {
    pub fn new(start: NaiveDateTime, duration: Duration) -> Self {
        Self { start, duration }
    }
}

impl Timed for TimedEntity {
    fn start(&self) -> NaiveDateTime {
        self.start
    }

    fn duration(&self) -> Duration {
        self.duration
    }
}

/// A half-open interval `[begin, end)`. An absent bound is unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Period {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDateTime>,
}

impl Period {
    pub fn new(begin: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self { begin, end }
    }

    pub fn bounded(begin: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            begin: Some(begin),
            end: Some(end),
        }
    }

    /// The period covering all of time.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// The whole of `date`: `[date 00:00, date+1 00:00)`.
    pub fn day(date: NaiveDate) -> Self {
        let begin = date.and_time(chrono::NaiveTime::MIN);
        let end = date
            .checked_add_days(Days::new(1))
            .map(|next| next.and_time(chrono::NaiveTime::MIN));
        Self {
            begin: Some(begin),
            end,
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.begin.is_some() && self.end.is_some()
    }

    /// Both bounds, or [`EngineError::UnboundedPeriod`] if either is absent.
    pub fn bounds(&self) -> Result<(NaiveDateTime, NaiveDateTime)> {
        match (self.begin, self.end) {
            (Some(begin), Some(end)) => Ok((begin, end)),
            _ => Err(EngineError::UnboundedPeriod),
        }
    }

    /// Whether `timed` overlaps this period.
    ///
    /// A timed entity `{s, d}` is excluded only when it ends at or before
    /// `begin`, or starts at or after `end`. Zero-length entities strictly
    /// inside the period therefore intersect it.
    pub fn intersects<T: Timed + ?Sized>(&self, timed: &T) -> bool {
        if let Some(begin) = self.begin {
            if timed.end() <= begin {
                return false;
            }
        }
        if let Some(end) = self.end {
            if timed.start() >= end {
                return false;
            }
        }
        true
    }
}
