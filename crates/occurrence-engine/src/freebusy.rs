//! Free/busy computation for groups of attendees.
//!
//! Blocked periods are built per attendee from their segmented occurrences,
//! clipped to a daily time window, padded with the parts of each day outside
//! that window, and merged. Free periods are the gaps between blocked
//! periods inside the window.

use chrono::{Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::event::{AttendeeId, EventStatus};
use crate::expander;
use crate::matcher::{EventMatcher, SearchCriteria};
use crate::merge::remove_overlaps;
use crate::period::{Period, Timed};
use crate::segment::segment_occurrences;
use crate::source::EventSource;

/// A `(start, end)` span of floating local time.
pub type Span = (NaiveDateTime, NaiveDateTime);

/// The hours of each day that availability queries consider, e.g. 09:00-17:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "WindowFields")]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

#[derive(Deserialize)]
struct WindowFields {
    start: NaiveTime,
    end: NaiveTime,
}

impl TryFrom<WindowFields> for TimeWindow {
    type Error = EngineError;

    fn try_from(fields: WindowFields) -> Result<Self> {
        Self::new(fields.start, fields.end)
    }
}

impl TimeWindow {
    /// # Errors
    /// Returns [`EngineError::InvalidTimeWindow`] unless `start < end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if start >= end {
            return Err(EngineError::InvalidTimeWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// The window's start on `date`.
    pub fn opens(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.start)
    }

    /// The window's end on `date`.
    pub fn closes(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.end)
    }
}

/// Compute the spans of `period` during which at least one attendee is
/// unavailable, including every part of each day outside `window`.
///
/// Transparent and canceled events never block, nor do events an attendee
/// has declined or delegated. The result is sorted, disjoint and clipped to
/// `period`.
///
/// # Errors
/// Returns [`EngineError::UnboundedPeriod`] unless both bounds of `period`
/// are set.
#[tracing::instrument(skip_all, fields(attendees = attendees.len()))]
pub fn blocked_periods<S: EventSource + ?Sized>(
    source: &S,
    attendees: &[AttendeeId],
    period: &Period,
    window: &TimeWindow,
) -> Result<Vec<Span>> {
    let (begin, end) = period.bounds()?;
    let mut spans: Vec<Span> = Vec::new();

    for attendee in attendees {
        let criteria = SearchCriteria::for_attendees([attendee.clone()]);
        let events: Vec<_> = source
            .query_events(period, &criteria)
            .into_iter()
            .filter(|event| criteria.matches(event))
            .collect();
        let occurrences = expander::expand_all(&events, period)?;

        let busy: Vec<_> = occurrences
            .into_iter()
            .filter(|occ| {
                let event = &occ.original;
                !event.is_transparent()
                    && event.status() != EventStatus::Canceled
                    && !event
                        .participation_status(attendee)
                        .is_some_and(|status| status.is_absent())
            })
            .collect();

        for segment in segment_occurrences(period, &busy) {
            // A segment never crosses midnight, so its start date is its day.
            let day = segment.start.date();
            let start = segment.start.max(window.opens(day));
            let end = segment.end().min(window.closes(day));
            if start < end {
                spans.push((start, end));
            }
        }
    }

    spans.extend(outside_window(begin, end, window));
    let blocked = remove_overlaps(spans);
    tracing::debug!(blocked = blocked.len(), "computed blocked periods");
    Ok(blocked)
}

/// The parts of each day touched by `[begin, end)` that fall outside
/// `window`, clipped to `[begin, end)`.
fn outside_window(begin: NaiveDateTime, end: NaiveDateTime, window: &TimeWindow) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut day = begin.date();
    loop {
        let midnight = day.and_time(NaiveTime::MIN);
        if midnight >= end {
            break;
        }
        let next = day.checked_add_days(Days::new(1));
        let next_midnight = next.map_or(NaiveDateTime::MAX, |d| d.and_time(NaiveTime::MIN));

        for (start, stop) in [
            (midnight, window.opens(day)),
            (window.closes(day), next_midnight),
        ] {
            let start = start.max(begin);
            let stop = stop.min(end);
            if start < stop {
                spans.push((start, stop));
            }
        }

        match next {
            Some(next) => day = next,
            None => break,
        }
    }
    spans
}

/// Compute the free spans of `period` within `window`.
///
/// The period's first day starts no earlier than the window opens and its
/// last day ends no later than the window closes. Gaps around and between
/// blocked periods are free; with `minimal_duration`, shorter gaps are
/// dropped.
///
/// # Errors
/// Returns [`EngineError::UnboundedPeriod`] unless both bounds of `period`
/// are set.
#[tracing::instrument(skip_all, fields(attendees = attendees.len()))]
pub fn free_periods<S: EventSource + ?Sized>(
    source: &S,
    attendees: &[AttendeeId],
    period: &Period,
    window: &TimeWindow,
    minimal_duration: Option<Duration>,
) -> Result<Vec<Span>> {
    let blocked = blocked_periods(source, attendees, period, window)?;
    let (begin, end) = period.bounds()?;
    let first = begin.max(window.opens(begin.date()));
    let last = end.min(window.closes(end.date()));

    let long_enough =
        |start: NaiveDateTime, stop: NaiveDateTime| minimal_duration.is_none_or(|min| stop - start >= min);

    let mut free = Vec::new();
    let mut cursor = first;
    for (busy_start, busy_end) in blocked {
        if cursor >= last {
            break;
        }
        if cursor < busy_start {
            let stop = busy_start.min(last);
            if long_enough(cursor, stop) {
                free.push((cursor, stop));
            }
        }
        cursor = cursor.max(busy_end);
    }

    // Trailing free span after the last blocked period.
    if cursor < last && long_enough(cursor, last) {
        free.push((cursor, last));
    }

    tracing::debug!(free = free.len(), "computed free periods");
    Ok(free)
}

/// The earliest free span of at least `duration` within `window`.
///
/// # Errors
/// Returns [`EngineError::UnboundedPeriod`] unless both bounds of `period`
/// are set.
pub fn first_free_period<S: EventSource + ?Sized>(
    source: &S,
    attendees: &[AttendeeId],
    period: &Period,
    window: &TimeWindow,
    duration: Duration,
) -> Result<Option<Span>> {
    Ok(free_periods(source, attendees, period, window, Some(duration))?
        .into_iter()
        .next())
}
