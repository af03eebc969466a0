//! The boundary to event storage, and the read-side queries built on it.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::Result;
use crate::event::Event;
use crate::expander::{self, Occurrence};
use crate::matcher::EventMatcher;
use crate::period::{Period, Timed};
use crate::segment::segment_occurrences;

/// Where events come from.
///
/// Implementations may return events that do not actually intersect
/// `period` (for example when they index coarsely); every query in this
/// crate re-checks the period itself. They must only return events the
/// matcher accepts.
pub trait EventSource {
    fn query_events(&self, period: &Period, matcher: &dyn EventMatcher) -> Vec<Arc<Event>>;
}

/// An in-memory list of events. Returns every matching event regardless of
/// `period`.
impl EventSource for [Arc<Event>] {
    fn query_events(&self, _period: &Period, matcher: &dyn EventMatcher) -> Vec<Arc<Event>> {
        self.iter()
            .filter(|event| matcher.matches(event))
            .cloned()
            .collect()
    }
}

impl EventSource for Vec<Arc<Event>> {
    fn query_events(&self, period: &Period, matcher: &dyn EventMatcher) -> Vec<Arc<Event>> {
        self.as_slice().query_events(period, matcher)
    }
}

/// Matching events whose own time span intersects `period`, sorted by
/// start and then id.
///
/// Recurring events are included only when their first instance intersects
/// the period; use [`occurrences`] to see later instances.
pub fn events_in_period<S: EventSource + ?Sized>(
    source: &S,
    period: &Period,
    matcher: &dyn EventMatcher,
) -> Vec<Arc<Event>> {
    let mut events: Vec<Arc<Event>> = source
        .query_events(period, matcher)
        .into_iter()
        .filter(|event| period.intersects(event.as_ref()))
        .collect();
    events.sort_by(|a, b| (a.start(), a.id()).cmp(&(b.start(), b.id())));
    events
}

/// All occurrences of matching events inside `period`.
///
/// # Errors
/// Returns [`crate::EngineError::UnboundedPeriod`] unless both bounds are set.
pub fn occurrences<S: EventSource + ?Sized>(
    source: &S,
    period: &Period,
    matcher: &dyn EventMatcher,
) -> Result<Vec<Occurrence>> {
    period.bounds()?;
    let events = source.query_events(period, matcher);
    expander::expand_all(&events, period)
}

/// Like [`occurrences`], split at day and period boundaries.
///
/// # Errors
/// Returns [`crate::EngineError::UnboundedPeriod`] unless both bounds are set.
pub fn occurrences_segmented<S: EventSource + ?Sized>(
    source: &S,
    period: &Period,
    matcher: &dyn EventMatcher,
) -> Result<Vec<Occurrence>> {
    let occurrences = occurrences(source, period, matcher)?;
    Ok(segment_occurrences(period, &occurrences))
}

/// Matching events touching `date`.
pub fn events_in_day<S: EventSource + ?Sized>(
    source: &S,
    date: NaiveDate,
    matcher: &dyn EventMatcher,
) -> Vec<Arc<Event>> {
    events_in_period(source, &Period::day(date), matcher)
}

/// The parts of matching occurrences that fall on `date`.
///
/// # Errors
/// Only fails for the last representable date, whose day has no end.
pub fn occurrences_in_day<S: EventSource + ?Sized>(
    source: &S,
    date: NaiveDate,
    matcher: &dyn EventMatcher,
) -> Result<Vec<Occurrence>> {
    occurrences_segmented(source, &Period::day(date), matcher)
}
