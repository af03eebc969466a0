//! Occurrence expansion -- turns one event and a period into the concrete
//! occurrences of that event inside the period.

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};

use crate::error::{EngineError, Result};
use crate::event::Event;
use crate::period::{Period, Timed, TimedEntity};

/// One concrete time instance of an event.
///
/// Occurrences are transient: they are recomputed from their event whenever
/// needed and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub start: NaiveDateTime,
    pub duration: Duration,
    pub original: Arc<Event>,
}

impl Occurrence {
    pub fn new(start: NaiveDateTime, duration: Duration, original: Arc<Event>) -> Self {
        Self {
            start,
            duration,
            original,
        }
    }
}

impl Timed for Occurrence {
    fn start(&self) -> NaiveDateTime {
        self.start
    }

    fn duration(&self) -> Duration {
        self.duration
    }
}

/// Expand an event into its occurrences that intersect `period`.
///
/// A non-recurring event produces at most one occurrence, itself. A recurring
/// event produces one candidate per recurrence date up to the period's end
/// date, each at the event's original time of day and with its duration;
/// only candidates intersecting `period` are kept.
///
/// # Errors
/// Returns [`EngineError::UnboundedPeriod`] if the event repeats forever and
/// `period` has no end.
#[tracing::instrument(skip_all, fields(event = %event.id()))]
pub fn expand(event: &Arc<Event>, period: &Period) -> Result<Vec<Occurrence>> {
    let Some(rule) = event.recurrence() else {
        if !period.intersects(event.as_ref()) {
            return Ok(Vec::new());
        }
        return Ok(vec![Occurrence::new(
            event.start(),
            event.duration(),
            Arc::clone(event),
        )]);
    };

    if rule.is_unbounded() && period.end.is_none() {
        return Err(EngineError::UnboundedPeriod);
    }

    let time_of_day = event.start().time();
    let duration = event.duration();
    let enddate = period.end.map(|end| end.date());

    let occurrences: Vec<Occurrence> = rule
        .apply(event.as_ref(), enddate)
        .map(|date| TimedEntity::new(date.and_time(time_of_day), duration))
        .filter(|candidate| period.intersects(candidate))
        .map(|candidate| Occurrence::new(candidate.start, duration, Arc::clone(event)))
        .collect();

    tracing::debug!(count = occurrences.len(), "expanded recurring event");
    Ok(occurrences)
}

/// Expand every event and concatenate the results, in input order.
///
/// # Errors
/// Fails on the first event that [`expand`] rejects.
pub fn expand_all<'a>(
    events: impl IntoIterator<Item = &'a Arc<Event>>,
    period: &Period,
) -> Result<Vec<Occurrence>> {
    let mut occurrences = Vec::new();
    for event in events {
        occurrences.extend(expand(event, period)?);
    }
    Ok(occurrences)
}
