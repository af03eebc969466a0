//! # occurrence-engine
//!
//! Turns abstract calendar events into the concrete occurrences they produce,
//! and derives free/busy information for groups of attendees.
//!
//! All instants are floating local time (`chrono::NaiveDateTime`); time zone
//! normalization is the caller's job. Every query is a pure function of
//! its inputs.
//!
//! ## Quick start
//!
//! ```rust
//! use chrono::{Duration, NaiveDate};
//! use occurrence_engine::{expand, Event, NewEvent, Period, RuleBuilder};
//! use std::sync::Arc;
//!
//! let start = NaiveDate::from_ymd_opt(2005, 4, 1).unwrap().and_hms_opt(16, 0, 0).unwrap();
//! let mut draft = NewEvent::new(start, Duration::hours(1));
//! draft.recurrence = Some(RuleBuilder::daily().build().unwrap());
//! let event = Arc::new(Event::new("standup", draft).unwrap());
//!
//! let period = Period::bounded(
//!     NaiveDate::from_ymd_opt(2005, 4, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
//!     NaiveDate::from_ymd_opt(2005, 4, 10).unwrap().and_hms_opt(0, 0, 0).unwrap(),
//! );
//! assert_eq!(expand(&event, &period).unwrap().len(), 9);
//! ```
//!
//! ## Modules
//!
//! - [`recurrence`]: recurrence rule variants and the lazy date iterator
//! - [`expander`]: event + period → concrete occurrences
//! - [`segment`]: split occurrences at day and period boundaries
//! - [`merge`]: merge overlapping ranges
//! - [`matcher`]: attendee/category/organizer predicates
//! - [`freebusy`]: blocked and free periods for groups of attendees
//! - [`source`]: the storage boundary and read-side queries
//! - [`event`]: events and their participation model
//! - [`period`]: half-open periods and the timed-entity shape
//! - [`error`]: error types

pub mod error;
pub mod event;
pub mod expander;
pub mod freebusy;
pub mod matcher;
pub mod merge;
pub mod period;
pub mod recurrence;
pub mod segment;
pub mod source;

pub use error::EngineError;
pub use event::{
    AccessLevel, AttendeeId, Event, EventChange, EventStatus, NewEvent, Participation,
    ParticipationRole, ParticipationStatus,
};
pub use expander::{expand, expand_all, Occurrence};
pub use freebusy::{blocked_periods, first_free_period, free_periods, Span, TimeWindow};
pub use matcher::{EventMatcher, SearchCriteria};
pub use merge::remove_overlaps;
pub use period::{Period, Timed, TimedEntity};
pub use recurrence::{MonthlyMode, RecurrenceRule, Recurrences, RuleBounds, RuleBuilder, WeekdaySet};
pub use segment::segment_occurrences;
pub use source::EventSource;
