//! Calendar events and their participation model.
//!
//! Events are plain values. Creating, storing and deleting them belongs to the
//! caller's storage layer; this module only guarantees the value invariants
//! (all-day normalization, non-negative duration) and reports participation
//! changes back to the caller as [`EventChange`] values instead of
//! broadcasting them.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::period::Timed;
use crate::recurrence::RecurrenceRule;

/// Opaque attendee identity, as handed out by the attendee directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttendeeId(String);

impl AttendeeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttendeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AttendeeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AttendeeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An attendee's response to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum ParticipationStatus {
    NeedsAction,
    Accepted,
    Declined,
    Tentative,
    Delegated,
}

impl ParticipationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NeedsAction => "NEEDS-ACTION",
            Self::Accepted => "ACCEPTED",
            Self::Declined => "DECLINED",
            Self::Tentative => "TENTATIVE",
            Self::Delegated => "DELEGATED",
        }
    }

    /// Whether an attendee with this status is not going to attend.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Declined | Self::Delegated)
    }
}

impl FromStr for ParticipationStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NEEDS-ACTION" => Ok(Self::NeedsAction),
            "ACCEPTED" => Ok(Self::Accepted),
            "DECLINED" => Ok(Self::Declined),
            "TENTATIVE" => Ok(Self::Tentative),
            "DELEGATED" => Ok(Self::Delegated),
            other => Err(invalid_token("participation status", other)),
        }
    }
}

/// An attendee's function in an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum ParticipationRole {
    Chair,
    #[default]
    ReqParticipant,
    OptParticipant,
    NonParticipant,
}

impl ParticipationRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chair => "CHAIR",
            Self::ReqParticipant => "REQ-PARTICIPANT",
            Self::OptParticipant => "OPT-PARTICIPANT",
            Self::NonParticipant => "NON-PARTICIPANT",
        }
    }
}

impl FromStr for ParticipationRole {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CHAIR" => Ok(Self::Chair),
            "REQ-PARTICIPANT" => Ok(Self::ReqParticipant),
            "OPT-PARTICIPANT" => Ok(Self::OptParticipant),
            "NON-PARTICIPANT" => Ok(Self::NonParticipant),
            other => Err(invalid_token("participation role", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum EventStatus {
    #[default]
    Tentative,
    Confirmed,
    Canceled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tentative => "TENTATIVE",
            Self::Confirmed => "CONFIRMED",
            Self::Canceled => "CANCELED",
        }
    }
}

impl FromStr for EventStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "TENTATIVE" => Ok(Self::Tentative),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELED" => Ok(Self::Canceled),
            other => Err(invalid_token("event status", other)),
        }
    }
}

/// Access class of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum AccessLevel {
    #[default]
    Public,
    Private,
    Confidential,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Private => "PRIVATE",
            Self::Confidential => "CONFIDENTIAL",
        }
    }
}

impl FromStr for AccessLevel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PUBLIC" => Ok(Self::Public),
            "PRIVATE" => Ok(Self::Private),
            "CONFIDENTIAL" => Ok(Self::Confidential),
            other => Err(invalid_token("access level", other)),
        }
    }
}

fn invalid_token(kind: &'static str, value: &str) -> EngineError {
    EngineError::InvalidToken {
        kind,
        value: value.to_string(),
    }
}

macro_rules! display_as_token {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_token!(ParticipationStatus, ParticipationRole, EventStatus, AccessLevel);

/// One attendee's standing on an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
    pub status: ParticipationStatus,
    pub role: ParticipationRole,
}

/// What a participation mutator changed. Routing it anywhere is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventChange {
    StatusChanged {
        event_id: String,
        attendee: AttendeeId,
        old: Option<ParticipationStatus>,
        new: Option<ParticipationStatus>,
    },
    RoleChanged {
        event_id: String,
        attendee: AttendeeId,
        old: ParticipationRole,
        new: ParticipationRole,
    },
}

/// The fields of an [`Event`] before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub start: NaiveDateTime,
    /// `None` is only meaningful for all-day events, where it means one day.
    pub duration: Option<Duration>,
    pub title: String,
    pub description: String,
    pub location: String,
    pub status: EventStatus,
    pub organizer: Option<AttendeeId>,
    pub recurrence: Option<RecurrenceRule>,
    pub all_day: bool,
    pub categories: BTreeSet<String>,
    pub transparent: bool,
    pub access: AccessLevel,
    /// `(attendee, role, status)` triples.
    pub attendees: Vec<(AttendeeId, ParticipationRole, ParticipationStatus)>,
}

impl NewEvent {
    pub fn new(start: NaiveDateTime, duration: Duration) -> Self {
        Self {
            start,
            duration: Some(duration),
            title: String::new(),
            description: String::new(),
            location: String::new(),
            status: EventStatus::default(),
            organizer: None,
            recurrence: None,
            all_day: false,
            categories: BTreeSet::new(),
            transparent: false,
            access: AccessLevel::default(),
            attendees: Vec::new(),
        }
    }

    /// An all-day event starting on `start`'s date.
    pub fn all_day(start: NaiveDateTime, duration: Option<Duration>) -> Self {
        Self {
            duration,
            all_day: true,
            ..Self::new(start, Duration::zero())
        }
    }
}

/// A calendar event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    id: String,
    start: NaiveDateTime,
    duration: Duration,
    title: String,
    description: String,
    location: String,
    status: EventStatus,
    organizer: Option<AttendeeId>,
    recurrence: Option<RecurrenceRule>,
    all_day: bool,
    categories: BTreeSet<String>,
    transparent: bool,
    access: AccessLevel,
    participation: HashMap<AttendeeId, Participation>,
}

impl Event {
    /// Build an event from a [`NewEvent`].
    ///
    /// All-day events are normalized: the start moves to midnight and the
    /// duration is rounded up to whole days, at least one. The organizer, if
    /// any, is recorded as an accepted required participant.
    ///
    /// # Errors
    /// Returns [`EngineError::NegativeDuration`] if the duration is negative,
    /// and [`EngineError::DurationOverflow`] if the event would end past the
    /// last representable instant.
    pub fn new(id: impl Into<String>, draft: NewEvent) -> Result<Self> {
        let mut start = draft.start;
        let mut duration = draft.duration.unwrap_or_else(Duration::zero);
        if duration < Duration::zero() {
            return Err(EngineError::NegativeDuration(duration));
        }
        if draft.all_day {
            start = start.date().and_time(NaiveTime::MIN);
            duration = whole_days(draft.duration);
        }
        if start.checked_add_signed(duration).is_none() {
            return Err(EngineError::DurationOverflow(duration));
        }

        let mut participation = HashMap::new();
        if let Some(organizer) = &draft.organizer {
            participation.insert(
                organizer.clone(),
                Participation {
                    status: ParticipationStatus::Accepted,
                    role: ParticipationRole::ReqParticipant,
                },
            );
        }
        for (attendee, role, status) in draft.attendees {
            participation.insert(attendee, Participation { status, role });
        }

        Ok(Self {
            id: id.into(),
            start,
            duration,
            title: draft.title,
            description: draft.description,
            location: draft.location,
            status: draft.status,
            organizer: draft.organizer,
            recurrence: draft.recurrence,
            all_day: draft.all_day,
            categories: draft.categories,
            transparent: draft.transparent,
            access: draft.access,
            participation,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn status(&self) -> EventStatus {
        self.status
    }

    pub fn organizer(&self) -> Option<&AttendeeId> {
        self.organizer.as_ref()
    }

    pub fn recurrence(&self) -> Option<&RecurrenceRule> {
        self.recurrence.as_ref()
    }

    pub fn is_all_day(&self) -> bool {
        self.all_day
    }

    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.categories.contains(category)
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    pub fn access(&self) -> AccessLevel {
        self.access
    }

    pub fn has_attendee(&self, attendee: &AttendeeId) -> bool {
        self.participation.contains_key(attendee)
    }

    pub fn participation(&self, attendee: &AttendeeId) -> Option<Participation> {
        self.participation.get(attendee).copied()
    }

    pub fn participation_status(&self, attendee: &AttendeeId) -> Option<ParticipationStatus> {
        self.participation.get(attendee).map(|p| p.status)
    }

    pub fn participation_role(&self, attendee: &AttendeeId) -> Option<ParticipationRole> {
        self.participation.get(attendee).map(|p| p.role)
    }

    /// Attendees, optionally restricted to a status and/or role, sorted by id.
    pub fn attendee_ids(
        &self,
        status: Option<ParticipationStatus>,
        role: Option<ParticipationRole>,
    ) -> Vec<&AttendeeId> {
        let mut ids: Vec<&AttendeeId> = self
            .participation
            .iter()
            .filter(|(_, p)| status.is_none_or(|s| s == p.status))
            .filter(|(_, p)| role.is_none_or(|r| r == p.role))
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        ids
    }

    /// Invite attendees who are not on the event yet, as required
    /// participants awaiting a response.
    pub fn invite<'a>(&mut self, attendees: impl IntoIterator<Item = &'a AttendeeId>) -> Vec<EventChange> {
        attendees
            .into_iter()
            .filter_map(|attendee| {
                if self.has_attendee(attendee) {
                    return None;
                }
                self.set_participation_status(attendee, Some(ParticipationStatus::NeedsAction))
            })
            .collect()
    }

    /// Set (or with `None`, remove) an attendee's status.
    ///
    /// Attendees added this way get the default role. Returns `None` when
    /// the status was already `status`.
    pub fn set_participation_status(
        &mut self,
        attendee: &AttendeeId,
        status: Option<ParticipationStatus>,
    ) -> Option<EventChange> {
        let old = self.participation_status(attendee);
        if old == status {
            return None;
        }
        match status {
            Some(status) => {
                self.participation
                    .entry(attendee.clone())
                    .and_modify(|p| p.status = status)
                    .or_insert(Participation {
                        status,
                        role: ParticipationRole::default(),
                    });
            }
            None => {
                self.participation.remove(attendee);
            }
        }
        Some(EventChange::StatusChanged {
            event_id: self.id.clone(),
            attendee: attendee.clone(),
            old,
            new: status,
        })
    }

    /// Change the role of an attendee already on the event.
    ///
    /// Returns `None` when the attendee is not on the event or already has
    /// that role.
    pub fn set_participation_role(
        &mut self,
        attendee: &AttendeeId,
        role: ParticipationRole,
    ) -> Option<EventChange> {
        let entry = self.participation.get_mut(attendee)?;
        if entry.role == role {
            return None;
        }
        let old = std::mem::replace(&mut entry.role, role);
        Some(EventChange::RoleChanged {
            event_id: self.id.clone(),
            attendee: attendee.clone(),
            old,
            new: role,
        })
    }
}

impl Timed for Event {
    fn start(&self) -> NaiveDateTime {
        self.start
    }

    fn duration(&self) -> Duration {
        self.duration
    }
}

/// Round a duration up to whole days; a missing or zero duration is one day.
fn whole_days(duration: Option<Duration>) -> Duration {
    let Some(duration) = duration else {
        return Duration::days(1);
    };
    let mut days = duration.num_days();
    if duration != Duration::days(days) || days == 0 {
        days += 1;
    }
    Duration::days(days)
}
