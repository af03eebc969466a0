//! Event filtering by attendee, participation, category and organizer.

use serde::{Deserialize, Serialize};

use crate::event::{AttendeeId, Event, ParticipationRole, ParticipationStatus};

/// A predicate over events.
pub trait EventMatcher {
    fn matches(&self, event: &Event) -> bool;
}

impl<F> EventMatcher for F
where
    F: Fn(&Event) -> bool,
{
    fn matches(&self, event: &Event) -> bool {
        self(event)
    }
}

/// Search filters. Every unset field is a wildcard, so the default criteria
/// match every event. A list that is set but empty matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<AttendeeId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participation_status: Option<ParticipationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participation_role: Option<ParticipationRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer: Option<AttendeeId>,
}

impl SearchCriteria {
    /// Criteria matching events any of `attendees` takes part in.
    pub fn for_attendees(attendees: impl IntoIterator<Item = AttendeeId>) -> Self {
        Self {
            attendees: Some(attendees.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Criteria matching events organized by `organizer`.
    pub fn for_organizer(organizer: AttendeeId) -> Self {
        Self {
            organizer: Some(organizer),
            ..Self::default()
        }
    }

    /// Copy these criteria, filling only the fields they leave unset from
    /// `overrides`.
    ///
    /// The receiver's own values win: an attendee list already set here is
    /// kept even if `overrides` names different attendees. Empty attendee
    /// or category lists count as unset.
    #[must_use]
    pub fn clone_with(&self, overrides: &SearchCriteria) -> SearchCriteria {
        SearchCriteria {
            attendees: non_empty(&self.attendees).or_else(|| overrides.attendees.clone()),
            participation_status: self.participation_status.or(overrides.participation_status),
            participation_role: self.participation_role.or(overrides.participation_role),
            categories: non_empty(&self.categories).or_else(|| overrides.categories.clone()),
            organizer: self.organizer.clone().or_else(|| overrides.organizer.clone()),
        }
    }

    /// Whether `attendee` is on `event` with the requested status and role.
    fn attendee_matches(&self, event: &Event, attendee: &AttendeeId) -> bool {
        let Some(participation) = event.participation(attendee) else {
            return false;
        };
        self.participation_status
            .is_none_or(|status| status == participation.status)
            && self
                .participation_role
                .is_none_or(|role| role == participation.role)
    }
}

impl EventMatcher for SearchCriteria {
    fn matches(&self, event: &Event) -> bool {
        if let Some(categories) = &self.categories {
            if !categories.iter().any(|c| event.in_category(c)) {
                return false;
            }
        }

        if let Some(organizer) = &self.organizer {
            if event.organizer() != Some(organizer) {
                return false;
            }
        }

        match &self.attendees {
            None => true,
            Some(attendees) => attendees
                .iter()
                .any(|attendee| self.attendee_matches(event, attendee)),
        }
    }
}

fn non_empty<T: Clone>(list: &Option<Vec<T>>) -> Option<Vec<T>> {
    list.as_ref().filter(|items| !items.is_empty()).cloned()
}
