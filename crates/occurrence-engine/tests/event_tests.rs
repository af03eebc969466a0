//! Tests for event construction and participation changes.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use occurrence_engine::{
    AttendeeId, EngineError, Event, EventChange, NewEvent, ParticipationRole,
    ParticipationStatus, Timed,
};

fn at(day: u32, hour: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2005, 4, day)
        .unwrap()
        .and_hms_opt(hour, min, 0)
        .unwrap()
}

fn id(name: &str) -> AttendeeId {
    AttendeeId::from(name)
}

fn meeting() -> Event {
    let mut draft = NewEvent::new(at(13, 14, 0), Duration::hours(1));
    draft.organizer = Some(id("alice"));
    Event::new("meeting", draft).unwrap()
}

// ── Construction ────────────────────────────────────────────────────────────

#[test]
fn timed_event_keeps_start_and_duration() {
    let event = Event::new("a", NewEvent::new(at(13, 14, 30), Duration::minutes(45))).unwrap();
    assert_eq!(event.start(), at(13, 14, 30));
    assert_eq!(event.duration(), Duration::minutes(45));
    assert_eq!(event.end(), at(13, 15, 15));
    assert!(!event.is_all_day());
}

#[test]
fn negative_duration_is_rejected() {
    let result = Event::new("a", NewEvent::new(at(13, 14, 0), Duration::hours(-1)));
    assert_eq!(result, Err(EngineError::NegativeDuration(Duration::hours(-1))));
}

#[test]
fn duration_past_the_last_instant_is_rejected() {
    let huge = Duration::days(200_000_000);

    let timed = Event::new("a", NewEvent::new(at(1, 9, 0), huge));
    assert_eq!(timed, Err(EngineError::DurationOverflow(huge)));

    let all_day = Event::new("b", NewEvent::all_day(at(1, 9, 0), Some(huge)));
    assert_eq!(all_day, Err(EngineError::DurationOverflow(huge)));
}

#[test]
fn all_day_event_starts_at_midnight_and_lasts_a_day() {
    let event = Event::new("holiday", NewEvent::all_day(at(13, 15, 20), None)).unwrap();
    assert!(event.is_all_day());
    assert_eq!(event.start(), at(13, 0, 0));
    assert_eq!(event.duration(), Duration::days(1));
}

#[test]
fn all_day_duration_rounds_up_to_whole_days() {
    let partial = Event::new(
        "trip",
        NewEvent::all_day(at(13, 9, 0), Some(Duration::hours(30))),
    )
    .unwrap();
    assert_eq!(partial.duration(), Duration::days(2));

    let exact = Event::new(
        "trip",
        NewEvent::all_day(at(13, 9, 0), Some(Duration::days(3))),
    )
    .unwrap();
    assert_eq!(exact.duration(), Duration::days(3));
}

#[test]
fn organizer_is_an_accepted_required_participant() {
    let event = meeting();
    assert_eq!(event.organizer(), Some(&id("alice")));
    assert_eq!(event.participation_status(&id("alice")), Some(ParticipationStatus::Accepted));
    assert_eq!(event.participation_role(&id("alice")), Some(ParticipationRole::ReqParticipant));
}

#[test]
fn attendee_ids_filter_by_status_and_role() {
    let mut draft = NewEvent::new(at(13, 14, 0), Duration::hours(1));
    draft.organizer = Some(id("alice"));
    draft.attendees = vec![
        (id("dave"), ParticipationRole::OptParticipant, ParticipationStatus::Accepted),
        (id("bob"), ParticipationRole::Chair, ParticipationStatus::Declined),
        (id("carol"), ParticipationRole::OptParticipant, ParticipationStatus::NeedsAction),
    ];
    let event = Event::new("m", draft).unwrap();

    assert_eq!(
        event.attendee_ids(None, None),
        vec![&id("alice"), &id("bob"), &id("carol"), &id("dave")]
    );
    assert_eq!(
        event.attendee_ids(Some(ParticipationStatus::Accepted), None),
        vec![&id("alice"), &id("dave")]
    );
    assert_eq!(
        event.attendee_ids(None, Some(ParticipationRole::OptParticipant)),
        vec![&id("carol"), &id("dave")]
    );
    assert_eq!(
        event.attendee_ids(
            Some(ParticipationStatus::Accepted),
            Some(ParticipationRole::OptParticipant)
        ),
        vec![&id("dave")]
    );
}

// ── Participation changes ───────────────────────────────────────────────────

#[test]
fn invite_adds_only_new_attendees() {
    let mut event = meeting();
    let changes = event.invite([&id("alice"), &id("bob")]);

    assert_eq!(
        changes,
        vec![EventChange::StatusChanged {
            event_id: "meeting".to_string(),
            attendee: id("bob"),
            old: None,
            new: Some(ParticipationStatus::NeedsAction),
        }]
    );
    assert_eq!(event.participation_status(&id("alice")), Some(ParticipationStatus::Accepted));
    assert_eq!(event.participation_role(&id("bob")), Some(ParticipationRole::ReqParticipant));
}

#[test]
fn status_change_reports_old_and_new() {
    let mut event = meeting();
    event.invite([&id("bob")]);

    let change = event.set_participation_status(&id("bob"), Some(ParticipationStatus::Tentative));
    assert_eq!(
        change,
        Some(EventChange::StatusChanged {
            event_id: "meeting".to_string(),
            attendee: id("bob"),
            old: Some(ParticipationStatus::NeedsAction),
            new: Some(ParticipationStatus::Tentative),
        })
    );
}

#[test]
fn unchanged_status_reports_nothing() {
    let mut event = meeting();
    assert_eq!(
        event.set_participation_status(&id("alice"), Some(ParticipationStatus::Accepted)),
        None
    );
    assert_eq!(event.set_participation_status(&id("nobody"), None), None);
}

#[test]
fn clearing_status_removes_attendee() {
    let mut event = meeting();
    event.invite([&id("bob")]);

    let change = event.set_participation_status(&id("bob"), None);
    assert!(matches!(
        change,
        Some(EventChange::StatusChanged { new: None, .. })
    ));
    assert!(!event.has_attendee(&id("bob")));
}

#[test]
fn status_change_keeps_role() {
    let mut event = meeting();
    event.invite([&id("bob")]);
    event.set_participation_role(&id("bob"), ParticipationRole::Chair);
    event.set_participation_status(&id("bob"), Some(ParticipationStatus::Declined));

    assert_eq!(event.participation_role(&id("bob")), Some(ParticipationRole::Chair));
}

#[test]
fn role_change_needs_existing_attendee() {
    let mut event = meeting();
    assert_eq!(event.set_participation_role(&id("bob"), ParticipationRole::Chair), None);
    assert!(!event.has_attendee(&id("bob")));

    assert_eq!(
        event.set_participation_role(&id("alice"), ParticipationRole::Chair),
        Some(EventChange::RoleChanged {
            event_id: "meeting".to_string(),
            attendee: id("alice"),
            old: ParticipationRole::ReqParticipant,
            new: ParticipationRole::Chair,
        })
    );
    assert_eq!(event.set_participation_role(&id("alice"), ParticipationRole::Chair), None);
}
