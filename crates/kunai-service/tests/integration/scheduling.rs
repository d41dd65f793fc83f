use kunai_rfc::rfc::ical::core::{ComponentKind, Property, names, param_names};
use kunai_service::caldav::event_reader::{EventExpander, EventSource, ExpanderOptions};
use kunai_service::caldav::itip::ItipMethod;
use kunai_service::caldav::tip_broker::TipBroker;

use super::fixtures::{ALICE, BOB, ORGANIZER, SERIES_UID, standup};

#[test_log::test]
fn organizer_creating_series_invites_each_attendee() {
    let calendar = standup();
    let messages = TipBroker::default()
        .parse_event(Some(&calendar), ORGANIZER, None)
        .unwrap();

    let recipients: Vec<_> = messages
        .iter()
        .map(|m| (m.method, m.recipient.as_str()))
        .collect();
    assert_eq!(
        recipients,
        vec![(ItipMethod::Request, ALICE), (ItipMethod::Request, BOB)]
    );

    // Alice is on the master and the override
    let alice = &messages[0].message;
    assert_eq!(alice.method(), Some("REQUEST"));
    assert_eq!(alice.timezones().len(), 1);
    assert_eq!(alice.events().len(), 2);

    // Bob only gets the master, with the override excluded
    let bob = &messages[1].message;
    assert_eq!(bob.events().len(), 1);
    let master = bob.events()[0];
    let exdate = master.get_property(names::EXDATE).unwrap();
    assert!(exdate.raw_value.contains("20240710T090000"));
    assert!(exdate.raw_value.contains("20240703T090000"));
    assert_eq!(exdate.tzid(), Some("America/Toronto"));

    let bob_attendee = master
        .get_properties(names::ATTENDEE)
        .into_iter()
        .find(|a| a.raw_value == BOB)
        .unwrap();
    assert_eq!(
        bob_attendee.get_param_value(param_names::PARTSTAT),
        Some("NEEDS-ACTION")
    );
}

#[test]
fn invitation_payload_expands_without_excluded_instances() {
    let calendar = standup();
    let messages = TipBroker::default()
        .parse_event(Some(&calendar), ORGANIZER, None)
        .unwrap();
    let bob = messages.iter().find(|m| m.recipient == BOB).unwrap();

    let text = bob.to_ical_string();
    let mut er =
        EventExpander::new(EventSource::Text(&text, SERIES_UID), &ExpanderOptions::default())
            .unwrap();
    let mut days = Vec::new();
    while let Some(date) = er.recurrence_date() {
        days.push(date.format("%d").to_string());
        er.recurrence_advance();
    }
    assert!(!days.contains(&"03".to_string()));
    assert!(!days.contains(&"10".to_string()));
    assert_eq!(days.len(), 13);
}

#[test]
fn organizer_deleting_series_cancels_everyone() {
    let old = standup();
    let messages = TipBroker::default()
        .parse_event(None, ORGANIZER, Some(&old))
        .unwrap();

    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.method == ItipMethod::Cancel));
    assert!(messages.iter().all(|m| m.sequence == 1));

    let cancel = messages[1].message.events()[0];
    assert!(!cancel.has_property(names::RECURRENCE_ID));
    let attendees = cancel.get_properties(names::ATTENDEE);
    assert_eq!(attendees.len(), 1);
    assert_eq!(attendees[0].raw_value, BOB);
}

#[test]
fn moving_the_series_is_significant_for_everyone() {
    let old = standup();
    let mut new = standup();
    let master = new
        .root
        .children
        .iter_mut()
        .find(|c| c.kind == ComponentKind::Event && !c.has_property(names::RECURRENCE_ID))
        .unwrap();
    master.set_property(Property::text(names::LOCATION, "Room 4"));

    let messages = TipBroker::default()
        .parse_event(Some(&new), ORGANIZER, Some(&old))
        .unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.significant_change));
}

#[test]
fn dropping_bob_cancels_only_bob() {
    let old = standup();
    let mut new = standup();
    for component in &mut new.root.children {
        component
            .properties
            .retain(|p| !(p.name == names::ATTENDEE && p.raw_value == BOB));
    }

    let messages = TipBroker::default()
        .parse_event(Some(&new), ORGANIZER, Some(&old))
        .unwrap();
    let summary: Vec<_> = messages
        .iter()
        .map(|m| (m.method, m.recipient.as_str(), m.significant_change))
        .collect();
    assert_eq!(
        summary,
        vec![
            (ItipMethod::Request, ALICE, false),
            (ItipMethod::Cancel, BOB, true),
        ]
    );
}
