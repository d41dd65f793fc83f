//! Round-trip parsing and serialization tests for iCalendar.

use crate::rfc::ical::build::serialize;
use crate::rfc::ical::core::{ICalendar, names};
use crate::rfc::ical::parse::parse;

const SERIES_WITH_OVERRIDE: &str = "\
BEGIN:VCALENDAR\r
VERSION:2.0\r
PRODID:-//Test//Test//EN\r
BEGIN:VTIMEZONE\r
TZID:America/Toronto\r
X-LIC-LOCATION:America/Toronto\r
BEGIN:STANDARD\r
DTSTART:19701101T020000\r
TZOFFSETFROM:-0400\r
TZOFFSETTO:-0500\r
RRULE:FREQ=YEARLY;BYMONTH=11;BYDAY=1SU\r
END:STANDARD\r
END:VTIMEZONE\r
BEGIN:VEVENT\r
UID:series-1\r
DTSTAMP:20240601T120000Z\r
DTSTART;TZID=America/Toronto:20240701T080000\r
DTEND;TZID=America/Toronto:20240701T090000\r
RRULE:FREQ=WEEKLY;BYDAY=MO,WE,FR;UNTIL=20240713T235959Z\r
RDATE;TZID=America/Toronto:20240716T080000,20240718T080000\r
EXDATE;TZID=America/Toronto:20240703T080000\r
SUMMARY:Stand-up\\, daily-ish\r
DESCRIPTION:A long description that will certainly need folding because it goes well past seventy-five octets.\r
ORGANIZER;CN=\"Doe, Jane\":mailto:jane@example.com\r
ATTENDEE;CN=Bob;PARTSTAT=NEEDS-ACTION:mailto:bob@example.com\r
END:VEVENT\r
BEGIN:VEVENT\r
UID:series-1\r
DTSTAMP:20240601T120000Z\r
RECURRENCE-ID;TZID=America/Toronto:20240705T080000\r
DTSTART;TZID=America/Toronto:20240705T100000\r
DURATION:PT1H30M\r
SUMMARY:Stand-up (moved)\r
END:VEVENT\r
END:VCALENDAR\r
";

/// Parses, serializes, and parses again.
fn round_trip(input: &str) -> (ICalendar, ICalendar) {
    let first = parse(input).expect("first parse should succeed");
    let serialized = serialize(&first);
    let second = parse(&serialized)
        .unwrap_or_else(|e| panic!("second parse failed: {e}\n{serialized}"));
    (first, second)
}

#[test_log::test]
fn round_trip_keeps_structure() {
    let (first, second) = round_trip(SERIES_WITH_OVERRIDE);

    assert_eq!(first.events().len(), 2);
    assert_eq!(second.events().len(), 2);
    assert_eq!(first.timezones().len(), second.timezones().len());
    assert_eq!(
        second.timezones()[0].children.len(),
        first.timezones()[0].children.len()
    );
}

#[test_log::test]
fn round_trip_keeps_values() {
    let (first, second) = round_trip(SERIES_WITH_OVERRIDE);

    for (a, b) in first.events().iter().zip(second.events()) {
        assert_eq!(a.uid(), b.uid());
        assert_eq!(a.summary(), b.summary());
        assert_eq!(a.recurrence_id(), b.recurrence_id());
        for name in [
            names::DTSTART,
            names::DTEND,
            names::DURATION,
            names::RRULE,
            names::RDATE,
            names::EXDATE,
            names::ORGANIZER,
            names::ATTENDEE,
        ] {
            let before = a.get_property(name).map(|p| &p.value);
            let after = b.get_property(name).map(|p| &p.value);
            assert_eq!(before, after, "{name} changed across round trip");
        }
    }
}

#[test]
fn round_trip_is_stable_after_first_pass() {
    let first = parse(SERIES_WITH_OVERRIDE).unwrap();
    let once = serialize(&first);
    let twice = serialize(&parse(&once).unwrap());
    assert_eq!(once, twice);
}

#[test]
fn serialized_lines_are_folded() {
    let output = serialize(&parse(SERIES_WITH_OVERRIDE).unwrap());
    assert!(output.lines().all(|line| line.trim_end_matches('\r').len() <= 75));
    assert!(output.contains("SUMMARY:Stand-up\\, daily-ish\r\n"));
    assert!(output.contains("ORGANIZER;CN=\"Doe, Jane\":mailto:jane@example.com\r\n"));
}
