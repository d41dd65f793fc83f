//! Calendar fixtures shared by the integration tests.

use kunai_rfc::rfc::ical::core::ICalendar;
use kunai_rfc::rfc::ical::parse::parse;

pub const SERIES_UID: &str = "series-1";
pub const ORGANIZER: &str = "mailto:organizer@example.com";
pub const ALICE: &str = "mailto:alice@example.com";
pub const BOB: &str = "mailto:bob@example.com";

/// Weekly stand-up in Toronto with one moved occurrence, one cancelled
/// occurrence and an extra date.
pub const STANDUP: &str = "BEGIN:VCALENDAR\r
VERSION:2.0\r
PRODID:-//Test//Test//EN\r
BEGIN:VTIMEZONE\r
TZID:America/Toronto\r
BEGIN:STANDARD\r
DTSTART:19701101T020000\r
TZOFFSETFROM:-0400\r
TZOFFSETTO:-0500\r
RRULE:FREQ=YEARLY;BYMONTH=11;BYDAY=1SU\r
END:STANDARD\r
BEGIN:DAYLIGHT\r
DTSTART:19700308T020000\r
TZOFFSETFROM:-0500\r
TZOFFSETTO:-0400\r
RRULE:FREQ=YEARLY;BYMONTH=3;BYDAY=2SU\r
END:DAYLIGHT\r
END:VTIMEZONE\r
BEGIN:VEVENT\r
UID:series-1\r
DTSTAMP:20240601T120000Z\r
LAST-MODIFIED:20240601T120000Z\r
SEQUENCE:0\r
DTSTART;TZID=America/Toronto:20240701T090000\r
DTEND;TZID=America/Toronto:20240701T093000\r
RRULE:FREQ=WEEKLY;BYDAY=MO,WE,FR;UNTIL=20240731T235959Z\r
RDATE;TZID=America/Toronto:20240706T090000\r
EXDATE;TZID=America/Toronto:20240710T090000\r
SUMMARY:Stand-up\r
ORGANIZER;CN=Organizer:mailto:organizer@example.com\r
ATTENDEE;CN=Alice;PARTSTAT=ACCEPTED:mailto:alice@example.com\r
ATTENDEE;CN=Bob:mailto:bob@example.com\r
END:VEVENT\r
BEGIN:VEVENT\r
UID:series-1\r
DTSTAMP:20240601T120000Z\r
LAST-MODIFIED:20240601T120000Z\r
SEQUENCE:0\r
RECURRENCE-ID;TZID=America/Toronto:20240703T090000\r
DTSTART;TZID=America/Toronto:20240703T140000\r
DTEND;TZID=America/Toronto:20240703T143000\r
SUMMARY:Stand-up (afternoon)\r
ORGANIZER;CN=Organizer:mailto:organizer@example.com\r
ATTENDEE;CN=Alice;PARTSTAT=ACCEPTED:mailto:alice@example.com\r
END:VEVENT\r
END:VCALENDAR\r
";

pub fn standup() -> ICalendar {
    parse(STANDUP).unwrap()
}
