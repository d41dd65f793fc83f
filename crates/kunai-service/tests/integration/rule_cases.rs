use kunai_service::caldav::event_reader::{EventExpander, EventSource, ExpanderOptions};

include!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/rrule_cases_data/mod.rs"));

fn calendar_for(case: &RuleCase) -> String {
    let dtstart = if case.tzid == "UTC" {
        format!("DTSTART:{}Z", case.dtstart)
    } else {
        format!("DTSTART;TZID={}:{}", case.tzid, case.dtstart)
    };
    format!(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\nUID:{}\r\n{dtstart}\r\nRRULE:{}\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n",
        case.name, case.rule
    )
}

fn assert_case(case: &RuleCase) {
    let text = calendar_for(case);
    let mut er = EventExpander::new(EventSource::Text(&text, case.name), &ExpanderOptions::default())
        .unwrap_or_else(|err| panic!("Case {} failed to build: {err}", case.name));

    assert_eq!(er.start_date_time(), case.start(), "Case {} start", case.name);

    let mut actual = Vec::new();
    while let Some(date) = er.recurrence_date() {
        if actual.len() == case.limit {
            break;
        }
        actual.push(date.timestamp());
        er.recurrence_advance();
    }
    assert_eq!(actual, case.expected_timestamps(), "Case {} did not match", case.name);
}

/// ## Summary
/// Runs the shared rule cases through full event expansion.
#[test_log::test]
fn rrule_cases_integration() {
    for case in rule_cases() {
        assert_case(&case);
    }
}
