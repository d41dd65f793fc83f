use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use kunai_rfc::rfc::ical::core::Component;
use kunai_service::caldav::event_reader::{
    EventExpander, EventSource, ExpanderOptions, RecurrencePattern, RecurrencePrecision,
};

use super::fixtures::{SERIES_UID, STANDUP, standup};

fn toronto(m: u32, d: u32, h: u32) -> DateTime<Tz> {
    Tz::America__Toronto
        .with_ymd_and_hms(2024, m, d, h, 0, 0)
        .unwrap()
}

fn all_occurrences(er: &mut EventExpander) -> Vec<DateTime<Tz>> {
    er.recurrence_rewind();
    let mut out = Vec::new();
    while let Some(date) = er.recurrence_date() {
        out.push(date);
        er.recurrence_advance();
    }
    out
}

fn standup_days() -> Vec<DateTime<Tz>> {
    [1, 3, 5, 6, 8, 12, 15, 17, 19, 22, 24, 26, 29, 31]
        .into_iter()
        .map(|d| toronto(7, d, 9))
        .collect()
}

#[test_log::test]
fn standup_series_shape() {
    let ical = standup();
    let er =
        EventExpander::new(EventSource::Calendar(&ical, SERIES_UID), &ExpanderOptions::default())
            .unwrap();

    assert_eq!(er.start_date_time(), toronto(7, 1, 9));
    assert_eq!(er.start_time_zone(), Tz::America__Toronto);
    assert_eq!(er.duration(), TimeDelta::minutes(30));
    assert!(!er.entire_day());
    assert!(er.recurs());
    assert_eq!(er.recurring_pattern(), Some(RecurrencePattern::Absolute));
    assert_eq!(er.recurring_precision(), Some(RecurrencePrecision::Weekly));
    assert!(er.recurring_concludes());
    assert_eq!(er.recurring_concludes_after(), Some(1));
    assert_eq!(
        er.recurring_concludes_on(),
        Some(
            Utc.with_ymd_and_hms(2024, 7, 31, 23, 59, 59)
                .unwrap()
                .with_timezone(&Tz::America__Toronto)
        )
    );
    assert_eq!(er.recurring_days_of_week_named(), vec!["Monday", "Wednesday", "Friday"]);
}

#[test_log::test]
fn standup_occurrences_merge_rule_dates_and_exclusions() {
    let mut er =
        EventExpander::new(EventSource::Text(STANDUP, SERIES_UID), &ExpanderOptions::default())
            .unwrap();
    assert_eq!(all_occurrences(&mut er), standup_days());
}

#[test]
fn instances_source_matches_calendar_source() {
    let ical = standup();
    let instances: Vec<Component> = ical.events().into_iter().cloned().collect();

    let mut from_instances =
        EventExpander::new(EventSource::Instances(&instances), &ExpanderOptions::default())
            .unwrap();
    assert_eq!(all_occurrences(&mut from_instances), standup_days());
    assert_eq!(from_instances.recurrence_instances().count(), 1);
}

#[test]
fn override_is_found_by_its_occurrence() {
    let ical = standup();
    let mut er =
        EventExpander::new(EventSource::Calendar(&ical, SERIES_UID), &ExpanderOptions::default())
            .unwrap();

    er.recurrence_advance();
    let moved = er.recurrence_date().unwrap();
    assert_eq!(moved, toronto(7, 3, 9));
    let instance = er.recurrence_instance(&moved).unwrap();
    assert_eq!(instance.summary(), Some("Stand-up (afternoon)"));

    // the cursor still reports the unmodified start
    assert_eq!(er.recurrence_date(), Some(toronto(7, 3, 9)));
}

#[test]
fn window_queries_and_seeking() {
    let ical = standup();
    let mut er =
        EventExpander::new(EventSource::Calendar(&ical, SERIES_UID), &ExpanderOptions::default())
            .unwrap();

    let week = er.occurrences_between(&toronto(7, 8, 0), &toronto(7, 15, 0), 10);
    assert_eq!(week, vec![toronto(7, 8, 9), toronto(7, 12, 9)]);

    er.recurrence_advance_to(&Utc.with_ymd_and_hms(2024, 7, 20, 0, 0, 0).unwrap());
    assert_eq!(er.recurrence_date(), Some(toronto(7, 22, 9)));

    er.recurrence_advance_to(&Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap());
    assert_eq!(er.recurrence_date(), None);

    er.recurrence_rewind();
    assert_eq!(er.recurrence_date(), Some(toronto(7, 1, 9)));
}

#[test]
fn viewer_zone_changes_presentation_not_instants() {
    let ical = standup();
    let options = ExpanderOptions::default().with_zone(Tz::Asia__Tokyo);
    let mut er = EventExpander::new(EventSource::Calendar(&ical, SERIES_UID), &options).unwrap();

    assert_eq!(er.start_time_zone(), Tz::Asia__Tokyo);
    let dates = all_occurrences(&mut er);
    assert_eq!(dates, standup_days());
    assert!(dates.iter().all(|d| d.timezone() == Tz::Asia__Tokyo));
}

#[test]
fn all_day_series_with_default_zone() {
    let text = "BEGIN:VCALENDAR\r
VERSION:2.0\r
PRODID:-//Test//Test//EN\r
BEGIN:VEVENT\r
UID:holiday\r
DTSTART;VALUE=DATE:20240101\r
RRULE:FREQ=YEARLY;COUNT=3\r
SUMMARY:New Year\r
END:VEVENT\r
END:VCALENDAR\r
";
    let options = ExpanderOptions {
        default_zone: Tz::Europe__Berlin,
        ..ExpanderOptions::default()
    };
    let mut er = EventExpander::new(EventSource::Text(text, "holiday"), &options).unwrap();

    assert!(er.entire_day());
    assert_eq!(er.duration(), TimeDelta::days(1));
    let berlin = |y| Tz::Europe__Berlin.with_ymd_and_hms(y, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(all_occurrences(&mut er), vec![berlin(2024), berlin(2025), berlin(2026)]);
    assert_eq!(er.recurring_concludes_on(), Some(berlin(2026)));
}
