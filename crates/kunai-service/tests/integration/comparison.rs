use kunai_rfc::rfc::ical::core::{Property, names};
use kunai_service::caldav::event_comparison::find_modified;

use super::fixtures::standup;

#[test]
fn unchanged_series_reports_nothing() {
    let old = standup();
    let new = standup();
    let diff = find_modified(&new, Some(&old));
    assert!(diff.is_unchanged());
    assert_eq!(diff.old.map(|old| old.len()), Some(0));
}

#[test]
fn new_series_reports_every_instance() {
    let new = standup();
    let diff = find_modified(&new, None);
    assert!(diff.old.is_none());
    assert_eq!(diff.new.len(), 2);
}

#[test_log::test]
fn edited_override_is_reported_alone() {
    let old = standup();
    let mut new = standup();
    let moved = new
        .root
        .children
        .iter_mut()
        .find(|c| c.has_property(names::RECURRENCE_ID))
        .unwrap();
    moved.set_property(Property::integer(names::SEQUENCE, 1));
    moved.set_property(Property::text(names::SUMMARY, "Stand-up (late)"));

    let diff = find_modified(&new, Some(&old));
    assert_eq!(diff.new.len(), 1);
    assert_eq!(diff.new[0].summary(), Some("Stand-up (late)"));

    let removed = diff.old.unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].summary(), Some("Stand-up (afternoon)"));
}
