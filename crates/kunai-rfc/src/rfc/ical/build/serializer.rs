//! iCalendar serializer (RFC 5545).

use super::escape::escape_text;
use super::fold::fold_line;
use crate::rfc::ical::core::{Component, ComponentKind, ICalendar, Property, Value};

/// Serializes a calendar to RFC 5545 text with CRLF line endings.
#[must_use]
pub fn serialize(ical: &ICalendar) -> String {
    serialize_component(&ical.root)
}

/// ## Summary
/// Serializes a component and its children.
///
/// Known properties are written in a fixed order; the rest follow in their
/// original order. Child components keep document order.
#[must_use]
pub fn serialize_component(component: &Component) -> String {
    let mut out = fold_line(&format!("BEGIN:{}", component.name));
    for prop in canonical_property_order(component) {
        out.push_str(&serialize_property(prop));
    }
    for child in &component.children {
        out.push_str(&serialize_component(child));
    }
    out.push_str(&fold_line(&format!("END:{}", component.name)));
    out
}

/// Serializes one property as a folded content line.
#[must_use]
pub fn serialize_property(prop: &Property) -> String {
    let mut line = prop.name.clone();
    for param in &prop.params {
        line.push(';');
        line.push_str(&param.to_string());
    }
    line.push(':');
    match &prop.value {
        Value::Text(text) => line.push_str(&escape_text(text)),
        _ => line.push_str(&prop.raw_value),
    }
    fold_line(&line)
}

fn canonical_property_order(component: &Component) -> Vec<&Property> {
    let order: &[&str] = match component.kind {
        ComponentKind::Calendar => &["VERSION", "PRODID", "CALSCALE", "METHOD"],
        ComponentKind::Event | ComponentKind::Todo | ComponentKind::Journal => &[
            "UID",
            "DTSTAMP",
            "RECURRENCE-ID",
            "DTSTART",
            "DTEND",
            "DUE",
            "DURATION",
            "RRULE",
            "RDATE",
            "EXRULE",
            "EXDATE",
            "SUMMARY",
            "DESCRIPTION",
            "LOCATION",
            "STATUS",
            "SEQUENCE",
            "ORGANIZER",
            "ATTENDEE",
        ],
        ComponentKind::Timezone => &["TZID", "X-LIC-LOCATION"],
        _ => &[],
    };

    let mut ordered: Vec<&Property> = order
        .iter()
        .flat_map(|name| component.get_properties(name))
        .collect();
    ordered.extend(
        component
            .properties
            .iter()
            .filter(|p| !order.iter().any(|n| p.name.eq_ignore_ascii_case(n))),
    );
    ordered
}
