//! iCalendar document parser (RFC 5545).
//!
//! Builds the component tree from content lines and resolves each
//! property value to its type.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::lexer::{parse_content_line, split_lines};
use super::values::{
    parse_date, parse_date_time_value, parse_datetime, parse_duration, parse_period, parse_rrule,
    unescape_text,
};
use crate::rfc::ical::core::{
    Component, ComponentKind, ContentLine, DateTimeValue, ICalendar, Property, Value,
};

/// ## Summary
/// Parses an iCalendar document.
///
/// ## Errors
/// Returns an error if the text is not a well-formed VCALENDAR: a content
/// line cannot be tokenized, BEGIN/END lines do not pair up, or a typed
/// value (date, date-time, duration, period, recurrence rule, integer)
/// is malformed.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn parse(input: &str) -> ParseResult<ICalendar> {
    tracing::debug!("Parsing iCalendar document");

    let mut stack: Vec<Component> = Vec::new();
    let mut root: Option<Component> = None;
    let mut last_line = 1;

    for (line_num, text) in split_lines(input) {
        last_line = line_num;
        let cl = parse_content_line(&text, line_num)?;

        match cl.name.as_str() {
            "BEGIN" => stack.push(Component::named(cl.raw_value.trim())),
            "END" => {
                let name = cl.raw_value.trim();
                let component = stack.pop().ok_or_else(|| {
                    ParseError::new(ParseErrorKind::MismatchedComponent, line_num, 1)
                        .with_context(format!("END:{name} without BEGIN"))
                })?;
                if !component.name.eq_ignore_ascii_case(name) {
                    return Err(
                        ParseError::new(ParseErrorKind::MismatchedComponent, line_num, 1)
                            .with_context(format!(
                                "expected END:{}, got END:{name}",
                                component.name
                            )),
                    );
                }
                match stack.last_mut() {
                    Some(parent) => parent.add_child(component),
                    None if root.is_none() => root = Some(component),
                    None => tracing::warn!(
                        line = line_num,
                        component = %component.name,
                        "Ignoring trailing top-level component"
                    ),
                }
            }
            _ => {
                let parent = stack.last_mut().ok_or_else(|| {
                    ParseError::new(ParseErrorKind::MissingBegin, line_num, 1)
                        .with_context(format!("property {} outside a component", cl.name))
                })?;
                parent.add_property(parse_property(cl)?);
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::new(ParseErrorKind::MissingEnd, last_line, 1)
            .with_context(format!("missing END:{}", open.name)));
    }

    let root = root.ok_or_else(|| ParseError::new(ParseErrorKind::MissingBegin, 1, 1))?;
    if root.kind != ComponentKind::Calendar {
        return Err(ParseError::new(ParseErrorKind::MissingBegin, 1, 1)
            .with_context(format!("expected VCALENDAR, got {}", root.name)));
    }

    tracing::trace!(children = root.children.len(), "iCalendar document parsed");
    Ok(ICalendar { root })
}

/// Value types the parser distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueType {
    Binary,
    Boolean,
    CalAddress,
    DateOrDateTime,
    DateList,
    Duration,
    Integer,
    Recur,
    Text,
    Uri,
    Raw,
}

fn value_type(cl: &ContentLine) -> ValueType {
    let explicit = cl.get_param_value("VALUE").map(str::to_ascii_uppercase);
    match (cl.name.as_str(), explicit.as_deref()) {
        ("RDATE" | "EXDATE", _) => ValueType::DateList,
        (_, Some("DATE" | "DATE-TIME")) => ValueType::DateOrDateTime,
        (_, Some("BINARY")) => ValueType::Binary,
        (_, Some("BOOLEAN")) => ValueType::Boolean,
        (_, Some("DURATION")) => ValueType::Duration,
        (_, Some("INTEGER")) => ValueType::Integer,
        (_, Some("URI")) => ValueType::Uri,
        (_, Some("TEXT")) => ValueType::Text,
        (_, Some(_)) => ValueType::Raw,
        (
            "DTSTART" | "DTEND" | "DUE" | "DTSTAMP" | "CREATED" | "LAST-MODIFIED" | "COMPLETED"
            | "RECURRENCE-ID",
            None,
        ) => ValueType::DateOrDateTime,
        ("DURATION" | "TRIGGER", None) => ValueType::Duration,
        ("SEQUENCE" | "PRIORITY" | "REPEAT" | "PERCENT-COMPLETE", None) => ValueType::Integer,
        ("RRULE" | "EXRULE", None) => ValueType::Recur,
        ("ATTENDEE" | "ORGANIZER", None) => ValueType::CalAddress,
        ("URL" | "TZURL" | "SOURCE", None) => ValueType::Uri,
        (
            "CATEGORIES" | "RESOURCES" | "GEO" | "TZOFFSETFROM" | "TZOFFSETTO" | "FREEBUSY"
            | "REQUEST-STATUS",
            None,
        ) => ValueType::Raw,
        _ => ValueType::Text,
    }
}

/// Parses RDATE/EXDATE values: a comma list of DATE, DATE-TIME or PERIOD.
fn parse_date_list(cl: &ContentLine) -> ParseResult<Value> {
    let raw = cl.raw_value.trim();
    let tzid = cl.get_param_value("TZID");
    let explicit = cl.get_param_value("VALUE").map(str::to_ascii_uppercase);
    let items = raw.split(',').map(str::trim).filter(|s| !s.is_empty());

    let is_period = explicit.as_deref() == Some("PERIOD") || raw.contains('/');
    let is_date = explicit.as_deref() == Some("DATE")
        || (explicit.is_none() && !raw.split(',').next().unwrap_or_default().contains('T'));

    if is_period {
        return items
            .map(|s| parse_period(s, tzid, cl.line))
            .collect::<ParseResult<_>>()
            .map(Value::PeriodList);
    }
    if is_date {
        return items
            .map(|s| parse_date(s, cl.line))
            .collect::<ParseResult<_>>()
            .map(Value::DateList);
    }
    items
        .map(|s| parse_datetime(s, tzid, cl.line))
        .collect::<ParseResult<_>>()
        .map(Value::DateTimeList)
}

fn parse_property(cl: ContentLine) -> ParseResult<Property> {
    let line = cl.line;
    let raw = cl.raw_value.trim();
    let value = match value_type(&cl) {
        ValueType::Text => Value::Text(unescape_text(&cl.raw_value)),
        ValueType::Raw => Value::Unknown(cl.raw_value.clone()),
        ValueType::Uri => Value::Uri(raw.to_string()),
        ValueType::CalAddress => Value::CalAddress(raw.to_string()),
        ValueType::DateOrDateTime => {
            match parse_date_time_value(raw, cl.get_param_value("TZID"), line)? {
                DateTimeValue::Date(d) => Value::Date(d),
                DateTimeValue::DateTime(dt) => Value::DateTime(dt),
            }
        }
        ValueType::DateList => parse_date_list(&cl)?,
        ValueType::Duration => Value::Duration(parse_duration(raw, line)?),
        ValueType::Recur => Value::Recur(Box::new(parse_rrule(raw, line)?)),
        ValueType::Integer => Value::Integer(raw.parse().map_err(|_parse_err| {
            ParseError::new(ParseErrorKind::InvalidValue, line, 1)
                .with_context(format!("{} is not an integer: '{raw}'", cl.name))
        })?),
        ValueType::Boolean => match raw.to_ascii_uppercase().as_str() {
            "TRUE" => Value::Boolean(true),
            "FALSE" => Value::Boolean(false),
            _ => {
                return Err(ParseError::new(ParseErrorKind::InvalidValue, line, 1)
                    .with_context(format!("{} is not a boolean: '{raw}'", cl.name)));
            }
        },
        ValueType::Binary => Value::Binary(STANDARD.decode(raw).map_err(|e| {
            ParseError::new(ParseErrorKind::InvalidValue, line, 1)
                .with_context(format!("invalid base64: {e}"))
        })?),
    };

    Ok(Property {
        name: cl.name,
        params: cl.params,
        value,
        raw_value: cl.raw_value,
    })
}
