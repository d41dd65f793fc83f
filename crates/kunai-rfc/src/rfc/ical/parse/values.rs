//! Value type parsers (RFC 5545 §3.3).

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rfc::ical::core::{
    Date, DateTime, DateTimeForm, DateTimeValue, Duration, Frequency, Period, RRule, RRuleUntil,
    Weekday, WeekdayNum,
};

fn digits<T: std::str::FromStr>(s: &str, kind: ParseErrorKind, line: usize) -> ParseResult<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(kind, line, 1).with_context(format!("'{s}'")));
    }
    s.parse()
        .map_err(|_parse_err| ParseError::new(kind, line, 1).with_context(format!("'{s}'")))
}

/// Parses a DATE value (`YYYYMMDD`).
///
/// ## Errors
/// Returns an error unless the value is eight digits naming a real date.
pub fn parse_date(s: &str, line: usize) -> ParseResult<Date> {
    let kind = ParseErrorKind::InvalidDate;
    if s.len() != 8 || !s.is_ascii() {
        return Err(ParseError::new(kind, line, 1).with_context(format!("'{s}'")));
    }
    let date = Date::new(
        digits(&s[0..4], kind, line)?,
        digits(&s[4..6], kind, line)?,
        digits(&s[6..8], kind, line)?,
    );
    if date.to_naive().is_none() {
        return Err(ParseError::new(kind, line, 1).with_context(format!("'{s}'")));
    }
    Ok(date)
}

/// ## Summary
/// Parses a DATE-TIME value (`YYYYMMDDTHHMMSS[Z]`).
///
/// A trailing `Z` makes the value UTC; otherwise a TZID from the property
/// makes it zoned, and without one it is floating.
///
/// ## Errors
/// Returns an error if the date or time part is malformed.
pub fn parse_datetime(s: &str, tzid: Option<&str>, line: usize) -> ParseResult<DateTime> {
    let kind = ParseErrorKind::InvalidDateTime;
    let (date_part, time_part) = s
        .split_once(['T', 't'])
        .ok_or_else(|| ParseError::new(kind, line, 1).with_context(format!("'{s}'")))?;
    let date = parse_date(date_part, line)?;

    let (time, utc) = match time_part.strip_suffix(['Z', 'z']) {
        Some(t) => (t, true),
        None => (time_part, false),
    };
    if time.len() != 6 || !time.is_ascii() {
        return Err(ParseError::new(kind, line, 1).with_context(format!("'{s}'")));
    }
    let hour: u8 = digits(&time[0..2], kind, line)?;
    let minute: u8 = digits(&time[2..4], kind, line)?;
    let second: u8 = digits(&time[4..6], kind, line)?;
    if hour > 23 || minute > 59 || second > 60 {
        return Err(ParseError::new(kind, line, 1).with_context(format!("'{s}'")));
    }

    let form = match (utc, tzid) {
        (true, _) => DateTimeForm::Utc,
        (false, Some(tzid)) => DateTimeForm::Zoned {
            tzid: tzid.to_string(),
        },
        (false, None) => DateTimeForm::Floating,
    };

    Ok(DateTime {
        year: date.year,
        month: date.month,
        day: date.day,
        hour,
        minute,
        second,
        form,
    })
}

/// Parses a value that is a DATE when it has no time part, else a DATE-TIME.
///
/// ## Errors
/// Returns an error if the value is neither.
pub fn parse_date_time_value(
    s: &str,
    tzid: Option<&str>,
    line: usize,
) -> ParseResult<DateTimeValue> {
    if s.contains(['T', 't']) {
        parse_datetime(s, tzid, line).map(DateTimeValue::DateTime)
    } else {
        parse_date(s, line).map(DateTimeValue::Date)
    }
}

/// ## Summary
/// Parses a DURATION value: `[+|-]P(nW | [nD][T[nH][nM][nS]])`.
///
/// ## Errors
/// Returns an error for a missing `P`, a designator without a number, a
/// time designator outside the `T` section, or an empty duration.
pub fn parse_duration(s: &str, line: usize) -> ParseResult<Duration> {
    let err = || {
        ParseError::new(ParseErrorKind::InvalidDuration, line, 1).with_context(format!("'{s}'"))
    };

    let mut dur = Duration::zero();
    let rest = match s.as_bytes().first() {
        Some(b'-') => {
            dur.negative = true;
            &s[1..]
        }
        Some(b'+') => &s[1..],
        _ => s,
    };
    let rest = rest.strip_prefix(['P', 'p']).ok_or_else(err)?;

    let mut number = String::new();
    let mut in_time = false;
    let mut seen_component = false;
    for c in rest.chars() {
        if c.is_ascii_digit() {
            number.push(c);
            continue;
        }
        let c = c.to_ascii_uppercase();
        if c == 'T' {
            if in_time || !number.is_empty() {
                return Err(err());
            }
            in_time = true;
            continue;
        }
        let n: u32 = number.parse().map_err(|_parse_err| err())?;
        number.clear();
        seen_component = true;
        match (c, in_time) {
            ('W', false) => dur.weeks = n,
            ('D', false) => dur.days = n,
            ('H', true) => dur.hours = n,
            ('M', true) => dur.minutes = n,
            ('S', true) => dur.seconds = n,
            _ => return Err(err()),
        }
    }

    if !number.is_empty() || !seen_component {
        return Err(err());
    }
    Ok(dur)
}

/// Parses a PERIOD value (`start/end` or `start/duration`).
///
/// ## Errors
/// Returns an error if either side is malformed.
pub fn parse_period(s: &str, tzid: Option<&str>, line: usize) -> ParseResult<Period> {
    let (start, end) = s.split_once('/').ok_or_else(|| {
        ParseError::new(ParseErrorKind::InvalidPeriod, line, 1).with_context(format!("'{s}'"))
    })?;
    let start = parse_datetime(start, tzid, line)?;
    if end.starts_with(['P', 'p', '+', '-']) {
        Ok(Period::Duration {
            start,
            duration: parse_duration(end, line)?,
        })
    } else {
        Ok(Period::Explicit {
            start,
            end: parse_datetime(end, tzid, line)?,
        })
    }
}

fn number_list<T: std::str::FromStr>(value: &str, line: usize) -> ParseResult<Vec<T>> {
    value
        .split(',')
        .map(|item| {
            let item = item.trim();
            item.strip_prefix('+').unwrap_or(item).parse().map_err(|_parse_err| {
                ParseError::new(ParseErrorKind::InvalidRRule, line, 1)
                    .with_context(format!("'{item}'"))
            })
        })
        .collect()
}

fn parse_weekday_num(item: &str, line: usize) -> ParseResult<WeekdayNum> {
    let err = || {
        ParseError::new(ParseErrorKind::InvalidRRule, line, 1).with_context(format!("BYDAY '{item}'"))
    };
    let split = item.len().checked_sub(2).ok_or_else(err)?;
    if !item.is_char_boundary(split) {
        return Err(err());
    }
    let (ordinal, day) = item.split_at(split);
    let weekday = Weekday::parse(day).ok_or_else(err)?;
    if ordinal.is_empty() {
        return Ok(WeekdayNum::every(weekday));
    }
    let ordinal: i8 = ordinal
        .strip_prefix('+')
        .unwrap_or(ordinal)
        .parse()
        .map_err(|_parse_err| err())?;
    if ordinal == 0 || !(-53..=53).contains(&ordinal) {
        return Err(err());
    }
    Ok(WeekdayNum::nth(ordinal, weekday))
}

/// ## Summary
/// Parses a RECUR value into its rule parts.
///
/// Unknown parts are ignored. An optional `RRULE:` prefix is accepted.
///
/// ## Errors
/// Returns an error for a part without `=`, an unknown frequency or
/// weekday, a malformed number list, a missing FREQ, or UNTIL together
/// with COUNT.
pub fn parse_rrule(s: &str, line: usize) -> ParseResult<RRule> {
    let invalid = |ctx: String| ParseError::new(ParseErrorKind::InvalidRRule, line, 1).with_context(ctx);
    let body = s
        .strip_prefix("RRULE:")
        .or_else(|| s.strip_prefix("EXRULE:"))
        .unwrap_or(s);

    let mut rule = RRule::default();
    for part in body.split(';').filter(|p| !p.is_empty()) {
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| invalid(format!("rule part '{part}'")))?;
        match key.trim().to_ascii_uppercase().as_str() {
            "FREQ" => {
                rule.freq = Some(
                    Frequency::parse(value).ok_or_else(|| invalid(format!("FREQ '{value}'")))?,
                );
            }
            "INTERVAL" => {
                let interval: u32 = value
                    .parse()
                    .map_err(|_parse_err| invalid(format!("INTERVAL '{value}'")))?;
                if interval == 0 {
                    return Err(invalid("INTERVAL must be positive".to_string()));
                }
                rule.interval = Some(interval);
            }
            "COUNT" => {
                rule.count = Some(
                    value
                        .parse()
                        .map_err(|_parse_err| invalid(format!("COUNT '{value}'")))?,
                );
            }
            "UNTIL" => {
                rule.until = Some(match parse_date_time_value(value, None, line)? {
                    DateTimeValue::Date(d) => RRuleUntil::Date(d),
                    DateTimeValue::DateTime(dt) => RRuleUntil::DateTime(dt),
                });
            }
            "WKST" => {
                rule.wkst =
                    Some(Weekday::parse(value).ok_or_else(|| invalid(format!("WKST '{value}'")))?);
            }
            "BYSECOND" => rule.by_second = number_list(value, line)?,
            "BYMINUTE" => rule.by_minute = number_list(value, line)?,
            "BYHOUR" => rule.by_hour = number_list(value, line)?,
            "BYDAY" => {
                rule.by_day = value
                    .split(',')
                    .map(|item| parse_weekday_num(item.trim(), line))
                    .collect::<ParseResult<_>>()?;
            }
            "BYMONTHDAY" => rule.by_monthday = number_list(value, line)?,
            "BYYEARDAY" => rule.by_yearday = number_list(value, line)?,
            "BYWEEKNO" => rule.by_weekno = number_list(value, line)?,
            "BYMONTH" => rule.by_month = number_list(value, line)?,
            "BYSETPOS" => rule.by_setpos = number_list(value, line)?,
            other => tracing::trace!(part = other, "Ignoring unknown RRULE part"),
        }
    }

    if rule.freq.is_none() {
        return Err(invalid("missing FREQ".to_string()));
    }
    if rule.until.is_some() && rule.count.is_some() {
        return Err(ParseError::new(ParseErrorKind::UntilCountConflict, line, 1));
    }
    Ok(rule)
}

/// Unescapes a TEXT value (RFC 5545 §3.3.11).
#[must_use]
pub fn unescape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(escaped @ ('\\' | ';' | ',')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
