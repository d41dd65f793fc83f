//! iCalendar DATE, PERIOD and property value types (RFC 5545 §3.3).

use std::fmt;

use chrono::NaiveDate;

use super::{DateTime, Duration, RRule};

/// DATE value (RFC 5545 §3.3.4).
///
/// A calendar date without time component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Date {
    /// Year (e.g., 2026).
    pub year: u16,
    /// Month (1-12).
    pub month: u8,
    /// Day of month (1-31).
    pub day: u8,
}

impl Date {
    /// Creates a new date.
    #[must_use]
    pub const fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Returns the date as a chrono `NaiveDate`, if it exists in the calendar.
    #[must_use]
    pub fn to_naive(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}{:02}", self.year, self.month, self.day)
    }
}

/// PERIOD value (RFC 5545 §3.3.9).
///
/// A precise period of time, defined by either:
/// - An explicit start and end (both DATE-TIME)
/// - A start DATE-TIME and a DURATION
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Period {
    /// Explicit start and end times.
    Explicit {
        /// Start of the period.
        start: DateTime,
        /// End of the period.
        end: DateTime,
    },
    /// Start time and duration.
    Duration {
        /// Start of the period.
        start: DateTime,
        /// Duration of the period.
        duration: Duration,
    },
}

impl Period {
    /// Returns the start of the period.
    #[must_use]
    pub fn start(&self) -> &DateTime {
        match self {
            Self::Explicit { start, .. } | Self::Duration { start, .. } => start,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit { start, end } => write!(f, "{start}/{end}"),
            Self::Duration { start, duration } => write!(f, "{start}/{duration}"),
        }
    }
}

/// A DATE or DATE-TIME, as carried by DTSTART, DTEND, RECURRENCE-ID,
/// RDATE and EXDATE.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DateTimeValue {
    /// All-day value (`VALUE=DATE`).
    Date(Date),
    /// Timed value.
    DateTime(DateTime),
}

impl DateTimeValue {
    /// Returns whether this is a DATE value.
    #[must_use]
    pub const fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Returns the TZID of a zoned DATE-TIME.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        match self {
            Self::Date(_) => None,
            Self::DateTime(dt) => dt.tzid(),
        }
    }

    /// Returns whether the value is anchored to no zone at all
    /// (a DATE, or a DATE-TIME without `Z` or TZID).
    #[must_use]
    pub fn is_floating(&self) -> bool {
        match self {
            Self::Date(_) => true,
            Self::DateTime(dt) => dt.is_floating(),
        }
    }
}

impl fmt::Display for DateTimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{d}"),
            Self::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

/// Value types (RFC 5545 §3.3).
///
/// This enum represents the parsed value of a property. The raw string
/// is preserved separately for round-trip fidelity.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// BINARY value (base64 encoded).
    Binary(Vec<u8>),
    /// BOOLEAN value.
    Boolean(bool),
    /// CAL-ADDRESS value (typically mailto: URI).
    CalAddress(String),
    /// DATE value.
    Date(Date),
    /// List of DATE values (RDATE/EXDATE).
    DateList(Vec<Date>),
    /// DATE-TIME value.
    DateTime(DateTime),
    /// List of DATE-TIME values (RDATE/EXDATE).
    DateTimeList(Vec<DateTime>),
    /// DURATION value.
    Duration(Duration),
    /// FLOAT value.
    Float(f64),
    /// INTEGER value.
    Integer(i32),
    /// PERIOD value.
    Period(Period),
    /// List of PERIOD values (RDATE/FREEBUSY).
    PeriodList(Vec<Period>),
    /// RECUR value (recurrence rule).
    Recur(Box<RRule>),
    /// TEXT value (unescaped).
    Text(String),
    /// URI value.
    Uri(String),
    /// Unknown or unparsed value. Preserved for round-trip.
    Unknown(String),
}

impl Value {
    /// Returns this value as text, if it is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Unknown(s) => Some(s),
            _ => None,
        }
    }

    /// Returns this value as an integer, if it is an integer value.
    #[must_use]
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns this value as a calendar address or URI.
    #[must_use]
    pub fn as_cal_address(&self) -> Option<&str> {
        match self {
            Self::CalAddress(s) | Self::Uri(s) => Some(s),
            _ => None,
        }
    }

    /// Returns this value as a date-time, if it is a date-time value.
    #[must_use]
    pub fn as_datetime(&self) -> Option<&DateTime> {
        match self {
            Self::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Returns this value as a date, if it is a date value.
    #[must_use]
    pub fn as_date(&self) -> Option<&Date> {
        match self {
            Self::Date(d) => Some(d),
            _ => None,
        }
    }

    /// Returns a single DATE or DATE-TIME value.
    #[must_use]
    pub fn as_date_time_value(&self) -> Option<DateTimeValue> {
        match self {
            Self::Date(d) => Some(DateTimeValue::Date(*d)),
            Self::DateTime(dt) => Some(DateTimeValue::DateTime(dt.clone())),
            _ => None,
        }
    }

    /// ## Summary
    /// Flattens any date-shaped value into a list.
    ///
    /// Periods contribute their start. Non-date values yield an empty list.
    #[must_use]
    pub fn as_date_list(&self) -> Vec<DateTimeValue> {
        match self {
            Self::Date(d) => vec![DateTimeValue::Date(*d)],
            Self::DateList(ds) => ds.iter().copied().map(DateTimeValue::Date).collect(),
            Self::DateTime(dt) => vec![DateTimeValue::DateTime(dt.clone())],
            Self::DateTimeList(dts) => dts.iter().cloned().map(DateTimeValue::DateTime).collect(),
            Self::Period(p) => vec![DateTimeValue::DateTime(p.start().clone())],
            Self::PeriodList(ps) => ps
                .iter()
                .map(|p| DateTimeValue::DateTime(p.start().clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Returns this value as a duration, if it is a duration value.
    #[must_use]
    pub fn as_duration(&self) -> Option<&Duration> {
        match self {
            Self::Duration(d) => Some(d),
            _ => None,
        }
    }

    /// Returns this value as a recurrence rule, if it is a recur value.
    #[must_use]
    pub fn as_recur(&self) -> Option<&RRule> {
        match self {
            Self::Recur(r) => Some(r),
            _ => None,
        }
    }
}
