//! iCalendar core models (RFC 5545).
//!
//! This module defines the core data structures for representing iCalendar
//! content. These types are designed for:
//! - Round-trip fidelity: preserving unknown properties and parameters
//! - Generic access: properties and parameters are looked up by name
//! - Type safety: date, duration and recurrence values are parsed eagerly

mod component;
mod datetime;
mod duration;
mod parameter;
mod property;
mod rrule;
mod value;

pub use component::{Component, ComponentKind, ICalendar};
pub use datetime::{DateTime, DateTimeForm};
pub use duration::Duration;
pub use parameter::{Parameter, names as param_names};
pub use property::{ContentLine, Property, names, normalize_cal_address};
pub use rrule::{Frequency, RRule, RRuleUntil, Weekday, WeekdayNum};
pub use value::{Date, DateTimeValue, Period, Value};
