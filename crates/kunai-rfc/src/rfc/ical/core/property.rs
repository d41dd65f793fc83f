//! iCalendar property and content line types (RFC 5545 §3.1, §3.8).

use super::{Date, DateTime, DateTimeForm, DateTimeValue, Duration, Parameter, RRule, Value};

/// A raw content line as produced by the lexer.
///
/// The value is kept exactly as written (after unfolding, before
/// unescaping) until the parser resolves its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// Property name (normalized to uppercase).
    pub name: String,
    /// Parameters in order of appearance.
    pub params: Vec<Parameter>,
    /// Raw value string.
    pub raw_value: String,
    /// 1-based physical line the content line started on.
    pub line: usize,
}

impl ContentLine {
    /// Returns the value of a parameter.
    #[must_use]
    pub fn get_param_value(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .and_then(Parameter::value)
    }
}

/// A parsed iCalendar property.
///
/// Holds the typed value next to the raw text it came from. The serializer
/// writes `raw_value` for every non-text value, so constructors keep the two
/// in step.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name (normalized to uppercase).
    pub name: String,
    /// Parameters in order of appearance.
    pub params: Vec<Parameter>,
    /// Parsed value.
    pub value: Value,
    /// Raw value string.
    pub raw_value: String,
}

impl Property {
    fn with_value(name: impl Into<String>, value: Value, raw_value: String) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            value,
            raw_value,
        }
    }

    /// Creates a property with a TEXT value.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        Self::with_value(name, Value::Text(value.clone()), value)
    }

    /// Creates a property with an INTEGER value.
    #[must_use]
    pub fn integer(name: impl Into<String>, value: i32) -> Self {
        Self::with_value(name, Value::Integer(value), value.to_string())
    }

    /// Creates a property with a CAL-ADDRESS value.
    #[must_use]
    pub fn cal_address(name: impl Into<String>, address: impl Into<String>) -> Self {
        let address = address.into();
        Self::with_value(name, Value::CalAddress(address.clone()), address)
    }

    /// ## Summary
    /// Creates a property with a DATE-TIME value.
    ///
    /// A zoned value gets its TZID parameter.
    #[must_use]
    pub fn datetime(name: impl Into<String>, dt: DateTime) -> Self {
        let raw = dt.to_string();
        let tzid = dt.tzid().map(ToOwned::to_owned);
        let mut prop = Self::with_value(name, Value::DateTime(dt), raw);
        if let Some(tzid) = tzid {
            prop.params.push(Parameter::tzid(tzid));
        }
        prop
    }

    /// Creates a property with a DATE value and `VALUE=DATE`.
    #[must_use]
    pub fn date(name: impl Into<String>, d: Date) -> Self {
        let mut prop = Self::with_value(name, Value::Date(d), d.to_string());
        prop.params.push(Parameter::value_type("DATE"));
        prop
    }

    /// Creates a DATE or DATE-TIME property.
    #[must_use]
    pub fn date_time_value(name: impl Into<String>, value: DateTimeValue) -> Self {
        match value {
            DateTimeValue::Date(d) => Self::date(name, d),
            DateTimeValue::DateTime(dt) => Self::datetime(name, dt),
        }
    }

    /// ## Summary
    /// Creates an RDATE/EXDATE style list property.
    ///
    /// Every value must share one form. The list is treated as DATE values
    /// when its first entry is a DATE, and the TZID of the first zoned entry
    /// is carried as the parameter. Mixed lists go through
    /// [`Property::date_lists`].
    #[must_use]
    pub fn date_list(name: impl Into<String>, values: Vec<DateTimeValue>) -> Self {
        let raw = values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        if values.first().is_some_and(DateTimeValue::is_date) {
            let dates = values
                .into_iter()
                .filter_map(|v| match v {
                    DateTimeValue::Date(d) => Some(d),
                    DateTimeValue::DateTime(_) => None,
                })
                .collect();
            let mut prop = Self::with_value(name, Value::DateList(dates), raw);
            prop.params.push(Parameter::value_type("DATE"));
            return prop;
        }

        let tzid = values
            .iter()
            .find_map(DateTimeValue::tzid)
            .map(ToOwned::to_owned);
        let date_times = values
            .into_iter()
            .filter_map(|v| match v {
                DateTimeValue::DateTime(dt) => Some(dt),
                DateTimeValue::Date(_) => None,
            })
            .collect();
        let mut prop = Self::with_value(name, Value::DateTimeList(date_times), raw);
        if let Some(tzid) = tzid {
            prop.params.push(Parameter::tzid(tzid));
        }
        prop
    }

    /// ## Summary
    /// Creates one list property per value form: DATE, floating, UTC, and
    /// one per TZID.
    ///
    /// Groups appear in the order of their first value. Values keep their
    /// order within a group and duplicates are dropped.
    #[must_use]
    pub fn date_lists(name: &str, values: Vec<DateTimeValue>) -> Vec<Self> {
        let mut groups: Vec<(Option<DateTimeForm>, Vec<DateTimeValue>)> = Vec::new();
        for value in values {
            let form = match &value {
                DateTimeValue::Date(_) => None,
                DateTimeValue::DateTime(dt) => Some(dt.form.clone()),
            };
            match groups.iter_mut().find(|(group_form, _)| *group_form == form) {
                Some((_, group)) if group.contains(&value) => {}
                Some((_, group)) => group.push(value),
                None => groups.push((form, vec![value])),
            }
        }
        groups
            .into_iter()
            .map(|(_, group)| Self::date_list(name, group))
            .collect()
    }

    /// Creates a property with a DURATION value.
    #[must_use]
    pub fn duration(name: impl Into<String>, d: Duration) -> Self {
        Self::with_value(name, Value::Duration(d), d.to_string())
    }

    /// Creates a property with a RECUR value.
    #[must_use]
    pub fn recur(name: impl Into<String>, rule: RRule) -> Self {
        let raw = rule.to_string();
        Self::with_value(name, Value::Recur(Box::new(rule)), raw)
    }

    /// Returns the parameter with the given name.
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&Parameter> {
        self.params
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Returns the first value of a parameter.
    #[must_use]
    pub fn get_param_value(&self, name: &str) -> Option<&str> {
        self.get_param(name)?.value()
    }

    /// Appends a parameter.
    pub fn add_param(&mut self, param: Parameter) {
        self.params.push(param);
    }

    /// Sets a parameter, replacing any existing parameter with the same name.
    pub fn set_param(&mut self, param: Parameter) {
        self.params.retain(|p| p.name != param.name);
        self.params.push(param);
    }

    /// Removes every parameter with the given name.
    pub fn remove_param(&mut self, name: &str) {
        self.params.retain(|p| !p.name.eq_ignore_ascii_case(name));
    }

    /// Returns the TZID parameter.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        self.get_param_value(super::parameter::names::TZID)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        self.value.as_text()
    }

    #[must_use]
    pub fn as_integer(&self) -> Option<i32> {
        self.value.as_integer()
    }

    /// Returns a CAL-ADDRESS value, falling back to the raw text.
    #[must_use]
    pub fn as_cal_address(&self) -> Option<&str> {
        self.value
            .as_cal_address()
            .or_else(|| self.value.as_text())
    }

    #[must_use]
    pub fn as_datetime(&self) -> Option<&DateTime> {
        self.value.as_datetime()
    }

    #[must_use]
    pub fn as_date(&self) -> Option<&Date> {
        self.value.as_date()
    }

    #[must_use]
    pub fn as_date_time_value(&self) -> Option<DateTimeValue> {
        self.value.as_date_time_value()
    }

    #[must_use]
    pub fn as_date_list(&self) -> Vec<DateTimeValue> {
        self.value.as_date_list()
    }

    #[must_use]
    pub fn as_duration(&self) -> Option<&Duration> {
        self.value.as_duration()
    }

    #[must_use]
    pub fn as_recur(&self) -> Option<&RRule> {
        self.value.as_recur()
    }
}

/// ## Summary
/// Normalizes a calendar user address for comparison.
///
/// The `mailto:` scheme is lowercased, and so is the whole address when it is
/// a mail address; other URIs are compared with their path case intact.
#[must_use]
pub fn normalize_cal_address(address: &str) -> String {
    let trimmed = address.trim();
    match trimmed.split_once(':') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("mailto") => {
            format!("mailto:{}", rest.to_ascii_lowercase())
        }
        Some((scheme, rest)) => format!("{}:{rest}", scheme.to_ascii_lowercase()),
        None => trimmed.to_string(),
    }
}

/// Property names used by the recurrence and scheduling code.
pub mod names {
    // Calendar properties
    pub const CALSCALE: &str = "CALSCALE";
    pub const METHOD: &str = "METHOD";
    pub const PRODID: &str = "PRODID";
    pub const VERSION: &str = "VERSION";

    // Descriptive
    pub const DESCRIPTION: &str = "DESCRIPTION";
    pub const LOCATION: &str = "LOCATION";
    pub const STATUS: &str = "STATUS";
    pub const SUMMARY: &str = "SUMMARY";

    // Date and time
    pub const DTEND: &str = "DTEND";
    pub const DTSTART: &str = "DTSTART";
    pub const DUE: &str = "DUE";
    pub const DURATION: &str = "DURATION";

    // Timezone
    pub const TZID: &str = "TZID";
    pub const X_LIC_LOCATION: &str = "X-LIC-LOCATION";

    // Relationship
    pub const ATTENDEE: &str = "ATTENDEE";
    pub const ORGANIZER: &str = "ORGANIZER";
    pub const RECURRENCE_ID: &str = "RECURRENCE-ID";
    pub const UID: &str = "UID";

    // Recurrence
    pub const EXDATE: &str = "EXDATE";
    pub const EXRULE: &str = "EXRULE";
    pub const RDATE: &str = "RDATE";
    pub const RRULE: &str = "RRULE";

    // Change management
    pub const DTSTAMP: &str = "DTSTAMP";
    pub const LAST_MODIFIED: &str = "LAST-MODIFIED";
    pub const SEQUENCE: &str = "SEQUENCE";
}
