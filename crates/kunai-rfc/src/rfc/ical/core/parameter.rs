//! iCalendar property parameters (RFC 5545 §3.2).

use std::fmt;

/// A single property parameter, e.g. the `TZID` in
/// `DTSTART;TZID=America/Toronto:20240701T080000`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name (normalized to uppercase).
    pub name: String,
    /// Parameter values. MEMBER and DELEGATED-TO may carry several.
    pub values: Vec<String>,
}

impl Parameter {
    /// Creates a parameter with a single value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            values: vec![value.into()],
        }
    }

    /// Creates a parameter with multiple values.
    #[must_use]
    pub fn with_values(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            values,
        }
    }

    /// Returns the first value.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// Returns whether any value matches (case-insensitive).
    #[must_use]
    pub fn has_value(&self, value: &str) -> bool {
        self.values.iter().any(|v| v.eq_ignore_ascii_case(value))
    }

    #[must_use]
    pub fn tzid(tzid: impl Into<String>) -> Self {
        Self::new(names::TZID, tzid)
    }

    #[must_use]
    pub fn value_type(value_type: impl Into<String>) -> Self {
        Self::new(names::VALUE, value_type)
    }

    #[must_use]
    pub fn cn(name: impl Into<String>) -> Self {
        Self::new(names::CN, name)
    }

    #[must_use]
    pub fn partstat(status: impl Into<String>) -> Self {
        Self::new(names::PARTSTAT, status)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.values.is_empty() {
            return Ok(());
        }
        write!(f, "=")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            if value.contains([':', ';', ',']) {
                write!(f, "\"{}\"", escape_caret(value))?;
            } else {
                write!(f, "{}", escape_caret(value))?;
            }
        }
        Ok(())
    }
}

/// Applies RFC 6868 caret encoding to a parameter value.
fn escape_caret(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '^' => out.push_str("^^"),
            '\n' => out.push_str("^n"),
            '"' => out.push_str("^'"),
            _ => out.push(c),
        }
    }
    out
}

/// Parameter names used by the recurrence and scheduling code.
pub mod names {
    pub const CN: &str = "CN";
    pub const CUTYPE: &str = "CUTYPE";
    pub const PARTSTAT: &str = "PARTSTAT";
    pub const ROLE: &str = "ROLE";
    pub const RSVP: &str = "RSVP";
    pub const SCHEDULE_AGENT: &str = "SCHEDULE-AGENT";
    pub const SCHEDULE_FORCE_SEND: &str = "SCHEDULE-FORCE-SEND";
    pub const SCHEDULE_STATUS: &str = "SCHEDULE-STATUS";
    pub const TZID: &str = "TZID";
    pub const VALUE: &str = "VALUE";
}
