//! iTip scheduling messages (RFC 5546) handed to the delivery transport.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use kunai_rfc::rfc::ical::build::serialize;
use kunai_rfc::rfc::ical::core::ICalendar;

use crate::error::ServiceError;

/// iTip method for calendar scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItipMethod {
    Publish,
    Request,
    Reply,
    Add,
    Cancel,
    Refresh,
    Counter,
    DeclineCounter,
}

impl ItipMethod {
    /// Returns the METHOD property value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Publish => "PUBLISH",
            Self::Request => "REQUEST",
            Self::Reply => "REPLY",
            Self::Add => "ADD",
            Self::Cancel => "CANCEL",
            Self::Refresh => "REFRESH",
            Self::Counter => "COUNTER",
            Self::DeclineCounter => "DECLINECOUNTER",
        }
    }
}

impl fmt::Display for ItipMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItipMethod {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "PUBLISH" => Self::Publish,
            "REQUEST" => Self::Request,
            "REPLY" => Self::Reply,
            "ADD" => Self::Add,
            "CANCEL" => Self::Cancel,
            "REFRESH" => Self::Refresh,
            "COUNTER" => Self::Counter,
            "DECLINECOUNTER" => Self::DeclineCounter,
            other => {
                return Err(ServiceError::SchedulingError(format!(
                    "unknown iTip method {other}"
                )));
            }
        })
    }
}

/// One outbound scheduling message for one recipient.
#[derive(Debug, Clone)]
pub struct ItipMessage {
    pub uid: String,
    /// Component type carried in the payload, e.g. `VEVENT`.
    pub component: String,
    pub method: ItipMethod,
    pub sequence: i32,
    /// Calendar user address of the sender (`mailto:` URI).
    pub sender: String,
    pub sender_name: Option<String>,
    /// Calendar user address of the recipient (`mailto:` URI).
    pub recipient: String,
    pub recipient_name: Option<String>,
    /// False when delivery may be skipped because nothing the recipient
    /// cares about changed.
    pub significant_change: bool,
    /// Payload carrying the METHOD property.
    pub message: ICalendar,
}

impl ItipMessage {
    /// Serializes the payload for delivery.
    #[must_use]
    pub fn to_ical_string(&self) -> String {
        serialize(&self.message)
    }
}
