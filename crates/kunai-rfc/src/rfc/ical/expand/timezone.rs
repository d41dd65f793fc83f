//! Timezone resolution and wall-clock localization.
//!
//! Uses ICU4X for Windows zone names and IANA alias canonicalization.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone};
use chrono_tz::Tz;
use icu::time::zone::WindowsParser;
use icu::time::zone::iana::IanaParserExtended;

use crate::rfc::ical::core::{Component, ICalendar, names};

/// Error during timezone resolution or conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Invalid datetime: {0}")]
    InvalidDateTime(String),
}

/// ## Summary
/// Resolves TZID strings to `chrono_tz::Tz`.
///
/// Lookups go through the cache, then aliases registered from VTIMEZONE
/// `X-LIC-LOCATION` properties, then ICU normalization.
#[derive(Debug, Default, Clone)]
pub struct TimeZoneResolver {
    cache: HashMap<String, Tz>,
}

impl TimeZoneResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ## Summary
    /// Builds a resolver that knows the calendar's VTIMEZONE definitions.
    ///
    /// ## Side Effects
    /// Logs a warning for each VTIMEZONE that cannot be mapped to a known zone.
    #[must_use]
    pub fn for_calendar(ical: &ICalendar) -> Self {
        let mut resolver = Self::new();
        for vtimezone in ical.timezones() {
            resolver.register_vtimezone(vtimezone);
        }
        resolver
    }

    /// ## Summary
    /// Registers a VTIMEZONE, so its TZID resolves even when the name itself
    /// is proprietary, as long as `X-LIC-LOCATION` names a known zone.
    ///
    /// Returns the resolved zone.
    pub fn register_vtimezone(&mut self, vtimezone: &Component) -> Option<Tz> {
        let tzid = vtimezone.get_property(names::TZID)?.as_text()?.to_string();
        if let Ok(tz) = self.resolve(&tzid) {
            return Some(tz);
        }

        let location = vtimezone
            .get_property(names::X_LIC_LOCATION)
            .and_then(|p| p.as_text());
        match location.map(|loc| self.resolve(loc)) {
            Some(Ok(tz)) => {
                tracing::debug!(%tzid, zone = %tz.name(), "Resolved VTIMEZONE through X-LIC-LOCATION");
                self.cache.insert(tzid, tz);
                Some(tz)
            }
            _ => {
                tracing::warn!(%tzid, "VTIMEZONE does not map to a known zone");
                None
            }
        }
    }

    /// ## Summary
    /// Resolves a TZID to a zone.
    ///
    /// ## Errors
    /// Returns `ConversionError::UnknownTimezone` if the TZID cannot be
    /// resolved.
    ///
    /// ## Side Effects
    /// Caches successful resolutions.
    pub fn resolve(&mut self, tzid: &str) -> Result<Tz, ConversionError> {
        if let Some(tz) = self.cache.get(tzid) {
            return Ok(*tz);
        }

        let normalized = normalize_tzid(tzid);
        let tz = Tz::from_str(&normalized)
            .map_err(|_unknown| ConversionError::UnknownTimezone(tzid.to_string()))?;

        tracing::trace!(tzid, zone = %tz.name(), "Resolved timezone");
        self.cache.insert(tzid.to_string(), tz);
        Ok(tz)
    }
}

/// Maps Windows zone names and IANA aliases to canonical IANA names.
fn normalize_tzid(tzid: &str) -> String {
    let stripped = tzid
        .strip_prefix("/mozilla.org/")
        .or_else(|| tzid.strip_prefix("/softwarestudio.org/"))
        .unwrap_or(tzid)
        .trim();

    let iana = IanaParserExtended::new();

    if let Some(zone) = WindowsParser::new().parse(stripped, None)
        && let Some(entry) = iana.iter().find(|entry| entry.time_zone == zone)
    {
        return entry.canonical.to_string();
    }

    let parsed = iana.parse(stripped);
    if parsed.time_zone != icu::time::TimeZone::UNKNOWN {
        return parsed.canonical.to_string();
    }

    stripped.to_string()
}

/// ## Summary
/// Anchors a wall-clock reading in a zone.
///
/// In a DST fold the earlier instant is used. A reading inside a DST gap is
/// interpreted with the offset in effect before the gap, which moves it
/// forward by the gap's length (02:30 becomes 03:30 on a one-hour gap).
///
/// ## Errors
/// Returns `ConversionError::InvalidDateTime` if no offset can be found
/// around the reading.
pub fn localize(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Tz>, ConversionError> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => {
            let before = naive
                .checked_sub_signed(TimeDelta::days(1))
                .and_then(|probe| tz.from_local_datetime(&probe).earliest())
                .ok_or_else(|| {
                    ConversionError::InvalidDateTime(format!("{naive} in {}", tz.name()))
                })?;
            let offset = before.offset().fix();
            let utc = naive - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
            Ok(tz.from_utc_datetime(&utc))
        }
    }
}
