//! Change detection between two versions of an event series.

use kunai_rfc::rfc::ical::core::{Component, ICalendar, names};

/// Properties whose values decide whether two instances are the same.
const COMPARED_PROPERTIES: [&str; 4] = [
    names::RECURRENCE_ID,
    names::RRULE,
    names::SEQUENCE,
    names::LAST_MODIFIED,
];

/// Instances left over after pairing the old and new versions of a series.
#[derive(Debug, Clone, Default)]
pub struct ModifiedEvents {
    /// Old instances with no identical counterpart, `None` when there was no
    /// old version.
    pub old: Option<Vec<Component>>,
    /// New instances with no identical counterpart.
    pub new: Vec<Component>,
}

impl ModifiedEvents {
    /// True when every instance found an identical counterpart.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.new.is_empty() && self.old.as_ref().is_none_or(Vec::is_empty)
    }
}

/// ## Summary
/// Pairs each old VEVENT with the first new VEVENT carrying the same
/// RECURRENCE-ID, RRULE, SEQUENCE and LAST-MODIFIED, and drops both.
///
/// Whatever is left is reported: new instances were created or modified,
/// old instances were removed or superseded. With no old calendar every new
/// VEVENT is reported and `old` is `None`.
#[must_use]
pub fn find_modified(new: &ICalendar, old: Option<&ICalendar>) -> ModifiedEvents {
    let mut new_events: Vec<Component> = new.events().into_iter().cloned().collect();

    let Some(old) = old else {
        tracing::trace!(new = new_events.len(), "No previous version");
        return ModifiedEvents {
            old: None,
            new: new_events,
        };
    };

    let mut old_events = Vec::new();
    for event in old.events() {
        match new_events
            .iter()
            .position(|candidate| !is_event_different(candidate, event))
        {
            Some(index) => {
                new_events.remove(index);
            }
            None => old_events.push(event.clone()),
        }
    }

    tracing::debug!(
        old = old_events.len(),
        new = new_events.len(),
        "Compared event versions"
    );

    ModifiedEvents {
        old: Some(old_events),
        new: new_events,
    }
}

/// True when any compared property differs. A missing property reads as an
/// empty string.
#[must_use]
pub fn is_event_different(a: &Component, b: &Component) -> bool {
    COMPARED_PROPERTIES
        .iter()
        .any(|name| compared_value(a, name) != compared_value(b, name))
}

fn compared_value<'a>(event: &'a Component, name: &str) -> &'a str {
    event
        .get_property(name)
        .map_or("", |property| property.raw_value.as_str())
}
