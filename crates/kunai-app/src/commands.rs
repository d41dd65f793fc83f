//! Subcommand implementations. Results go to stdout as JSON lines.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde_json::json;

use kunai_core::config::{ExpansionConfig, SchedulingConfig};
use kunai_rfc::rfc::ical::core::{Component, ICalendar};
use kunai_rfc::rfc::ical::expand::TimeZoneResolver;
use kunai_rfc::rfc::ical::parse::parse;
use kunai_service::caldav::event_comparison::find_modified;
use kunai_service::caldav::event_reader::{EventExpander, EventSource, ExpanderOptions};
use kunai_service::caldav::tip_broker::TipBroker;

pub struct ExpandArgs {
    pub file: PathBuf,
    pub uid: String,
    pub from: Option<String>,
    pub until: Option<String>,
    pub limit: usize,
    pub zone: Option<String>,
}

fn read_calendar(path: &Path) -> Result<ICalendar> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse(&text).with_context(|| format!("parsing {}", path.display()))
}

fn parse_instant(value: Option<&str>, name: &str) -> Result<Option<DateTime<FixedOffset>>> {
    value
        .map(|v| DateTime::parse_from_rfc3339(v).with_context(|| format!("--{name} {v}")))
        .transpose()
}

/// ## Summary
/// Prints the occurrences of one series, optionally limited to a window.
///
/// ## Errors
/// Fails if the file cannot be read or parsed, the zone is unknown, or the
/// series cannot be expanded.
pub fn expand(config: &ExpansionConfig, args: &ExpandArgs) -> Result<()> {
    let ical = read_calendar(&args.file)?;
    let mut options = ExpanderOptions::from_config(config)?;
    if let Some(zone) = &args.zone {
        options = options.with_zone(TimeZoneResolver::new().resolve(zone)?);
    }

    let expander = EventExpander::new(EventSource::Calendar(&ical, &args.uid), &options)?;
    let from = parse_instant(args.from.as_deref(), "from")?;
    let until = parse_instant(args.until.as_deref(), "until")?;

    let start = from.unwrap_or_else(|| expander.start_date_time().fixed_offset());
    let occurrences = match until {
        Some(until) => expander.occurrences_between(&start, &until, args.limit),
        None => expander.occurrences_between(&start, &DateTime::<Utc>::MAX_UTC, args.limit),
    };

    for occurrence in occurrences {
        let end = occurrence + expander.duration();
        let line = json!({
            "start": occurrence.to_rfc3339(),
            "end": end.to_rfc3339(),
            "override": expander.recurrence_instance(&occurrence).is_some(),
        });
        println!("{line}");
    }
    Ok(())
}

/// ## Summary
/// Prints the instances that changed between two versions.
///
/// ## Errors
/// Fails if either file cannot be read or parsed.
pub fn diff(new: &Path, old: Option<&Path>) -> Result<()> {
    let new = read_calendar(new)?;
    let old = old.map(read_calendar).transpose()?;
    let result = find_modified(&new, old.as_ref());

    let describe = |events: &[Component]| {
        events
            .iter()
            .map(|event| {
                json!({
                    "uid": event.uid(),
                    "recurrence_id": event.recurrence_id().map(|id| id.to_string()),
                    "summary": event.summary(),
                })
            })
            .collect::<Vec<_>>()
    };

    let line = json!({
        "old": result.old.as_deref().map(describe),
        "new": describe(&result.new),
    });
    println!("{line}");
    Ok(())
}

/// ## Summary
/// Prints the iTip messages an organizer change requires.
///
/// ## Errors
/// Fails if a file cannot be read or parsed, or the calendar breaks the
/// scheduling rules.
pub fn notify(
    config: &SchedulingConfig,
    user: &str,
    new: Option<&Path>,
    old: Option<&Path>,
    payload: bool,
) -> Result<()> {
    let new = new.map(read_calendar).transpose()?;
    let old = old.map(read_calendar).transpose()?;

    let broker = TipBroker::new(config);
    let messages = broker.parse_event(new.as_ref(), user, old.as_ref())?;
    tracing::info!(count = messages.len(), "Composed messages");

    for message in &messages {
        let line = json!({
            "uid": message.uid,
            "method": message.method,
            "sequence": message.sequence,
            "sender": message.sender,
            "recipient": message.recipient,
            "recipient_name": message.recipient_name,
            "significant_change": message.significant_change,
        });
        println!("{line}");
        if payload {
            print!("{}", message.to_ical_string());
        }
    }
    Ok(())
}
