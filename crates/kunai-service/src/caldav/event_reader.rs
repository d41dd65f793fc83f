//! Occurrence expansion for a single event series.
//!
//! An [`EventExpander`] wraps the base VEVENT of a series (plus any override
//! instances), resolves its zones and time span, and walks the merged
//! RRULE/RDATE occurrences minus EXRULE/EXDATE with a rewindable cursor.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use kunai_core::config::ExpansionConfig;
use kunai_rfc::rfc::ical::core::{
    Component, DateTimeValue, Duration, Frequency, ICalendar, Property, names,
};
use kunai_rfc::rfc::ical::expand::{TimeZoneResolver, localize};
use kunai_rfc::rfc::ical::parse::parse;

use super::event_reader_rdate::DateSetIterator;
use super::event_reader_rrule::RuleIterator;
use crate::error::{ServiceError, ServiceResult};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const ORDINAL_NAMES: [&str; 5] = ["First", "Second", "Third", "Fourth", "Fifth"];

/// Input accepted by [`EventExpander::new`].
#[derive(Debug, Clone, Copy)]
pub enum EventSource<'a> {
    /// A parsed calendar and the UID of the series to extract.
    Calendar(&'a ICalendar, &'a str),
    /// iCalendar text and the UID of the series to extract.
    Text(&'a str, &'a str),
    /// A single VEVENT.
    Event(&'a Component),
    /// All instances of one series, master and overrides.
    Instances(&'a [Component]),
}

/// Settings for one expansion session.
#[derive(Debug, Clone)]
pub struct ExpanderOptions {
    /// Zone that takes precedence over anything the event says.
    pub zone: Option<Tz>,
    /// Zone used when neither the caller, DTSTART, nor the calendar names one.
    pub default_zone: Tz,
    /// Most occurrences one rule generates per refill.
    pub max_occurrences: u16,
}

impl Default for ExpanderOptions {
    fn default() -> Self {
        Self {
            zone: None,
            default_zone: Tz::UTC,
            max_occurrences: 10_000,
        }
    }
}

impl ExpanderOptions {
    /// ## Summary
    /// Builds options from the expansion settings.
    ///
    /// ## Errors
    /// Returns `ServiceError::TimezoneError` if the configured default zone
    /// is unknown.
    pub fn from_config(config: &ExpansionConfig) -> ServiceResult<Self> {
        let default_zone = TimeZoneResolver::new().resolve(&config.default_timezone)?;
        Ok(Self {
            zone: None,
            default_zone,
            max_occurrences: config.max_occurrences,
        })
    }

    #[must_use]
    pub fn with_zone(mut self, zone: Tz) -> Self {
        self.zone = Some(zone);
        self
    }
}

/// What a zone resolver may consult.
#[derive(Debug, Clone, Copy)]
pub struct ZoneQuery<'a> {
    /// Zone passed by the caller.
    pub explicit: Option<Tz>,
    /// DTSTART or DTEND.
    pub property: Option<&'a Property>,
    /// TZID of the first VTIMEZONE in the enclosing calendar.
    pub calendar_tzid: Option<&'a str>,
    /// Zone of last resort.
    pub fallback: Tz,
}

/// One step of a zone fallback chain.
pub type ZoneResolverFn = fn(&ZoneQuery<'_>, &mut TimeZoneResolver) -> Option<Tz>;

/// Zone resolution order for DTSTART and DTEND, first match wins.
pub const ZONE_RESOLVERS: &[ZoneResolverFn] =
    &[explicit_zone, property_zone, calendar_zone, fallback_zone];

fn explicit_zone(query: &ZoneQuery<'_>, _resolver: &mut TimeZoneResolver) -> Option<Tz> {
    query.explicit
}

fn property_zone(query: &ZoneQuery<'_>, resolver: &mut TimeZoneResolver) -> Option<Tz> {
    let property = query.property?;
    match property.as_date_time_value()? {
        DateTimeValue::DateTime(dt) if dt.is_utc() => Some(Tz::UTC),
        value => {
            let tzid = value.tzid().or_else(|| property.tzid())?;
            resolver
                .resolve(tzid)
                .inspect_err(|err| tracing::warn!(%err, property = %property.name, "Unresolvable TZID"))
                .ok()
        }
    }
}

fn calendar_zone(query: &ZoneQuery<'_>, resolver: &mut TimeZoneResolver) -> Option<Tz> {
    let tzid = query.calendar_tzid?;
    resolver
        .resolve(tzid)
        .inspect_err(|err| tracing::warn!(%err, "Unresolvable VTIMEZONE"))
        .ok()
}

fn fallback_zone(query: &ZoneQuery<'_>, _resolver: &mut TimeZoneResolver) -> Option<Tz> {
    Some(query.fallback)
}

/// Runs `chain` in order and returns the first zone found.
pub fn resolve_zone(
    chain: &[ZoneResolverFn],
    query: &ZoneQuery<'_>,
    resolver: &mut TimeZoneResolver,
) -> Tz {
    chain
        .iter()
        .find_map(|step| step(query, resolver))
        .unwrap_or(query.fallback)
}

/// Whether a series repeats by absolute dates or by position within a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrencePattern {
    Absolute,
    Relative,
}

impl RecurrencePattern {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Absolute => "A",
            Self::Relative => "R",
        }
    }
}

impl fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Granularity of a series: the rule frequency, or `Fixed` for date lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrencePrecision {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Fixed,
}

impl RecurrencePrecision {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secondly => "secondly",
            Self::Minutely => "minutely",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Fixed => "fixed",
        }
    }
}

impl From<Frequency> for RecurrencePrecision {
    fn from(freq: Frequency) -> Self {
        match freq {
            Frequency::Secondly => Self::Secondly,
            Frequency::Minutely => Self::Minutely,
            Frequency::Hourly => Self::Hourly,
            Frequency::Daily => Self::Daily,
            Frequency::Weekly => Self::Weekly,
            Frequency::Monthly => Self::Monthly,
            Frequency::Yearly => Self::Yearly,
        }
    }
}

impl fmt::Display for RecurrencePrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule, a date list, both, or neither.
#[derive(Debug, Clone)]
pub enum RecurrenceSource {
    None,
    Rule(RuleIterator),
    Dates(DateSetIterator),
    Both(RuleIterator, DateSetIterator),
}

impl RecurrenceSource {
    fn from_parts(rule: Option<RuleIterator>, dates: Option<DateSetIterator>) -> Self {
        match (rule, dates) {
            (None, None) => Self::None,
            (Some(rule), None) => Self::Rule(rule),
            (None, Some(dates)) => Self::Dates(dates),
            (Some(rule), Some(dates)) => Self::Both(rule, dates),
        }
    }

    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    #[must_use]
    pub const fn rule(&self) -> Option<&RuleIterator> {
        match self {
            Self::Rule(rule) | Self::Both(rule, _) => Some(rule),
            Self::None | Self::Dates(_) => None,
        }
    }

    #[must_use]
    pub const fn dates(&self) -> Option<&DateSetIterator> {
        match self {
            Self::Dates(dates) | Self::Both(_, dates) => Some(dates),
            Self::None | Self::Rule(_) => None,
        }
    }

    /// Earliest current date among the sources.
    fn current(&self) -> Option<DateTime<Tz>> {
        match self {
            Self::None => None,
            Self::Rule(rule) => rule.current(),
            Self::Dates(dates) => dates.current(),
            Self::Both(rule, dates) => match (rule.current(), dates.current()) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            },
        }
    }

    fn rewind(&mut self) {
        match self {
            Self::None => {}
            Self::Rule(rule) => rule.rewind(),
            Self::Dates(dates) => dates.rewind(),
            Self::Both(rule, dates) => {
                rule.rewind();
                dates.rewind();
            }
        }
    }

    fn advance_past(&mut self, date: &DateTime<Tz>) {
        match self {
            Self::None => {}
            Self::Rule(rule) => rule.advance_past(date),
            Self::Dates(dates) => dates.advance_past(date),
            Self::Both(rule, dates) => {
                rule.advance_past(date);
                dates.advance_past(date);
            }
        }
    }

    fn advance_to(&mut self, date: &DateTime<Tz>) {
        match self {
            Self::None => {}
            Self::Rule(rule) => rule.advance_to(date),
            Self::Dates(dates) => dates.advance_to(date),
            Self::Both(rule, dates) => {
                rule.advance_to(date);
                dates.advance_to(date);
            }
        }
    }
}

/// ## Summary
/// Traversal state over the occurrences of a series.
///
/// The cursor starts on the series start. Each step takes the earliest
/// inclusion candidate after the current date and skips it when an
/// exclusion source lands on the same instant.
#[derive(Debug, Clone)]
pub struct OccurrenceCursor {
    start: DateTime<Tz>,
    current: Option<DateTime<Tz>>,
    inclusion: RecurrenceSource,
    exclusion: RecurrenceSource,
}

impl OccurrenceCursor {
    fn new(start: DateTime<Tz>, inclusion: RecurrenceSource, exclusion: RecurrenceSource) -> Self {
        let mut cursor = Self {
            start,
            current: Some(start),
            inclusion,
            exclusion,
        };
        cursor.rewind();
        cursor
    }

    #[must_use]
    pub const fn current(&self) -> Option<DateTime<Tz>> {
        self.current
    }

    pub fn rewind(&mut self) {
        self.inclusion.rewind();
        self.exclusion.rewind();
        let start = self.start;
        self.current = Some(start);
        if self.is_excluded(&start) {
            tracing::trace!(%start, "Series start is excluded");
            self.advance();
        }
    }

    pub fn advance(&mut self) {
        while let Some(current) = self.current {
            self.inclusion.advance_past(&current);
            let Some(candidate) = self.inclusion.current() else {
                self.current = None;
                return;
            };
            self.current = Some(candidate);
            if !self.is_excluded(&candidate) {
                return;
            }
            tracing::trace!(%candidate, "Occurrence excluded");
        }
    }

    pub fn advance_to(&mut self, target: &DateTime<Tz>) {
        while self.current.is_some_and(|current| current < *target) {
            self.advance();
        }
    }

    fn is_excluded(&mut self, date: &DateTime<Tz>) -> bool {
        self.exclusion.advance_to(date);
        self.exclusion.current() == Some(*date)
    }
}

/// Collected instances of one series plus what the enclosing calendar offers.
struct SeriesInput<'a> {
    instances: Vec<&'a Component>,
    resolver: TimeZoneResolver,
    calendar_tzid: Option<String>,
}

impl<'a> SeriesInput<'a> {
    fn from_calendar(ical: &'a ICalendar, uid: &str) -> ServiceResult<Self> {
        let instances = ical.events_with_uid(uid);
        if instances.is_empty() {
            return Err(ServiceError::InvalidArgument(format!(
                "calendar has no VEVENT with UID {uid}"
            )));
        }
        let calendar_tzid = ical
            .timezones()
            .first()
            .and_then(|vtimezone| vtimezone.get_property(names::TZID))
            .and_then(Property::as_text)
            .map(str::to_string);
        Ok(Self {
            instances,
            resolver: TimeZoneResolver::for_calendar(ical),
            calendar_tzid,
        })
    }

    fn from_instances(instances: Vec<&'a Component>) -> Self {
        Self {
            instances,
            resolver: TimeZoneResolver::new(),
            calendar_tzid: None,
        }
    }
}

/// ## Summary
/// Reads the temporal facts of an event series and walks its occurrences.
///
/// Override instances are indexed by RECURRENCE-ID but never substituted
/// into the occurrence stream; the cursor always reflects the unmodified
/// pattern.
#[derive(Debug, Clone)]
pub struct EventExpander {
    base: Component,
    overrides: BTreeMap<DateTime<Utc>, Component>,
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    duration: TimeDelta,
    entire_day: bool,
    cursor: OccurrenceCursor,
}

impl EventExpander {
    /// ## Summary
    /// Builds an expander for one series.
    ///
    /// The base instance is the first instance without RECURRENCE-ID; when
    /// every instance has one, the first instance in input order is used.
    ///
    /// ## Errors
    /// Returns `ServiceError::InvalidArgument` if no instance matches the UID,
    /// or the base instance has no usable DTSTART. Parse, timezone and rule
    /// errors are propagated.
    #[tracing::instrument(skip(source, options), fields(uid = tracing::field::Empty))]
    pub fn new(source: EventSource<'_>, options: &ExpanderOptions) -> ServiceResult<Self> {
        let parsed;
        let input = match source {
            EventSource::Calendar(ical, uid) => SeriesInput::from_calendar(ical, uid)?,
            EventSource::Text(text, uid) => {
                parsed = parse(text)?;
                SeriesInput::from_calendar(&parsed, uid)?
            }
            EventSource::Event(event) => SeriesInput::from_instances(vec![event]),
            EventSource::Instances(instances) => {
                SeriesInput::from_instances(instances.iter().collect())
            }
        };
        Self::from_series(input, options)
    }

    fn from_series(input: SeriesInput<'_>, options: &ExpanderOptions) -> ServiceResult<Self> {
        let SeriesInput {
            instances,
            mut resolver,
            calendar_tzid,
        } = input;

        let Some(base_index) = instances
            .iter()
            .position(|instance| !instance.has_property(names::RECURRENCE_ID))
            .or_else(|| {
                tracing::debug!("Series has no master instance, promoting the first instance");
                (!instances.is_empty()).then_some(0)
            })
        else {
            return Err(ServiceError::InvalidArgument(
                "series has no instances".to_string(),
            ));
        };
        let base = instances[base_index].clone();
        tracing::Span::current().record("uid", base.uid());

        let dtstart = base.get_property(names::DTSTART).ok_or_else(|| {
            ServiceError::InvalidArgument("event has no DTSTART".to_string())
        })?;
        let start_value = dtstart.as_date_time_value().ok_or_else(|| {
            ServiceError::InvalidArgument(format!("DTSTART is not a date: {}", dtstart.raw_value))
        })?;

        let start_zone = resolve_zone(
            ZONE_RESOLVERS,
            &ZoneQuery {
                explicit: options.zone,
                property: Some(dtstart),
                calendar_tzid: calendar_tzid.as_deref(),
                fallback: options.default_zone,
            },
            &mut resolver,
        );
        let start = anchor(&start_value, start_zone, &mut resolver)?;
        let entire_day = start_value.is_floating();

        let dtend = base.get_property(names::DTEND);
        let end_zone = resolve_zone(
            ZONE_RESOLVERS,
            &ZoneQuery {
                explicit: options.zone,
                property: dtend,
                calendar_tzid: calendar_tzid.as_deref(),
                fallback: start_zone,
            },
            &mut resolver,
        );

        let end = if let Some(end_value) = dtend.and_then(Property::as_date_time_value) {
            anchor(&end_value, end_zone, &mut resolver)?
        } else if let Some(duration) = base
            .get_property(names::DURATION)
            .and_then(Property::as_duration)
        {
            add_duration(start, duration)?.with_timezone(&end_zone)
        } else if entire_day {
            add_duration(start, &Duration::days(1))?.with_timezone(&end_zone)
        } else {
            tracing::trace!("No DTEND or DURATION on a timed event, using zero duration");
            start.with_timezone(&end_zone)
        };
        let duration = end.signed_duration_since(start);

        let max = options.max_occurrences;
        let rrule = base
            .get_property(names::RRULE)
            .and_then(Property::as_recur)
            .map(|rule| RuleIterator::new(rule, start, max))
            .transpose()?;
        let rdates = collect_dates(&base, names::RDATE, start_zone, &mut resolver)?;
        let exrule = base
            .get_property(names::EXRULE)
            .and_then(Property::as_recur)
            .map(|rule| RuleIterator::unanchored(rule, start, max))
            .transpose()?;
        let exdates = collect_dates(&base, names::EXDATE, start_zone, &mut resolver)?;

        let mut overrides = BTreeMap::new();
        for (index, instance) in instances.iter().enumerate() {
            if index == base_index {
                continue;
            }
            let Some(recurrence_id) = instance.recurrence_id() else {
                tracing::warn!("Ignoring a second instance without RECURRENCE-ID");
                continue;
            };
            let when = anchor(&recurrence_id, start_zone, &mut resolver)?;
            overrides.insert(when.with_timezone(&Utc), (*instance).clone());
        }

        let cursor = OccurrenceCursor::new(
            start,
            RecurrenceSource::from_parts(rrule, rdates),
            RecurrenceSource::from_parts(exrule, exdates),
        );

        tracing::debug!(
            %start,
            %end,
            entire_day,
            recurs = !cursor.inclusion.is_none(),
            overrides = overrides.len(),
            "Event expander ready"
        );

        Ok(Self {
            base,
            overrides,
            start,
            end,
            duration,
            entire_day,
            cursor,
        })
    }

    #[must_use]
    pub const fn base_event(&self) -> &Component {
        &self.base
    }

    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.base.uid()
    }

    #[must_use]
    pub const fn start_date_time(&self) -> DateTime<Tz> {
        self.start
    }

    #[must_use]
    pub fn start_time_zone(&self) -> Tz {
        self.start.timezone()
    }

    #[must_use]
    pub const fn end_date_time(&self) -> DateTime<Tz> {
        self.end
    }

    #[must_use]
    pub fn end_time_zone(&self) -> Tz {
        self.end.timezone()
    }

    #[must_use]
    pub const fn duration(&self) -> TimeDelta {
        self.duration
    }

    /// True when DTSTART carries no zone (a DATE or a floating DATE-TIME).
    #[must_use]
    pub const fn entire_day(&self) -> bool {
        self.entire_day
    }

    /// True when an RRULE or RDATE exists.
    #[must_use]
    pub const fn recurs(&self) -> bool {
        !self.cursor.inclusion.is_none()
    }

    #[must_use]
    pub fn recurring_pattern(&self) -> Option<RecurrencePattern> {
        if !self.recurs() {
            return None;
        }
        Some(match self.rule() {
            Some(rule) if rule.is_relative() => RecurrencePattern::Relative,
            _ => RecurrencePattern::Absolute,
        })
    }

    #[must_use]
    pub fn recurring_precision(&self) -> Option<RecurrencePrecision> {
        match &self.cursor.inclusion {
            RecurrenceSource::None => None,
            RecurrenceSource::Dates(_) => Some(RecurrencePrecision::Fixed),
            RecurrenceSource::Rule(rule) | RecurrenceSource::Both(rule, _) => {
                Some(rule.precision().into())
            }
        }
    }

    #[must_use]
    pub fn recurring_interval(&self) -> Option<u32> {
        self.rule().map(RuleIterator::interval)
    }

    /// True when either inclusion source concludes. An RDATE list always
    /// does.
    #[must_use]
    pub fn recurring_concludes(&self) -> bool {
        let rule = self
            .cursor
            .inclusion
            .rule()
            .is_some_and(|rule| rule.concludes_on().is_some() || rule.concludes_after().is_some());
        let dates = self
            .cursor
            .inclusion
            .dates()
            .is_some_and(|dates| dates.concludes_after().is_some());
        rule || dates
    }

    /// ## Summary
    /// COUNT plus the number of RDATEs, counting whichever of the two is
    /// known. `None` when neither is.
    #[must_use]
    pub fn recurring_concludes_after(&self) -> Option<u32> {
        let rule = self.cursor.inclusion.rule().and_then(RuleIterator::concludes_after);
        let dates = self
            .cursor
            .inclusion
            .dates()
            .and_then(DateSetIterator::concludes_after)
            .map(|len| u32::try_from(len).unwrap_or(u32::MAX));
        combine(rule, dates, u32::saturating_add)
    }

    /// ## Summary
    /// Date of the last occurrence: the later of the rule's end and the last
    /// RDATE, counting whichever of the two is known. `None` when neither is.
    ///
    /// The occurrence cursor is left where it was.
    #[must_use]
    pub fn recurring_concludes_on(&self) -> Option<DateTime<Tz>> {
        let rule = self.cursor.inclusion.rule().and_then(RuleIterator::concludes);
        let dates = self
            .cursor
            .inclusion
            .dates()
            .and_then(DateSetIterator::concludes_on);
        combine(rule, dates, std::cmp::max)
    }

    /// BYDAY values as written, e.g. `MO` or `-1FR`.
    #[must_use]
    pub fn recurring_days_of_week(&self) -> Vec<String> {
        self.rule()
            .map(|rule| rule.days_of_week().iter().map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn recurring_days_of_week_named(&self) -> Vec<&'static str> {
        self.rule()
            .map(|rule| {
                rule.days_of_week()
                    .iter()
                    .map(|day| day.weekday.name())
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn recurring_days_of_month(&self) -> &[i8] {
        self.rule().map_or(&[], RuleIterator::days_of_month)
    }

    #[must_use]
    pub fn recurring_days_of_year(&self) -> &[i16] {
        self.rule().map_or(&[], RuleIterator::days_of_year)
    }

    #[must_use]
    pub fn recurring_weeks_of_year(&self) -> &[i8] {
        self.rule().map_or(&[], RuleIterator::weeks_of_year)
    }

    #[must_use]
    pub fn recurring_months_of_year(&self) -> &[u8] {
        self.rule().map_or(&[], RuleIterator::months_of_year)
    }

    #[must_use]
    pub fn recurring_months_of_year_named(&self) -> Vec<&'static str> {
        self.recurring_months_of_year()
            .iter()
            .filter_map(|month| MONTH_NAMES.get(usize::from(*month).checked_sub(1)?))
            .copied()
            .collect()
    }

    /// BYSETPOS values.
    #[must_use]
    pub fn recurring_relative_position(&self) -> &[i16] {
        self.rule().map_or(&[], RuleIterator::relative_position)
    }

    #[must_use]
    pub fn recurring_relative_position_named(&self) -> Vec<String> {
        self.recurring_relative_position()
            .iter()
            .map(|position| position_name(*position))
            .collect()
    }

    /// Current occurrence, `None` once the series is exhausted.
    #[must_use]
    pub const fn recurrence_date(&self) -> Option<DateTime<Tz>> {
        self.cursor.current()
    }

    pub fn recurrence_rewind(&mut self) {
        self.cursor.rewind();
    }

    pub fn recurrence_advance(&mut self) {
        self.cursor.advance();
    }

    /// Advances until the current occurrence is at or after `target`.
    pub fn recurrence_advance_to<Z: TimeZone>(&mut self, target: &DateTime<Z>) {
        let target = target.with_timezone(&self.start.timezone());
        self.cursor.advance_to(&target);
    }

    /// Override instance whose RECURRENCE-ID is `date`.
    #[must_use]
    pub fn recurrence_instance<Z: TimeZone>(&self, date: &DateTime<Z>) -> Option<&Component> {
        self.overrides.get(&date.with_timezone(&Utc))
    }

    /// Override instances in RECURRENCE-ID order.
    pub fn recurrence_instances(&self) -> impl Iterator<Item = (&DateTime<Utc>, &Component)> {
        self.overrides.iter()
    }

    /// ## Summary
    /// Occurrences starting in `[from, until)`, at most `limit` of them.
    ///
    /// Walks a copy of the cursor, so the caller's position is unchanged.
    #[must_use]
    pub fn occurrences_between<Z1: TimeZone, Z2: TimeZone>(
        &self,
        from: &DateTime<Z1>,
        until: &DateTime<Z2>,
        limit: usize,
    ) -> Vec<DateTime<Tz>> {
        let tz = self.start.timezone();
        let from = from.with_timezone(&tz);
        let until = until.with_timezone(&tz);

        let mut cursor = self.cursor.clone();
        cursor.rewind();
        cursor.advance_to(&from);

        let mut occurrences = Vec::new();
        while let Some(date) = cursor.current() {
            if date >= until || occurrences.len() >= limit {
                break;
            }
            occurrences.push(date);
            cursor.advance();
        }
        occurrences
    }

    fn rule(&self) -> Option<&RuleIterator> {
        self.cursor.inclusion.rule()
    }
}

/// Merges two optional values, keeping whichever is present.
fn combine<T>(a: Option<T>, b: Option<T>, merge: impl FnOnce(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(merge(a, b)),
        (a, b) => a.or(b),
    }
}

/// ## Summary
/// Turns a DATE or DATE-TIME into an instant expressed in `zone`.
///
/// DATE values and floating times are read as wall-clock time in `zone`. A
/// zoned time keeps its own TZID, falling back to `zone` when that TZID is
/// unknown.
fn anchor(
    value: &DateTimeValue,
    zone: Tz,
    resolver: &mut TimeZoneResolver,
) -> ServiceResult<DateTime<Tz>> {
    let invalid = || ServiceError::InvalidArgument(format!("not a calendar date: {value}"));
    match value {
        DateTimeValue::Date(date) => {
            let naive = date.to_naive().ok_or_else(invalid)?.and_time(NaiveTime::MIN);
            Ok(localize(naive, zone)?)
        }
        DateTimeValue::DateTime(dt) => {
            let naive = dt.to_naive().ok_or_else(invalid)?;
            if dt.is_utc() {
                return Ok(Utc.from_utc_datetime(&naive).with_timezone(&zone));
            }
            let own = dt
                .tzid()
                .and_then(|tzid| {
                    resolver
                        .resolve(tzid)
                        .inspect_err(|err| tracing::warn!(%err, "Reading time in series zone"))
                        .ok()
                })
                .unwrap_or(zone);
            Ok(localize(naive, own)?.with_timezone(&zone))
        }
    }
}

/// Gathers every value of a date-list property, `None` if the property is
/// absent.
fn collect_dates(
    event: &Component,
    name: &str,
    zone: Tz,
    resolver: &mut TimeZoneResolver,
) -> ServiceResult<Option<DateSetIterator>> {
    let properties = event.get_properties(name);
    if properties.is_empty() {
        return Ok(None);
    }
    let dates = properties
        .iter()
        .flat_map(|property| property.as_date_list())
        .map(|value| anchor(&value, zone, resolver))
        .collect::<ServiceResult<Vec<_>>>()?;
    Ok(Some(DateSetIterator::new(dates, zone)))
}

/// Adds an iCalendar duration: weeks and days move the wall clock, the time
/// part is exact.
fn add_duration(start: DateTime<Tz>, duration: &Duration) -> ServiceResult<DateTime<Tz>> {
    let sign = if duration.negative { -1 } else { 1 };
    let days = sign * (i64::from(duration.weeks) * 7 + i64::from(duration.days));
    let seconds = sign
        * (i64::from(duration.hours) * 3600
            + i64::from(duration.minutes) * 60
            + i64::from(duration.seconds));

    let overflow = || ServiceError::InvalidArgument(format!("duration {duration} out of range"));
    let naive = TimeDelta::try_days(days)
        .and_then(|delta| start.naive_local().checked_add_signed(delta))
        .ok_or_else(overflow)?;
    let shifted = localize(naive, start.timezone())?;
    TimeDelta::try_seconds(seconds)
        .and_then(|delta| shifted.checked_add_signed(delta))
        .ok_or_else(overflow)
}

/// `1` → `First`, `-1` → `Last`, `-2` → `Second Last`.
fn position_name(position: i16) -> String {
    let ordinal = usize::from(position.unsigned_abs())
        .checked_sub(1)
        .and_then(|index| ORDINAL_NAMES.get(index));
    match (position, ordinal) {
        (-1, _) => "Last".to_string(),
        (1.., Some(name)) => (*name).to_string(),
        (_, Some(name)) => format!("{name} Last"),
        (_, None) => position.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UID: &str = "96a0e6b1-d886-4a55-a60d-152b31401dcc";

    fn calendar(vtimezone: bool, event_lines: &[&str]) -> String {
        let mut out = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//Test//EN\r\n");
        if vtimezone {
            out.push_str("BEGIN:VTIMEZONE\r\nTZID:America/Toronto\r\nEND:VTIMEZONE\r\n");
        }
        out.push_str("BEGIN:VEVENT\r\n");
        out.push_str(&format!("UID:{UID}\r\n"));
        for line in event_lines {
            out.push_str(line);
            out.push_str("\r\n");
        }
        out.push_str("SUMMARY:Test Recurrence Event\r\n");
        out.push_str("ORGANIZER;CN=Organizer:mailto:organizer@testing.com\r\n");
        out.push_str("END:VEVENT\r\nEND:VCALENDAR\r\n");
        out
    }

    /// One-hour event in Toronto plus extra properties.
    fn toronto_event(extra: &[&str]) -> String {
        let mut lines = vec![
            "DTSTART;TZID=America/Toronto:20240701T080000",
            "DTEND;TZID=America/Toronto:20240701T090000",
        ];
        lines.extend_from_slice(extra);
        calendar(false, &lines)
    }

    fn expander(text: &str) -> EventExpander {
        EventExpander::new(EventSource::Text(text, UID), &ExpanderOptions::default()).unwrap()
    }

    fn at(tz: Tz, y: i32, m: u32, d: u32, h: u32) -> DateTime<Tz> {
        tz.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn toronto(y: i32, m: u32, d: u32, h: u32) -> DateTime<Tz> {
        at(Tz::America__Toronto, y, m, d, h)
    }

    #[test_log::test]
    fn constructs_from_text_calendar_and_event() {
        let text = toronto_event(&[]);
        let ical = parse(&text).unwrap();

        let from_text = expander(&text);
        let from_calendar =
            EventExpander::new(EventSource::Calendar(&ical, UID), &ExpanderOptions::default())
                .unwrap();
        let from_event =
            EventExpander::new(EventSource::Event(ical.events()[0]), &ExpanderOptions::default())
                .unwrap();

        for er in [from_text, from_calendar, from_event] {
            assert_eq!(er.start_date_time(), toronto(2024, 7, 1, 8));
            assert_eq!(er.uid(), Some(UID));
        }
    }

    #[test]
    fn unknown_uid_is_an_invalid_argument() {
        let text = toronto_event(&[]);
        let err = EventExpander::new(EventSource::Text(&text, "nope"), &ExpanderOptions::default())
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));

        let err = EventExpander::new(EventSource::Instances(&[]), &ExpanderOptions::default())
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }

    #[test]
    fn zones_follow_the_fallback_chain() {
        // DTSTART and DTEND in the same zone
        let er = expander(&toronto_event(&[]));
        assert_eq!(er.start_time_zone(), Tz::America__Toronto);
        assert_eq!(er.end_time_zone(), Tz::America__Toronto);
        assert_eq!(er.end_date_time(), toronto(2024, 7, 1, 9));
        assert!(!er.entire_day());

        // DTEND in a different zone
        let er = expander(&calendar(
            false,
            &[
                "DTSTART;TZID=America/Toronto:20240701T080000",
                "DTEND;TZID=America/Vancouver:20240701T090000",
            ],
        ));
        assert_eq!(er.end_time_zone(), Tz::America__Vancouver);
        assert_eq!(er.end_date_time(), at(Tz::America__Vancouver, 2024, 7, 1, 9));

        // zone taken from the calendar's VTIMEZONE
        let er = expander(&calendar(
            true,
            &["DTSTART:20240701T080000", "DTEND:20240701T090000"],
        ));
        assert_eq!(er.start_time_zone(), Tz::America__Toronto);
        assert_eq!(er.end_date_time(), toronto(2024, 7, 1, 9));

        // no zone anywhere
        let er = expander(&calendar(
            false,
            &["DTSTART:20240701T080000", "DTEND:20240701T090000"],
        ));
        assert_eq!(er.start_time_zone(), Tz::UTC);
        assert_eq!(er.start_date_time(), at(Tz::UTC, 2024, 7, 1, 8));

        // Windows zone name
        let er = expander(&calendar(
            false,
            &[
                "DTSTART;TZID=Eastern Standard Time:20240701T080000",
                "DTEND;TZID=Eastern Standard Time:20240701T090000",
            ],
        ));
        assert_eq!(er.start_time_zone(), Tz::America__New_York);
        assert_eq!(er.start_date_time(), toronto(2024, 7, 1, 8));
    }

    #[test]
    fn explicit_zone_wins() {
        let options = ExpanderOptions::default().with_zone(Tz::Europe__Paris);
        let text = toronto_event(&[]);
        let er = EventExpander::new(EventSource::Text(&text, UID), &options).unwrap();
        assert_eq!(er.start_time_zone(), Tz::Europe__Paris);
        assert_eq!(er.start_date_time(), toronto(2024, 7, 1, 8));
    }

    #[test]
    fn all_day_events_span_whole_days() {
        let er = expander(&calendar(true, &["DTSTART;VALUE=DATE:20240701", "DTEND;VALUE=DATE:20240702"]));
        assert!(er.entire_day());
        assert_eq!(er.start_date_time(), toronto(2024, 7, 1, 0));
        assert_eq!(er.end_date_time(), toronto(2024, 7, 2, 0));

        let er = expander(&calendar(true, &["DTSTART;VALUE=DATE:20240701", "DTEND;VALUE=DATE:20240706"]));
        assert_eq!(er.end_date_time(), toronto(2024, 7, 6, 0));
        assert_eq!(er.duration(), TimeDelta::days(5));
    }

    #[test]
    fn missing_end_uses_duration_then_floating_day_then_zero() {
        let er = expander(&calendar(
            false,
            &["DTSTART:20240101T100000Z", "DURATION:PT1H30M"],
        ));
        assert_eq!(er.duration(), TimeDelta::minutes(90));

        let er = expander(&calendar(false, &["DTSTART;VALUE=DATE:20240101"]));
        assert!(er.entire_day());
        assert_eq!(er.duration(), TimeDelta::hours(24));

        let er = expander(&calendar(false, &["DTSTART:20240101T100000Z"]));
        assert!(!er.entire_day());
        assert_eq!(er.end_date_time(), at(Tz::UTC, 2024, 1, 1, 10));
        assert_eq!(er.duration(), TimeDelta::zero());
    }

    #[test]
    fn recurrence_shape_queries() {
        let er = expander(&toronto_event(&[]));
        assert!(!er.recurs());
        assert_eq!(er.recurring_pattern(), None);
        assert_eq!(er.recurring_precision(), None);
        assert_eq!(er.recurring_interval(), None);
        assert!(!er.recurring_concludes());
        assert_eq!(er.recurring_concludes_after(), None);

        let er = expander(&toronto_event(&["RRULE:FREQ=WEEKLY;COUNT=6;BYDAY=MO,WE,FR"]));
        assert!(er.recurs());
        assert_eq!(er.recurring_pattern(), Some(RecurrencePattern::Absolute));
        assert_eq!(er.recurring_precision(), Some(RecurrencePrecision::Weekly));
        assert!(er.recurring_concludes());
        assert_eq!(er.recurring_concludes_after(), Some(6));

        let er = expander(&toronto_event(&["RRULE:FREQ=MONTHLY;BYDAY=MO;BYSETPOS=1"]));
        assert_eq!(er.recurring_pattern(), Some(RecurrencePattern::Relative));
        assert_eq!(er.recurring_precision().map(RecurrencePrecision::as_str), Some("monthly"));
        assert!(!er.recurring_concludes());

        let er = expander(&toronto_event(&["RRULE:FREQ=DAILY;INTERVAL=2"]));
        assert_eq!(er.recurring_interval(), Some(2));

        let er = expander(&toronto_event(&["RDATE;VALUE=DATE:20240703,20240705"]));
        assert!(er.recurs());
        assert_eq!(er.recurring_pattern(), Some(RecurrencePattern::Absolute));
        assert_eq!(er.recurring_precision(), Some(RecurrencePrecision::Fixed));
        assert_eq!(er.recurring_interval(), None);
        assert!(er.recurring_concludes());
        assert_eq!(er.recurring_concludes_after(), Some(2));
    }

    #[test]
    fn concludes_after_sums_count_and_rdates() {
        let er = expander(&toronto_event(&[
            "RRULE:FREQ=WEEKLY;COUNT=6;BYDAY=MO,WE,FR",
            "RDATE;VALUE=DATE:20240706,20240715",
        ]));
        assert_eq!(er.recurring_concludes_after(), Some(8));

        let er = expander(&toronto_event(&[
            "RDATE;VALUE=DATE:20240703",
            "RDATE;VALUE=DATE:20240705",
        ]));
        assert_eq!(er.recurring_concludes_after(), Some(2));
    }

    #[test]
    fn endless_rule_with_rdates_counts_the_dates() {
        let er = expander(&toronto_event(&[
            "RRULE:FREQ=WEEKLY;BYDAY=MO,WE,FR",
            "RDATE;VALUE=DATE:20240706,20240715",
        ]));
        assert!(er.recurring_concludes());
        assert_eq!(er.recurring_concludes_after(), Some(2));
        assert_eq!(er.recurring_concludes_on(), Some(toronto(2024, 7, 15, 0)));

        let er = expander(&toronto_event(&[
            "RRULE:FREQ=WEEKLY;UNTIL=20240712T120000Z;BYDAY=MO,WE,FR",
            "RDATE;VALUE=DATE:20240706",
        ]));
        assert!(er.recurring_concludes());
        assert_eq!(er.recurring_concludes_after(), Some(1));
        assert_eq!(er.recurring_concludes_on(), Some(toronto(2024, 7, 12, 8)));
    }

    #[test]
    fn concludes_on_takes_the_later_source() {
        let er = expander(&toronto_event(&["RRULE:FREQ=WEEKLY;BYDAY=MO,WE,FR"]));
        assert_eq!(er.recurring_concludes_on(), None);

        let er = expander(&toronto_event(&["RDATE;VALUE=DATE:20240703,20240705"]));
        assert_eq!(er.recurring_concludes_on(), Some(toronto(2024, 7, 5, 0)));

        let er = expander(&toronto_event(&[
            "RRULE:FREQ=WEEKLY;COUNT=6;BYDAY=MO,WE,FR",
            "RDATE;VALUE=DATE:20240706,20240715",
        ]));
        assert_eq!(er.recurring_concludes_on(), Some(toronto(2024, 7, 15, 0)));

        let mut er = expander(&toronto_event(&[
            "RRULE:FREQ=WEEKLY;COUNT=7;BYDAY=MO,WE,FR",
            "RDATE;VALUE=DATE:20240706,20240713",
        ]));
        er.recurrence_advance();
        assert_eq!(er.recurring_concludes_on(), Some(toronto(2024, 7, 15, 8)));
        assert_eq!(er.recurrence_date(), Some(toronto(2024, 7, 3, 8)));
    }

    #[test]
    fn named_accessors() {
        let er = expander(&toronto_event(&["RRULE:FREQ=WEEKLY;BYDAY=MO,WE,FR"]));
        assert_eq!(er.recurring_days_of_week(), vec!["MO", "WE", "FR"]);
        assert_eq!(
            er.recurring_days_of_week_named(),
            vec!["Monday", "Wednesday", "Friday"]
        );

        let er = expander(&toronto_event(&["RRULE:FREQ=MONTHLY;BYMONTHDAY=6,13,20,27"]));
        assert_eq!(er.recurring_days_of_month(), &[6, 13, 20, 27]);

        let er = expander(&toronto_event(&["RRULE:FREQ=YEARLY;BYYEARDAY=1,30,180,365"]));
        assert_eq!(er.recurring_days_of_year(), &[1, 30, 180, 365]);

        let er = expander(&toronto_event(&["RRULE:FREQ=YEARLY;BYWEEKNO=35,42"]));
        assert_eq!(er.recurring_weeks_of_year(), &[35, 42]);

        let er = expander(&toronto_event(&["RRULE:FREQ=YEARLY;BYMONTH=7"]));
        assert_eq!(er.recurring_months_of_year(), &[7]);
        assert_eq!(er.recurring_months_of_year_named(), vec!["July"]);

        let er = expander(&toronto_event(&["RRULE:FREQ=MONTHLY;BYDAY=MO;BYSETPOS=1,-2"]));
        assert_eq!(er.recurring_relative_position(), &[1, -2]);
        assert_eq!(
            er.recurring_relative_position_named(),
            vec!["First", "Second Last"]
        );

        let er = expander(&toronto_event(&[]));
        assert!(er.recurring_days_of_week().is_empty());
        assert!(er.recurring_months_of_year_named().is_empty());
    }

    #[test]
    fn position_names() {
        assert_eq!(position_name(1), "First");
        assert_eq!(position_name(5), "Fifth");
        assert_eq!(position_name(-1), "Last");
        assert_eq!(position_name(-3), "Third Last");
        assert_eq!(position_name(7), "7");
    }

    fn walk(er: &mut EventExpander, limit: usize) -> Vec<DateTime<Tz>> {
        let mut out = Vec::new();
        while let Some(date) = er.recurrence_date() {
            if out.len() == limit {
                break;
            }
            out.push(date);
            er.recurrence_advance();
        }
        out
    }

    #[test_log::test]
    fn iterates_daily_with_interval_and_until() {
        let mut er = expander(&toronto_event(&[
            "RRULE:FREQ=DAILY;INTERVAL=3;UNTIL=20240714T040000Z",
        ]));
        assert_eq!(
            walk(&mut er, 100),
            vec![
                toronto(2024, 7, 1, 8),
                toronto(2024, 7, 4, 8),
                toronto(2024, 7, 7, 8),
                toronto(2024, 7, 10, 8),
                toronto(2024, 7, 13, 8),
            ]
        );
        assert_eq!(er.recurrence_date(), None);

        er.recurrence_rewind();
        assert_eq!(er.recurrence_date(), Some(toronto(2024, 7, 1, 8)));
        er.recurrence_advance_to(&Utc.with_ymd_and_hms(2024, 7, 9, 8, 0, 0).unwrap());
        assert_eq!(er.recurrence_date(), Some(toronto(2024, 7, 10, 8)));
    }

    #[test]
    fn iterates_relative_monthly_rule() {
        let mut er = expander(&toronto_event(&["RRULE:FREQ=MONTHLY;COUNT=3;BYDAY=MO;BYSETPOS=1"]));
        assert_eq!(
            walk(&mut er, 100),
            vec![
                toronto(2024, 7, 1, 8),
                toronto(2024, 8, 5, 8),
                toronto(2024, 9, 2, 8),
            ]
        );
        er.recurrence_rewind();
        er.recurrence_advance_to(&Utc.with_ymd_and_hms(2024, 8, 9, 8, 0, 0).unwrap());
        assert_eq!(er.recurrence_date(), Some(toronto(2024, 9, 2, 8)));
    }

    #[test]
    fn iterates_fixed_dates_after_the_start() {
        let mut er = expander(&toronto_event(&[
            "RDATE;TZID=America/Toronto:20240703T080000,20240905T080000,20241231T080000",
        ]));
        assert_eq!(
            walk(&mut er, 100),
            vec![
                toronto(2024, 7, 1, 8),
                toronto(2024, 7, 3, 8),
                toronto(2024, 9, 5, 8),
                toronto(2024, 12, 31, 8),
            ]
        );
        er.recurrence_rewind();
        er.recurrence_advance_to(&Utc.with_ymd_and_hms(2024, 8, 9, 8, 0, 0).unwrap());
        assert_eq!(er.recurrence_date(), Some(toronto(2024, 9, 5, 8)));
    }

    #[test]
    fn rule_and_dates_merge_in_order() {
        let mut er = expander(&toronto_event(&[
            "RRULE:FREQ=WEEKLY;COUNT=3;BYDAY=MO",
            "RDATE;TZID=America/Toronto:20240703T080000,20240708T080000",
        ]));
        assert_eq!(
            walk(&mut er, 100),
            vec![
                toronto(2024, 7, 1, 8),
                toronto(2024, 7, 3, 8),
                toronto(2024, 7, 8, 8),
                toronto(2024, 7, 15, 8),
            ]
        );
    }

    #[test_log::test]
    fn exdate_removes_an_occurrence() {
        let mut er = expander(&toronto_event(&[
            "RRULE:FREQ=DAILY",
            "EXDATE;TZID=America/Toronto:20240703T080000",
        ]));
        assert_eq!(
            walk(&mut er, 3),
            vec![
                toronto(2024, 7, 1, 8),
                toronto(2024, 7, 2, 8),
                toronto(2024, 7, 4, 8),
            ]
        );
    }

    #[test]
    fn exrule_and_excluded_start() {
        let mut er = expander(&toronto_event(&[
            "RRULE:FREQ=DAILY;COUNT=7",
            "EXRULE:FREQ=WEEKLY;BYDAY=SA,SU",
        ]));
        assert_eq!(
            walk(&mut er, 100),
            vec![
                toronto(2024, 7, 1, 8),
                toronto(2024, 7, 2, 8),
                toronto(2024, 7, 3, 8),
                toronto(2024, 7, 4, 8),
                toronto(2024, 7, 5, 8),
            ]
        );

        let mut er = expander(&toronto_event(&[
            "RRULE:FREQ=DAILY;COUNT=3",
            "EXDATE;TZID=America/Toronto:20240701T080000",
        ]));
        assert_eq!(er.recurrence_date(), Some(toronto(2024, 7, 2, 8)));
        assert_eq!(walk(&mut er, 100).len(), 2);
    }

    #[test]
    fn rewind_is_idempotent() {
        let mut er = expander(&toronto_event(&["RRULE:FREQ=WEEKLY;BYDAY=MO,WE,FR"]));
        let advance = |er: &mut EventExpander, k: usize| {
            er.recurrence_rewind();
            for _ in 0..k {
                er.recurrence_advance();
            }
            er.recurrence_date()
        };
        let first = advance(&mut er, 5);
        for _ in 0..17 {
            er.recurrence_advance();
        }
        assert_eq!(advance(&mut er, 5), first);
        assert_eq!(advance(&mut er, 5), first);
        assert_eq!(first, Some(toronto(2024, 7, 12, 8)));

        er.recurrence_rewind();
        let before = walk(&mut er, 12);
        er.recurrence_rewind();
        assert_eq!(walk(&mut er, 12), before);
        assert_eq!(before.len(), 12);
        assert_eq!(before[1], toronto(2024, 7, 3, 8));
    }

    #[test]
    fn rewind_skips_an_excluded_start() {
        let mut er = expander(&toronto_event(&[
            "RRULE:FREQ=DAILY;COUNT=4",
            "EXDATE;TZID=America/Toronto:20240701T080000",
        ]));
        assert_eq!(er.recurrence_date(), Some(toronto(2024, 7, 2, 8)));
        er.recurrence_advance_to(&toronto(2024, 7, 4, 8));
        assert_eq!(er.recurrence_date(), Some(toronto(2024, 7, 4, 8)));

        er.recurrence_rewind();
        assert_eq!(er.recurrence_date(), Some(toronto(2024, 7, 2, 8)));
        assert_eq!(walk(&mut er, 10).len(), 3);
    }

    #[test_log::test]
    fn endless_series_from_long_ago_reaches_today() {
        let text = calendar(false, &["DTSTART:19900101T090000Z", "RRULE:FREQ=DAILY"]);
        let mut er = expander(&text);
        let target = at(Tz::UTC, 2024, 7, 1, 9);

        er.recurrence_advance_to(&target);
        assert_eq!(er.recurrence_date(), Some(target));
        assert!(!er.recurring_concludes());

        let week = er.occurrences_between(&target, &(target + TimeDelta::days(7)), 100);
        assert_eq!(week.len(), 7);
        assert_eq!(week[6], at(Tz::UTC, 2024, 7, 7, 9));
    }

    #[test]
    fn overrides_are_indexed_by_recurrence_id() {
        let text = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\nUID:series\r\nRECURRENCE-ID;TZID=America/Toronto:20240703T080000\r\n\
DTSTART;TZID=America/Toronto:20240703T100000\r\nSUMMARY:Moved\r\nEND:VEVENT\r\n\
BEGIN:VEVENT\r\nUID:series\r\nDTSTART;TZID=America/Toronto:20240701T080000\r\n\
RRULE:FREQ=DAILY;COUNT=5\r\nSUMMARY:Daily\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";

        let mut er =
            EventExpander::new(EventSource::Text(text, "series"), &ExpanderOptions::default())
                .unwrap();
        assert_eq!(er.base_event().summary(), Some("Daily"));
        assert_eq!(er.recurrence_instances().count(), 1);

        er.recurrence_advance();
        er.recurrence_advance();
        let third = er.recurrence_date().unwrap();
        assert_eq!(third, toronto(2024, 7, 3, 8));
        assert_eq!(
            er.recurrence_instance(&third).and_then(Component::summary),
            Some("Moved")
        );
        assert!(er.recurrence_instance(&toronto(2024, 7, 2, 8)).is_none());
    }

    #[test]
    fn first_instance_is_promoted_without_master() {
        let text = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\nUID:series\r\nRECURRENCE-ID:20240703T080000Z\r\n\
DTSTART:20240703T100000Z\r\nSUMMARY:First\r\nEND:VEVENT\r\n\
BEGIN:VEVENT\r\nUID:series\r\nRECURRENCE-ID:20240704T080000Z\r\n\
DTSTART:20240704T100000Z\r\nSUMMARY:Second\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";

        let er = EventExpander::new(EventSource::Text(text, "series"), &ExpanderOptions::default())
            .unwrap();
        assert_eq!(er.base_event().summary(), Some("First"));
        assert_eq!(er.recurrence_instances().count(), 1);
    }

    #[test]
    fn occurrences_between_leaves_the_cursor_alone() {
        let mut er = expander(&toronto_event(&["RRULE:FREQ=DAILY"]));
        er.recurrence_advance();
        let found = er.occurrences_between(
            &toronto(2024, 7, 10, 0),
            &toronto(2024, 7, 20, 0),
            3,
        );
        assert_eq!(
            found,
            vec![
                toronto(2024, 7, 10, 8),
                toronto(2024, 7, 11, 8),
                toronto(2024, 7, 12, 8),
            ]
        );
        assert_eq!(er.recurrence_date(), Some(toronto(2024, 7, 2, 8)));
    }

    #[test]
    fn options_from_config() {
        let config = ExpansionConfig {
            default_timezone: "Europe/Kyiv".to_string(),
            max_occurrences: 50,
        };
        let options = ExpanderOptions::from_config(&config).unwrap();
        assert_eq!(options.default_zone, Tz::Europe__Kyiv);
        assert_eq!(options.max_occurrences, 50);
    }
}
