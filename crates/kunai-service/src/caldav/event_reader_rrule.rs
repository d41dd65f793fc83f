//! Iterator over the occurrences produced by a recurrence rule.

use std::cell::OnceCell;

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;

use kunai_rfc::rfc::ical::core::{Frequency, RRule, RRuleUntil, WeekdayNum};
use kunai_rfc::rfc::ical::expand::localize;

use crate::error::{ServiceError, ServiceResult};

/// Number of occurrences generated on the first fill of the cache.
const INITIAL_WINDOW: u16 = 64;

/// Smallest window that still moves past the inclusive `after` bound.
const MIN_WINDOW: u16 = 2;

/// Cursor state: the current occurrence and its index from the start.
#[derive(Debug, Clone, Copy)]
struct RulePosition {
    current: Option<DateTime<Tz>>,
    index: usize,
}

/// ## Summary
/// Forward iterator over the occurrences of an RRULE or EXRULE.
///
/// An anchored iterator always yields DTSTART first. When the rule's pattern
/// does not produce DTSTART itself, it is prepended and still counts towards
/// COUNT.
///
/// Occurrences are generated by the `rrule` crate one window at a time,
/// resuming after the last generated date. A window holds at most
/// `max_occurrences` dates; the size bounds the work of one refill, not the
/// length of the series.
#[derive(Debug, Clone)]
pub struct RuleIterator {
    rule: RRule,
    frequency: Frequency,
    start: DateTime<Tz>,
    until: Option<DateTime<Tz>>,
    set: RRuleSet,
    /// Occurrences with indices `offset..offset + cache.len()`.
    cache: Vec<DateTime<Tz>>,
    offset: usize,
    window: u16,
    last_generated: Option<DateTime<Tz>>,
    exhausted: bool,
    max_occurrences: u16,
    anchored: bool,
    position: RulePosition,
    conclusion: OnceCell<Option<DateTime<Tz>>>,
}

impl RuleIterator {
    /// ## Summary
    /// Builds an iterator for `rule` anchored at `start`.
    ///
    /// ## Errors
    /// Returns `ServiceError::RRuleError` if the rule has no frequency, its
    /// UNTIL is not a real date, or the `rrule` crate rejects it.
    pub fn new(rule: &RRule, start: DateTime<Tz>, max_occurrences: u16) -> ServiceResult<Self> {
        Self::build(rule, start, max_occurrences, true)
    }

    /// ## Summary
    /// Builds an iterator that yields only what the rule's pattern selects,
    /// without forcing `start` in as the first occurrence. Used for EXRULE.
    ///
    /// ## Errors
    /// Same as [`RuleIterator::new`].
    pub fn unanchored(
        rule: &RRule,
        start: DateTime<Tz>,
        max_occurrences: u16,
    ) -> ServiceResult<Self> {
        Self::build(rule, start, max_occurrences, false)
    }

    fn build(
        rule: &RRule,
        start: DateTime<Tz>,
        max_occurrences: u16,
        anchored: bool,
    ) -> ServiceResult<Self> {
        let frequency = rule
            .freq
            .ok_or_else(|| ServiceError::RRuleError("rule has no FREQ".to_string()))?;

        let text = format!(
            "{}\nRRULE:{}",
            dtstart_line(&start),
            rule.without_termination()
        );
        let set = text
            .parse::<RRuleSet>()
            .map_err(|err| ServiceError::RRuleError(format!("{rule}: {err}")))?;

        let until = rule
            .until
            .as_ref()
            .map(|until| until_in_zone(until, &start))
            .transpose()?;

        let mut iter = Self {
            rule: rule.clone(),
            frequency,
            start,
            until,
            set,
            cache: Vec::new(),
            offset: 0,
            window: 0,
            last_generated: None,
            exhausted: false,
            max_occurrences: max_occurrences.max(MIN_WINDOW),
            anchored,
            position: RulePosition {
                current: None,
                index: 0,
            },
            conclusion: OnceCell::new(),
        };
        iter.rewind();
        Ok(iter)
    }

    /// Frequency of the rule.
    #[must_use]
    pub const fn precision(&self) -> Frequency {
        self.frequency
    }

    /// Step between recurrences, 1 when INTERVAL is absent.
    #[must_use]
    pub fn interval(&self) -> u32 {
        self.rule.effective_interval()
    }

    /// UNTIL, anchored in the zone of the start date.
    #[must_use]
    pub const fn concludes_on(&self) -> Option<DateTime<Tz>> {
        self.until
    }

    /// COUNT, if set.
    #[must_use]
    pub const fn concludes_after(&self) -> Option<u32> {
        self.rule.count
    }

    /// ## Summary
    /// Returns the last occurrence of the rule, or `None` for an endless rule.
    ///
    /// With UNTIL this is UNTIL itself. With COUNT a copy of the cursor is
    /// walked to the COUNT-th occurrence counted from the start; the result
    /// is computed once and the caller's position is never touched.
    #[must_use]
    pub fn concludes(&self) -> Option<DateTime<Tz>> {
        if self.until.is_some() {
            return self.until;
        }
        let count = self.rule.count?;
        *self.conclusion.get_or_init(|| self.occurrence_at(count))
    }

    /// The `count`-th occurrence, or the final one if the rule produces
    /// fewer.
    fn occurrence_at(&self, count: u32) -> Option<DateTime<Tz>> {
        let index = usize::try_from(count.saturating_sub(1)).unwrap_or(usize::MAX);
        let mut scratch = self.clone();
        scratch.load(index);
        let last = scratch.position.current.or(scratch.last_generated);
        tracing::trace!(count, last = ?last, "Resolved COUNT conclusion");
        last
    }

    /// True if the rule selects by position within the set (BYSETPOS).
    #[must_use]
    pub fn is_relative(&self) -> bool {
        !self.rule.by_setpos.is_empty()
    }

    #[must_use]
    pub fn relative_position(&self) -> &[i16] {
        &self.rule.by_setpos
    }

    #[must_use]
    pub fn days_of_week(&self) -> &[WeekdayNum] {
        &self.rule.by_day
    }

    #[must_use]
    pub fn days_of_month(&self) -> &[i8] {
        &self.rule.by_monthday
    }

    #[must_use]
    pub fn days_of_year(&self) -> &[i16] {
        &self.rule.by_yearday
    }

    #[must_use]
    pub fn weeks_of_year(&self) -> &[i8] {
        &self.rule.by_weekno
    }

    #[must_use]
    pub fn months_of_year(&self) -> &[u8] {
        &self.rule.by_month
    }

    /// Current occurrence, `None` once the rule is exhausted.
    #[must_use]
    pub const fn current(&self) -> Option<DateTime<Tz>> {
        self.position.current
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.position.current.is_some()
    }

    /// Moves to the next occurrence.
    pub fn advance(&mut self) {
        if self.position.current.is_none() {
            return;
        }
        self.load(self.position.index + 1);
    }

    /// Returns to the first occurrence.
    pub fn rewind(&mut self) {
        self.load(0);
    }

    /// Advances until the current occurrence is strictly after `date`.
    pub fn advance_past(&mut self, date: &DateTime<Tz>) {
        while self.position.current.is_some_and(|current| current <= *date) {
            self.advance();
        }
    }

    /// Advances until the current occurrence is at or after `date`.
    pub fn advance_to(&mut self, date: &DateTime<Tz>) {
        while self.position.current.is_some_and(|current| current < *date) {
            self.advance();
        }
    }

    fn load(&mut self, index: usize) {
        if index < self.offset {
            self.reset_cache();
        }
        self.fill(index);
        self.position = RulePosition {
            current: index
                .checked_sub(self.offset)
                .and_then(|local| self.cache.get(local))
                .copied(),
            index,
        };
    }

    fn reset_cache(&mut self) {
        self.cache.clear();
        self.offset = 0;
        self.window = 0;
        self.last_generated = None;
        self.exhausted = false;
    }

    /// Generates windows after the last generated date until the cache
    /// covers `index` or the rule has nothing more to give. Each new window
    /// replaces the previous one.
    fn fill(&mut self, index: usize) {
        while self.offset + self.cache.len() <= index && !self.exhausted {
            let window = if self.window == 0 {
                INITIAL_WINDOW
            } else {
                self.window.saturating_mul(2)
            }
            .clamp(MIN_WINDOW, self.max_occurrences);
            self.window = window;

            let tz = self.start.timezone();
            let set = match self.last_generated {
                Some(last) => self
                    .set
                    .clone()
                    .after(last.with_timezone(&rrule::Tz::from(tz))),
                None => self.set.clone(),
            };
            let result = set.all(window);
            let generated = result.dates.len();

            let mut dates: Vec<DateTime<Tz>> = Vec::with_capacity(generated + 1);
            if self.anchored
                && self.last_generated.is_none()
                && result
                    .dates
                    .first()
                    .is_none_or(|first| first.with_timezone(&tz) != self.start)
            {
                dates.push(self.start);
            }
            let last_generated = self.last_generated;
            dates.extend(
                result
                    .dates
                    .iter()
                    .map(|date| date.with_timezone(&tz))
                    .filter(|date| last_generated.is_none_or(|last| *date > last)),
            );

            let mut passed_until = false;
            if let Some(until) = self.until {
                let kept = dates.partition_point(|date| *date <= until);
                passed_until = kept < dates.len();
                dates.truncate(kept);
            }

            let first_index = self.offset + self.cache.len();
            let mut reached_count = false;
            if let Some(count) = self.rule.count {
                let remaining = usize::try_from(count)
                    .unwrap_or(usize::MAX)
                    .saturating_sub(first_index);
                reached_count = dates.len() >= remaining;
                dates.truncate(remaining);
            }

            let stalled = dates.is_empty() && result.limited && !passed_until && !reached_count;
            if stalled {
                tracing::warn!(rule = %self.rule, "Rule expansion made no progress");
            }

            tracing::trace!(window, generated, first_index, kept = dates.len(), "Filled rule window");
            if let Some(last) = dates.last() {
                self.last_generated = Some(*last);
            }
            self.offset = first_index;
            self.cache = dates;
            self.exhausted = !result.limited || passed_until || reached_count || stalled;
        }
    }
}

/// DTSTART line understood by the `rrule` crate.
fn dtstart_line(start: &DateTime<Tz>) -> String {
    let stamp = start.format("%Y%m%dT%H%M%S");
    if start.timezone() == Tz::UTC {
        format!("DTSTART:{stamp}Z")
    } else {
        format!("DTSTART;TZID={}:{stamp}", start.timezone().name())
    }
}

/// Anchors UNTIL in the start zone. A DATE bound takes the start's time of
/// day so that an occurrence on that date is still included.
fn until_in_zone(until: &RRuleUntil, start: &DateTime<Tz>) -> ServiceResult<DateTime<Tz>> {
    let tz = start.timezone();
    let invalid = || ServiceError::RRuleError(format!("invalid UNTIL {until}"));

    match until {
        RRuleUntil::Date(date) => {
            let naive = date.to_naive().ok_or_else(invalid)?.and_time(start.time());
            Ok(localize(naive, tz)?)
        }
        RRuleUntil::DateTime(dt) if dt.is_utc() => {
            let naive = dt.to_naive().ok_or_else(invalid)?;
            Ok(Utc.from_utc_datetime(&naive).with_timezone(&tz))
        }
        RRuleUntil::DateTime(dt) => Ok(localize(dt.to_naive().ok_or_else(invalid)?, tz)?),
    }
}
