//! Iterator over an explicit list of dates (RDATE, EXDATE).

use chrono::DateTime;
use chrono_tz::Tz;

/// ## Summary
/// Forward iterator over a fixed, ascending set of dates.
///
/// Input dates are sorted and de-duplicated on construction and expressed
/// in the set's reference zone.
#[derive(Debug, Clone)]
pub struct DateSetIterator {
    dates: Vec<DateTime<Tz>>,
    zone: Tz,
    index: usize,
}

impl DateSetIterator {
    #[must_use]
    pub fn new(dates: impl IntoIterator<Item = DateTime<Tz>>, zone: Tz) -> Self {
        let mut dates: Vec<DateTime<Tz>> = dates
            .into_iter()
            .map(|date| date.with_timezone(&zone))
            .collect();
        dates.sort();
        dates.dedup();
        Self {
            dates,
            zone,
            index: 0,
        }
    }

    /// Number of dates in the set, `None` when it is empty.
    #[must_use]
    pub fn concludes_after(&self) -> Option<usize> {
        (!self.dates.is_empty()).then_some(self.dates.len())
    }

    /// Last date in the set.
    #[must_use]
    pub fn concludes_on(&self) -> Option<DateTime<Tz>> {
        self.dates.last().map(|date| date.with_timezone(&self.zone))
    }

    /// A finite list always ends on its last date.
    #[must_use]
    pub fn concludes(&self) -> Option<DateTime<Tz>> {
        self.concludes_on()
    }

    #[must_use]
    pub fn dates(&self) -> &[DateTime<Tz>] {
        &self.dates
    }

    #[must_use]
    pub fn current(&self) -> Option<DateTime<Tz>> {
        self.dates.get(self.index).copied()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.index < self.dates.len()
    }

    pub fn advance(&mut self) {
        if self.is_valid() {
            self.index += 1;
        }
    }

    pub fn rewind(&mut self) {
        self.index = 0;
    }

    /// Advances until the current date is strictly after `date`.
    pub fn advance_past(&mut self, date: &DateTime<Tz>) {
        while self.current().is_some_and(|current| current <= *date) {
            self.advance();
        }
    }

    /// Advances until the current date is at or after `date`.
    pub fn advance_to(&mut self, date: &DateTime<Tz>) {
        while self.current().is_some_and(|current| current < *date) {
            self.advance();
        }
    }
}
