//! Recurrence rules -- a closed set of rule variants and the lazy date
//! iterator that drives occurrence expansion.
//!
//! A rule is an immutable value. It is built (and rebuilt) through
//! [`RuleBuilder`], which validates every field, and applied with
//! [`RecurrenceRule::apply`], which returns a fresh [`Recurrences`] iterator
//! each time it is called.
//!
//! # Termination
//!
//! Iteration stops at the first of: `count` candidates examined, `until`
//! exceeded, or the caller's `enddate` exceeded. Exception dates are
//! candidates too: they consume a `count` slot even though they are not
//! yielded, so a rule with `count = 4` and one exception yields three dates.
//! A rule without `count`/`until` applied without an `enddate` never ends.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::period::Timed;

/// Interval and termination fields shared by every repeating variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "BoundsFields")]
pub struct RuleBounds {
    interval: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    until: Option<NaiveDate>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    exceptions: BTreeSet<NaiveDate>,
}

#[derive(Deserialize)]
struct BoundsFields {
    #[serde(default = "default_interval")]
    interval: u32,
    #[serde(default)]
    count: Option<u32>,
    #[serde(default)]
    until: Option<NaiveDate>,
    #[serde(default)]
    exceptions: BTreeSet<NaiveDate>,
}

fn default_interval() -> u32 {
    1
}

impl TryFrom<BoundsFields> for RuleBounds {
    type Error = EngineError;

    fn try_from(fields: BoundsFields) -> Result<Self> {
        Self::new(fields.interval, fields.count, fields.until, fields.exceptions)
    }
}

impl RuleBounds {
    /// Validate and assemble the shared rule fields.
    ///
    /// # Errors
    /// [`EngineError::InvalidInterval`] if `interval` is zero,
    /// [`EngineError::CountAndUntil`] if both terminations are given.
    pub fn new(
        interval: u32,
        count: Option<u32>,
        until: Option<NaiveDate>,
        exceptions: impl IntoIterator<Item = NaiveDate>,
    ) -> Result<Self> {
        if count.is_some() && until.is_some() {
            return Err(EngineError::CountAndUntil);
        }
        if interval < 1 {
            return Err(EngineError::InvalidInterval(interval));
        }
        Ok(Self {
            interval,
            count,
            until,
            exceptions: exceptions.into_iter().collect(),
        })
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn count(&self) -> Option<u32> {
        self.count
    }

    pub fn until(&self) -> Option<NaiveDate> {
        self.until
    }

    pub fn exceptions(&self) -> &BTreeSet<NaiveDate> {
        &self.exceptions
    }
}

impl Default for RuleBounds {
    fn default() -> Self {
        Self {
            interval: 1,
            count: None,
            until: None,
            exceptions: BTreeSet::new(),
        }
    }
}

/// A set of weekdays, Monday = 0 through Sunday = 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: Self = Self(0);

    /// Build a set from weekday indexes.
    ///
    /// # Errors
    /// [`EngineError::InvalidWeekday`] for any index above 6.
    pub fn from_indexes(indexes: impl IntoIterator<Item = u8>) -> Result<Self> {
        let mut bits = 0u8;
        for index in indexes {
            if index > 6 {
                return Err(EngineError::InvalidWeekday(index));
            }
            bits |= 1 << index;
        }
        Ok(Self(bits))
    }

    #[must_use]
    pub fn with(self, weekday: Weekday) -> Self {
        Self(self.0 | 1 << weekday.num_days_from_monday())
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.0 & (1 << weekday.num_days_from_monday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn indexes(&self) -> impl Iterator<Item = u8> + '_ {
        let bits = self.0;
        (0u8..7).filter(move |i| bits & (1 << i) != 0)
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl TryFrom<Vec<u8>> for WeekdaySet {
    type Error = EngineError;

    fn try_from(indexes: Vec<u8>) -> Result<Self> {
        Self::from_indexes(indexes)
    }
}

impl From<WeekdaySet> for Vec<u8> {
    fn from(set: WeekdaySet) -> Self {
        set.indexes().collect()
    }
}

/// How a monthly rule picks its day in each target month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthlyMode {
    /// Same day of the month as the start date.
    #[default]
    MonthDay,
    /// Nth weekday of the month, N taken from the start date.
    Weekday,
    /// Nth weekday counted back from the end of the month.
    LastWeekday,
}

impl MonthlyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MonthDay => "monthday",
            Self::Weekday => "weekday",
            Self::LastWeekday => "lastweekday",
        }
    }
}

impl fmt::Display for MonthlyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MonthlyMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "monthday" => Ok(Self::MonthDay),
            "weekday" => Ok(Self::Weekday),
            "lastweekday" => Ok(Self::LastWeekday),
            other => Err(EngineError::UnsupportedMonthlyMode(other.to_string())),
        }
    }
}

/// A recurrence rule. Equality and hashing are structural over every field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "freq", rename_all = "lowercase")]
pub enum RecurrenceRule {
    /// Happens once, on the start date.
    None,
    Daily(RuleBounds),
    Weekly {
        #[serde(flatten)]
        bounds: RuleBounds,
        /// Extra weekdays; the start date's weekday is always included.
        #[serde(default)]
        weekdays: WeekdaySet,
    },
    Monthly {
        #[serde(flatten)]
        bounds: RuleBounds,
        #[serde(default)]
        mode: MonthlyMode,
    },
    Yearly(RuleBounds),
}

impl RecurrenceRule {
    /// The shared fields, absent for [`RecurrenceRule::None`].
    pub fn bounds(&self) -> Option<&RuleBounds> {
        match self {
            Self::None => None,
            Self::Daily(bounds) | Self::Yearly(bounds) => Some(bounds),
            Self::Weekly { bounds, .. } | Self::Monthly { bounds, .. } => Some(bounds),
        }
    }

    pub fn interval(&self) -> u32 {
        self.bounds().map_or(1, RuleBounds::interval)
    }

    pub fn count(&self) -> Option<u32> {
        self.bounds().and_then(RuleBounds::count)
    }

    pub fn until(&self) -> Option<NaiveDate> {
        self.bounds().and_then(RuleBounds::until)
    }

    pub fn exceptions(&self) -> Option<&BTreeSet<NaiveDate>> {
        self.bounds().map(RuleBounds::exceptions)
    }

    /// True when the rule repeats forever unless the caller bounds it.
    pub fn is_unbounded(&self) -> bool {
        self.bounds()
            .is_some_and(|b| b.count.is_none() && b.until.is_none())
    }

    /// Start a builder seeded with every field of this rule.
    ///
    /// Fields left untouched on the builder keep their current values:
    ///
    /// ```
    /// use occurrence_engine::RuleBuilder;
    ///
    /// let rule = RuleBuilder::daily().interval(2).count(10).build().unwrap();
    /// let wider = rule.replace().interval(3).build().unwrap();
    /// assert_eq!(wider.interval(), 3);
    /// assert_eq!(wider.count(), Some(10));
    /// ```
    pub fn replace(&self) -> RuleBuilder {
        let (kind, bounds) = match self {
            Self::None => (Kind::None, RuleBounds::default()),
            Self::Daily(bounds) => (Kind::Daily, bounds.clone()),
            Self::Yearly(bounds) => (Kind::Yearly, bounds.clone()),
            Self::Weekly { bounds, .. } => (Kind::Weekly, bounds.clone()),
            Self::Monthly { bounds, .. } => (Kind::Monthly, bounds.clone()),
        };
        let weekdays = match self {
            Self::Weekly { weekdays, .. } => weekdays.indexes().collect(),
            _ => Vec::new(),
        };
        let mode = match self {
            Self::Monthly { mode, .. } => *mode,
            _ => MonthlyMode::default(),
        };
        RuleBuilder {
            kind,
            interval: bounds.interval,
            count: bounds.count,
            until: bounds.until,
            exceptions: bounds.exceptions,
            exception_texts: Vec::new(),
            weekdays,
            mode,
            mode_text: None,
        }
    }

    /// Lazily generate the recurrence dates of `event`.
    ///
    /// Dates start at the event's start date (inclusive). `enddate` is an
    /// inclusive upper bound on the dates produced. Calling `apply` again
    /// restarts from the beginning.
    pub fn apply<T: Timed + ?Sized>(&self, event: &T, enddate: Option<NaiveDate>) -> Recurrences<'_> {
        Recurrences::new(self, event.start().date(), enddate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Validating constructor for [`RecurrenceRule`], also used by
/// [`RecurrenceRule::replace`].
#[derive(Debug, Clone)]
#[must_use]
pub struct RuleBuilder {
    kind: Kind,
    interval: u32,
    count: Option<u32>,
    until: Option<NaiveDate>,
    exceptions: BTreeSet<NaiveDate>,
    exception_texts: Vec<String>,
    weekdays: Vec<u8>,
    mode: MonthlyMode,
    mode_text: Option<String>,
}

impl RuleBuilder {
    fn of(kind: Kind) -> Self {
        Self {
            kind,
            interval: 1,
            count: None,
            until: None,
            exceptions: BTreeSet::new(),
            exception_texts: Vec::new(),
            weekdays: Vec::new(),
            mode: MonthlyMode::default(),
            mode_text: None,
        }
    }

    pub fn none() -> Self {
        Self::of(Kind::None)
    }

    pub fn daily() -> Self {
        Self::of(Kind::Daily)
    }

    pub fn weekly() -> Self {
        Self::of(Kind::Weekly)
    }

    pub fn monthly() -> Self {
        Self::of(Kind::Monthly)
    }

    pub fn yearly() -> Self {
        Self::of(Kind::Yearly)
    }

    pub fn interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn no_count(mut self) -> Self {
        self.count = None;
        self
    }

    pub fn until(mut self, until: NaiveDate) -> Self {
        self.until = Some(until);
        self
    }

    pub fn no_until(mut self) -> Self {
        self.until = None;
        self
    }

    /// Add one exception date.
    pub fn exception(mut self, date: NaiveDate) -> Self {
        self.exceptions.insert(date);
        self
    }

    /// Add an exception given as `YYYY-MM-DD` text. Parsed by [`build`](Self::build).
    pub fn exception_str(mut self, date: &str) -> Self {
        self.exception_texts.push(date.to_string());
        self
    }

    /// Replace the whole exception set.
    pub fn exceptions(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.exceptions = dates.into_iter().collect();
        self.exception_texts.clear();
        self
    }

    /// Replace the weekday set with indexes (Monday = 0). Checked by [`build`](Self::build).
    pub fn weekdays(mut self, indexes: impl IntoIterator<Item = u8>) -> Self {
        self.weekdays = indexes.into_iter().collect();
        self
    }

    pub fn weekday(mut self, weekday: Weekday) -> Self {
        self.weekdays.push(weekday.num_days_from_monday() as u8);
        self
    }

    pub fn mode(mut self, mode: MonthlyMode) -> Self {
        self.mode = mode;
        self.mode_text = None;
        self
    }

    /// Set the monthly mode from its token. Checked by [`build`](Self::build).
    pub fn mode_str(mut self, mode: &str) -> Self {
        self.mode_text = Some(mode.to_string());
        self
    }

    /// Validate every field and produce the rule.
    ///
    /// # Errors
    /// - [`EngineError::InvalidInterval`] if the interval is zero
    /// - [`EngineError::CountAndUntil`] if both terminations are set
    /// - [`EngineError::InvalidException`] for unparseable exception text
    /// - [`EngineError::InvalidWeekday`] for a weekday index above 6
    /// - [`EngineError::UnsupportedMonthlyMode`] for an unknown mode token
    pub fn build(self) -> Result<RecurrenceRule> {
        let mut exceptions = self.exceptions;
        for text in &self.exception_texts {
            let date = text
                .trim()
                .parse::<NaiveDate>()
                .map_err(|_| EngineError::InvalidException(text.clone()))?;
            exceptions.insert(date);
        }
        let bounds = RuleBounds::new(self.interval, self.count, self.until, exceptions)?;

        Ok(match self.kind {
            Kind::None => RecurrenceRule::None,
            Kind::Daily => RecurrenceRule::Daily(bounds),
            Kind::Yearly => RecurrenceRule::Yearly(bounds),
            Kind::Weekly => RecurrenceRule::Weekly {
                bounds,
                weekdays: WeekdaySet::from_indexes(self.weekdays)?,
            },
            Kind::Monthly => {
                let mode = match self.mode_text {
                    Some(text) => text.parse()?,
                    None => self.mode,
                };
                RecurrenceRule::Monthly { bounds, mode }
            }
        })
    }
}

/// Position of the generator between two calls to `next`.
#[derive(Debug, Clone, Copy)]
enum Cursor {
    /// The next date to inspect.
    Day(NaiveDate),
    /// The next month to inspect, as `year * 12 + month0`.
    Month(i64),
    Exhausted,
}

/// Lazy iterator over the recurrence dates of one rule applied to one start
/// date. Created by [`RecurrenceRule::apply`].
#[derive(Debug, Clone)]
pub struct Recurrences<'a> {
    rule: &'a RecurrenceRule,
    start: NaiveDate,
    enddate: Option<NaiveDate>,
    cursor: Cursor,
    /// Candidates examined so far, exceptions included.
    examined: u32,
    /// Week-of-month index for weekday patterns; negative counts from the end.
    month_week: i64,
}

impl<'a> Recurrences<'a> {
    fn new(rule: &'a RecurrenceRule, start: NaiveDate, enddate: Option<NaiveDate>) -> Self {
        let (cursor, month_week) = match rule {
            RecurrenceRule::Monthly {
                mode: MonthlyMode::Weekday,
                ..
            } => (Cursor::Month(month_slot(start)), i64::from((start.day() - 1) / 7 + 1)),
            RecurrenceRule::Monthly {
                mode: MonthlyMode::LastWeekday,
                ..
            } => {
                let from_end = i64::from(start.day()) - i64::from(days_in_month(start)) - 1;
                (Cursor::Month(month_slot(start)), from_end.div_euclid(7))
            }
            _ => (Cursor::Day(start), 0),
        };
        Self {
            rule,
            start,
            enddate,
            cursor,
            examined: 0,
            month_week,
        }
    }

    /// The date the cursor currently points at.
    fn current(&self) -> Option<NaiveDate> {
        match self.cursor {
            Cursor::Day(date) => Some(date),
            Cursor::Month(slot) => {
                let (year, month) = split_slot(slot)?;
                nth_weekday(year, month, self.month_week, self.start.weekday())
            }
            Cursor::Exhausted => None,
        }
    }

    fn past_end(&self, bounds: &RuleBounds, date: NaiveDate) -> bool {
        self.enddate.is_some_and(|end| date > end)
            || bounds.count.is_some_and(|count| self.examined >= count)
            || bounds.until.is_some_and(|until| date > until)
    }

    /// Whether `date` is a candidate at all. Only weekly rules inspect days
    /// that are not candidates.
    fn is_candidate(&self, date: NaiveDate) -> bool {
        match self.rule {
            RecurrenceRule::Weekly { bounds, weekdays } => {
                let weekday = date.weekday();
                (weekdays.contains(weekday) || weekday == self.start.weekday())
                    && weekspan(self.start, date) % i64::from(bounds.interval) == 0
            }
            _ => true,
        }
    }

    fn advance(&mut self, bounds: &RuleBounds) {
        let interval = bounds.interval;
        self.cursor = match (self.rule, self.cursor) {
            (_, Cursor::Exhausted) | (RecurrenceRule::None, _) => Cursor::Exhausted,
            (_, Cursor::Month(slot)) => Cursor::Month(slot + i64::from(interval)),
            (RecurrenceRule::Daily(_), Cursor::Day(date)) => {
                day_cursor(date.checked_add_days(Days::new(u64::from(interval))))
            }
            (RecurrenceRule::Weekly { .. }, Cursor::Day(date)) => day_cursor(date.succ_opt()),
            (RecurrenceRule::Monthly { .. }, Cursor::Day(date)) => {
                day_cursor(next_same_day(date, self.start.day(), i64::from(interval)))
            }
            (RecurrenceRule::Yearly(_), Cursor::Day(date)) => {
                day_cursor(next_same_day(date, self.start.day(), 12 * i64::from(interval)))
            }
        };
    }
}

impl<'a> Iterator for Recurrences<'a> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let rule: &'a RecurrenceRule = self.rule;
        let Some(bounds) = rule.bounds() else {
            // A non-repeating rule yields its start date exactly once.
            return match self.cursor {
                Cursor::Exhausted => None,
                _ => {
                    self.cursor = Cursor::Exhausted;
                    Some(self.start)
                }
            };
        };

        loop {
            let Some(date) = self.current() else {
                self.cursor = Cursor::Exhausted;
                return None;
            };
            if self.past_end(bounds, date) {
                self.cursor = Cursor::Exhausted;
                return None;
            }
            let candidate = self.is_candidate(date);
            self.advance(bounds);
            if !candidate {
                continue;
            }
            self.examined += 1;
            if !bounds.exceptions.contains(&date) {
                return Some(date);
            }
        }
    }
}

fn day_cursor(date: Option<NaiveDate>) -> Cursor {
    date.map_or(Cursor::Exhausted, Cursor::Day)
}

/// Step `step_months` at a time from `date` until a month has `day`.
///
/// Months (or, for yearly rules, years) lacking the day are skipped, so a
/// Jan-31 monthly rule continues with Mar-31 and a Feb-29 yearly rule only
/// lands on leap years.
fn next_same_day(date: NaiveDate, day: u32, step_months: i64) -> Option<NaiveDate> {
    let mut slot = month_slot(date);
    loop {
        slot = slot.checked_add(step_months)?;
        let (year, month) = split_slot(slot)?;
        if year > NaiveDate::MAX.year() {
            return None;
        }
        match NaiveDate::from_ymd_opt(year, month, day) {
            Some(next) => return Some(next),
            None => tracing::trace!(year, month, day, "skipping month without day"),
        }
    }
}

fn month_slot(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

fn split_slot(slot: i64) -> Option<(i32, u32)> {
    let year = i32::try_from(slot.div_euclid(12)).ok()?;
    // rem_euclid(12) is always in 0..12
    let month = slot.rem_euclid(12) as u32 + 1;
    Some((year, month))
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}

/// Number of Monday-aligned week boundaries between `first` and `second`.
fn weekspan(first: NaiveDate, second: NaiveDate) -> i64 {
    let monday = |d: NaiveDate| d - Days::new(u64::from(d.weekday().num_days_from_monday()));
    (monday(second) - monday(first)).num_days() / 7
}

/// The `index`-th `weekday` of a month.
///
/// Positive indexes count from the first such weekday of the month; a
/// negative index counts back from the first such weekday of the following
/// month (-1 is the last one). Out-of-range indexes are not clamped, so the
/// result can fall outside the month.
fn nth_weekday(year: i32, month: u32, index: i64, weekday: Weekday) -> Option<NaiveDate> {
    let (year, month, index) = if index < 0 {
        if month == 12 {
            (year.checked_add(1)?, 1, index + 1)
        } else {
            (year, month + 1, index + 1)
        }
    } else {
        (year, month, index)
    };
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let offset = (7 + weekday.num_days_from_monday() - first.weekday().num_days_from_monday()) % 7;
    let first_match = first.checked_add_days(Days::new(u64::from(offset)))?;
    first_match.checked_add_signed(Duration::weeks(index - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekspan_counts_monday_boundaries() {
        // Sun 2005-04-03 and Mon 2005-04-04 sit in adjacent weeks.
        assert_eq!(weekspan(date(2005, 4, 3), date(2005, 4, 4)), 1);
        assert_eq!(weekspan(date(2005, 4, 4), date(2005, 4, 10)), 0);
        assert_eq!(weekspan(date(2005, 4, 4), date(2005, 4, 25)), 3);
    }

    #[test]
    fn nth_weekday_positive_and_negative() {
        // Third Wednesday of April 2005.
        assert_eq!(nth_weekday(2005, 4, 3, Weekday::Wed), Some(date(2005, 4, 20)));
        // Second-to-last Wednesday of April 2005.
        assert_eq!(nth_weekday(2005, 4, -2, Weekday::Wed), Some(date(2005, 4, 20)));
        // Last Friday of December rolls through January of the next year.
        assert_eq!(nth_weekday(2005, 12, -1, Weekday::Fri), Some(date(2005, 12, 30)));
    }

    #[test]
    fn nth_weekday_spills_past_month_end() {
        // April 2005 has only four Mondays; the fifth lands in May.
        assert_eq!(nth_weekday(2005, 4, 5, Weekday::Mon), Some(date(2005, 5, 2)));
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(date(2004, 2, 10)), 29);
        assert_eq!(days_in_month(date(2005, 2, 10)), 28);
        assert_eq!(days_in_month(date(2005, 12, 1)), 31);
    }

    #[test]
    fn weekday_set_rejects_out_of_range() {
        assert_eq!(
            WeekdaySet::from_indexes([1, 7]),
            Err(EngineError::InvalidWeekday(7))
        );
    }

    #[test]
    fn weekday_set_indexes_are_sorted() {
        let set: WeekdaySet = [Weekday::Fri, Weekday::Mon].into_iter().collect();
        assert_eq!(set.indexes().collect::<Vec<_>>(), vec![0, 4]);
    }
}
