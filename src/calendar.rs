//! Working-time calendars and the time arithmetic built on them.
//!
//! A [`Calendar`] holds a weekly pattern of working ranges and a list of
//! dated exceptions. A calendar may derive from a parent: a weekday without
//! an explicit pattern, or a date without an own exception, falls through to
//! the parent. Calendars are owned by a [`CalendarKeeper`] once complete and
//! are shared from there; tasks refer to them by [`CalendarId`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Weekday};
use tracing::{debug, warn};

use crate::clash::IdHasher;
use crate::duration::{Capacities, Duration, TimeUnit};

pub type CalendarId = i32;

const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

// Searches for working time give up after roughly a century.
const MAX_SEARCH_DAYS: usize = 36_600;

/// Sunday first, matching the day numbering used in calendar data.
pub const WEEK: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

// ------------- WorkingRange -------------
/// A span of working time within one day. An end of `00:00` means midnight
/// at the end of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkingRange {
    start: NaiveTime,
    end: NaiveTime,
}

impl WorkingRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }
    pub fn from_hm(start: (u32, u32), end: (u32, u32)) -> Option<Self> {
        Some(Self::new(
            NaiveTime::from_hms_opt(start.0, start.1, 0)?,
            NaiveTime::from_hms_opt(end.0, end.1, 0)?,
        ))
    }
    pub fn start(&self) -> NaiveTime {
        self.start
    }
    pub fn end(&self) -> NaiveTime {
        self.end
    }
    pub fn start_seconds(&self) -> u32 {
        self.start.num_seconds_from_midnight()
    }
    pub fn end_seconds(&self) -> u32 {
        match self.end.num_seconds_from_midnight() {
            0 => SECONDS_PER_DAY,
            s => s,
        }
    }
    pub fn minutes(&self) -> u32 {
        self.end_seconds().saturating_sub(self.start_seconds()) / 60
    }
    fn on(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        let midnight = date.and_time(NaiveTime::MIN);
        (
            midnight + TimeDelta::seconds(self.start_seconds() as i64),
            midnight + TimeDelta::seconds(self.end_seconds() as i64),
        )
    }
}

fn default_ranges() -> Vec<WorkingRange> {
    [((8, 0), (12, 0)), ((13, 0), (17, 0))]
        .into_iter()
        .filter_map(|(s, e)| WorkingRange::from_hm(s, e))
        .collect()
}

// ------------- CalendarException -------------
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarException {
    from: NaiveDate,
    to: NaiveDate,
    ranges: Vec<WorkingRange>,
}

impl CalendarException {
    pub fn new(from: NaiveDate, to: NaiveDate, mut ranges: Vec<WorkingRange>) -> Self {
        ranges.sort();
        Self { from, to, ranges }
    }
    pub fn from(&self) -> NaiveDate {
        self.from
    }
    pub fn to(&self) -> NaiveDate {
        self.to
    }
    pub fn ranges(&self) -> &[WorkingRange] {
        &self.ranges
    }
    pub fn is_working(&self) -> bool {
        !self.ranges.is_empty()
    }
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

// ------------- Calendar -------------
#[derive(Debug, Clone, Default)]
pub struct Calendar {
    unique_id: CalendarId,
    name: String,
    parent: Option<Arc<Calendar>>,
    // indexed by days from Sunday, None inherits from the parent
    days: [Option<Vec<WorkingRange>>; 7],
    exceptions: Vec<CalendarException>,
    supplied: [Option<u32>; 4],
}

impl Calendar {
    pub fn new(unique_id: CalendarId, name: impl Into<String>) -> Self {
        Self { unique_id, name: name.into(), ..Self::default() }
    }
    pub fn unique_id(&self) -> CalendarId {
        self.unique_id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn parent(&self) -> Option<&Arc<Calendar>> {
        self.parent.as_ref()
    }
    pub fn set_parent(&mut self, parent: Option<Arc<Calendar>>) {
        self.parent = parent;
    }

    /// Sets an explicit pattern for a weekday; an empty list makes it non-working.
    pub fn set_day(&mut self, day: Weekday, mut ranges: Vec<WorkingRange>) {
        ranges.sort();
        self.days[day.num_days_from_sunday() as usize] = Some(ranges);
    }
    /// Removes the explicit pattern so the weekday inherits from the parent.
    pub fn clear_day(&mut self, day: Weekday) {
        self.days[day.num_days_from_sunday() as usize] = None;
    }
    pub fn add_exception(&mut self, exception: CalendarException) {
        self.exceptions.push(exception);
    }
    pub fn exceptions(&self) -> &[CalendarException] {
        &self.exceptions
    }

    /// Minutes per day, week, month and year as given by the source, if any.
    pub fn supply_capacities(
        &mut self,
        day: Option<u32>,
        week: Option<u32>,
        month: Option<u32>,
        year: Option<u32>,
    ) {
        self.supplied = [day, week, month, year];
    }

    /// Resolved weekly pattern for a weekday, ignoring exceptions.
    pub fn day_hours(&self, day: Weekday) -> &[WorkingRange] {
        match (&self.days[day.num_days_from_sunday() as usize], &self.parent) {
            (Some(ranges), _) => ranges.as_slice(),
            (None, Some(parent)) => parent.day_hours(day),
            (None, None) => &[],
        }
    }
    pub fn is_working_day(&self, day: Weekday) -> bool {
        !self.day_hours(day).is_empty()
    }

    /// The exception governing `date`, if any.
    pub fn exception(&self, date: NaiveDate) -> Option<&CalendarException> {
        if let Some(exception) = self.exceptions.iter().find(|e| e.covers(date)) {
            return Some(exception);
        }
        if self.days[date.weekday().num_days_from_sunday() as usize].is_some() {
            return None;
        }
        self.parent.as_ref().and_then(|p| p.exception(date))
    }

    /// Working ranges for a date: the governing exception's ranges if there
    /// is one, otherwise the weekly pattern.
    pub fn hours(&self, date: NaiveDate) -> &[WorkingRange] {
        if let Some(exception) = self.exceptions.iter().find(|e| e.covers(date)) {
            return &exception.ranges;
        }
        match (&self.days[date.weekday().num_days_from_sunday() as usize], &self.parent) {
            (Some(ranges), _) => ranges.as_slice(),
            (None, Some(parent)) => parent.hours(date),
            (None, None) => &[],
        }
    }

    /// True if any weekday or exception anywhere in the chain has working time.
    pub fn has_working_time(&self) -> bool {
        WEEK.iter().any(|d| self.is_working_day(*d))
            || self.exceptions.iter().any(CalendarException::is_working)
            || self.parent.as_ref().is_some_and(|p| p.has_working_time())
    }

    /// Gives a degenerate calendar a standard working week. Returns true if
    /// working time had to be added.
    pub fn ensure_working_time(&mut self) -> bool {
        if self.has_working_time() {
            return false;
        }
        debug!(calendar = self.unique_id, "adding default working time to calendar without any");
        for day in &WEEK[1..6] {
            self.set_day(*day, default_ranges());
        }
        true
    }

    /// Supplied capacities, with missing figures derived from the weekly
    /// pattern: the week is the sum over all seven days, a day is the week
    /// spread over the working days, a month is four weeks and a year twelve
    /// months.
    pub fn capacities(&self) -> Capacities {
        let mut minutes_per_week = 0;
        let mut working_days = 0;
        for day in WEEK {
            let hours = self.day_hours(day);
            if !hours.is_empty() {
                working_days += 1;
                minutes_per_week += hours.iter().map(WorkingRange::minutes).sum::<u32>();
            }
        }
        let minutes_per_day = if working_days == 0 { 0 } else { minutes_per_week / working_days };
        let minutes_per_month = minutes_per_week * 4;
        let minutes_per_year = minutes_per_month * 12;
        let [day, week, month, year] = self.supplied;
        Capacities {
            minutes_per_day: day.unwrap_or(minutes_per_day),
            minutes_per_week: week.unwrap_or(minutes_per_week),
            minutes_per_month: month.unwrap_or(minutes_per_month),
            minutes_per_year: year.unwrap_or(minutes_per_year),
        }
    }

    /// Own exceptions expanded to single dates. A date covered by more than
    /// one exception keeps the first, which is the one `hours` applies.
    pub fn expanded_exceptions(&self) -> BTreeMap<NaiveDate, Vec<WorkingRange>> {
        let mut expanded = BTreeMap::new();
        for exception in &self.exceptions {
            for date in exception.from.iter_days().take_while(|d| *d <= exception.to) {
                expanded.entry(date).or_insert_with(|| exception.ranges.clone());
            }
        }
        expanded
    }

    /// Exceptions in effect for this calendar, including inherited ones, as
    /// single dates.
    pub fn resolved_exceptions(&self) -> BTreeMap<NaiveDate, Vec<WorkingRange>> {
        let mut dates = Vec::new();
        let mut current = Some(self);
        while let Some(calendar) = current {
            dates.extend(calendar.expanded_exceptions().into_keys());
            current = calendar.parent.as_deref();
        }
        dates
            .into_iter()
            .filter_map(|date| self.exception(date).map(|e| (date, e.ranges.clone())))
            .collect()
    }

    /// Working time between two instants. Never negative: an `end` that does
    /// not follow `start` yields zero.
    pub fn work(&self, start: NaiveDateTime, end: NaiveDateTime, unit: TimeUnit) -> Duration {
        if end <= start {
            return Duration::zero(unit);
        }
        let mut seconds: i64 = 0;
        let mut day = start.date();
        while day <= end.date() {
            for range in self.hours(day) {
                let (range_start, range_end) = range.on(day);
                let (s, e) = (range_start.max(start), range_end.min(end));
                if e > s {
                    seconds += (e - s).num_seconds();
                }
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        Duration::new(seconds as f64 / 60.0, TimeUnit::Minutes).convert(unit, &self.capacities())
    }

    /// The instant reached by consuming `duration` of working time from
    /// `start`. Work running out exactly at the end of a range finishes there.
    /// If the search runs out of working time first, the end of the last
    /// working range consumed is returned.
    pub fn date(&self, start: NaiveDateTime, duration: Duration) -> NaiveDateTime {
        let mut remaining = (duration.to_minutes(&self.capacities()) * 60.0).round() as i64;
        if remaining <= 0 || !self.has_working_time() {
            return start;
        }
        let mut reached = start;
        let mut day = start.date();
        for _ in 0..MAX_SEARCH_DAYS {
            for range in self.hours(day) {
                let (range_start, range_end) = range.on(day);
                let from = range_start.max(start);
                if range_end <= from {
                    continue;
                }
                let available = (range_end - from).num_seconds();
                if available >= remaining {
                    return from + TimeDelta::seconds(remaining);
                }
                remaining -= available;
                reached = range_end;
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        warn!(
            calendar = self.unique_id,
            %start,
            %reached,
            "ran out of working time while adding duration"
        );
        reached
    }

    /// As [`Calendar::date`], but a result sitting on the start of a working
    /// period is moved back to the end of the previous one.
    pub fn finish_date(&self, start: NaiveDateTime, duration: Duration) -> NaiveDateTime {
        self.normalize_finish(self.date(start, duration))
    }

    pub fn normalize_finish(&self, instant: NaiveDateTime) -> NaiveDateTime {
        let day = instant.date();
        let ranges = self.hours(day);
        let starts_period = ranges.iter().any(|r| r.on(day).0 == instant);
        let ends_period = ranges.iter().any(|r| r.on(day).1 == instant);
        if starts_period && !ends_period {
            self.previous_work_finish(instant)
        } else {
            instant
        }
    }

    /// The instant itself if it is working time, otherwise the next start of work.
    pub fn next_work_start(&self, instant: NaiveDateTime) -> NaiveDateTime {
        let mut day = instant.date();
        for _ in 0..MAX_SEARCH_DAYS {
            for range in self.hours(day) {
                let (range_start, range_end) = range.on(day);
                if range_end > instant {
                    return range_start.max(instant);
                }
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        instant
    }

    /// The instant itself if it closes working time, otherwise the previous end of work.
    pub fn previous_work_finish(&self, instant: NaiveDateTime) -> NaiveDateTime {
        let mut day = instant.date();
        for _ in 0..MAX_SEARCH_DAYS {
            for range in self.hours(day).iter().rev() {
                let (range_start, range_end) = range.on(day);
                if range_start < instant {
                    return range_end.min(instant);
                }
            }
            match day.pred_opt() {
                Some(previous) => day = previous,
                None => break,
            }
        }
        instant
    }
}

// ------------- CalendarKeeper -------------
#[derive(Debug, Default)]
pub struct CalendarKeeper {
    kept: HashMap<CalendarId, Arc<Calendar>, IdHasher>,
}

impl CalendarKeeper {
    pub fn new() -> Self {
        Self::default()
    }
    /// Keeps a completed calendar, replacing any earlier one with the same id.
    pub fn keep(&mut self, calendar: Calendar) -> Arc<Calendar> {
        let kept = Arc::new(calendar);
        self.kept.insert(kept.unique_id(), Arc::clone(&kept));
        kept
    }
    pub fn get(&self, id: CalendarId) -> Option<Arc<Calendar>> {
        self.kept.get(&id).map(Arc::clone)
    }
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Calendar>> {
        self.kept.values()
    }
    pub fn len(&self) -> usize {
        self.kept.len()
    }
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
}
