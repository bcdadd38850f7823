//! Durations and the optional arithmetic used when quantities may be unknown.

use std::fmt;

use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

/// Minutes per period as defined by a calendar. Day-and-longer units are
/// converted through these figures rather than through elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capacities {
    pub minutes_per_day: u32,
    pub minutes_per_week: u32,
    pub minutes_per_month: u32,
    pub minutes_per_year: u32,
}

impl Capacities {
    fn minutes_per(&self, unit: TimeUnit) -> f64 {
        match unit {
            TimeUnit::Minutes => 1.0,
            TimeUnit::Hours => 60.0,
            TimeUnit::Days => self.minutes_per_day as f64,
            TimeUnit::Weeks => self.minutes_per_week as f64,
            TimeUnit::Months => self.minutes_per_month as f64,
            TimeUnit::Years => self.minutes_per_year as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Duration {
    value: f64,
    unit: TimeUnit,
}

impl Duration {
    pub fn new(value: f64, unit: TimeUnit) -> Self {
        Self { value, unit }
    }
    pub fn zero(unit: TimeUnit) -> Self {
        Self { value: 0.0, unit }
    }
    pub fn hours(value: f64) -> Self {
        Self::new(value, TimeUnit::Hours)
    }
    pub fn value(&self) -> f64 {
        self.value
    }
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }
    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }
    pub fn to_minutes(&self, capacities: &Capacities) -> f64 {
        self.value * capacities.minutes_per(self.unit)
    }
    /// Re-expresses the duration in `unit`. A unit with no capacity on the
    /// calendar converts to zero.
    pub fn convert(&self, unit: TimeUnit, capacities: &Capacities) -> Duration {
        if unit == self.unit {
            return *self;
        }
        let per = capacities.minutes_per(unit);
        let value = if per == 0.0 { 0.0 } else { self.to_minutes(capacities) / per };
        Duration::new(value, unit)
    }
    /// Clamps negative quantities to zero.
    pub fn non_negative(self) -> Duration {
        if self.value < 0.0 { Duration::zero(self.unit) } else { self }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let suffix = match self.unit {
            TimeUnit::Minutes => "m",
            TimeUnit::Hours => "h",
            TimeUnit::Days => "d",
            TimeUnit::Weeks => "w",
            TimeUnit::Months => "mo",
            TimeUnit::Years => "y",
        };
        write!(f, "{}{}", self.value, suffix)
    }
}

// ------------- optional arithmetic -------------
// An unknown quantity is the neutral element: it never turns a known value
// into an unknown one, and never shrinks a date range.

/// Sum of two optional durations, expressed in the unit of the first known one.
pub fn add(a: Option<Duration>, b: Option<Duration>, capacities: &Capacities) -> Option<Duration> {
    match (a, b) {
        (None, None) => None,
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (Some(a), Some(b)) => {
            Some(Duration::new(a.value + b.convert(a.unit, capacities).value, a.unit))
        }
    }
}

pub fn min_date(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

pub fn max_date(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}
