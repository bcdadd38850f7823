//! Calendars packed into structured text, as found in calendar data fields.
//!
//! ```text
//! (0||CalendarData()(
//!   (0||DaysOfWeek()(
//!     (0||1()())
//!     (0||2()(
//!       (0||0(f|12:00|s|08:00)())
//!       (0||1(f|17:00|s|13:00)()))) ...))
//!   (0||VIEW(ShowTotal|Y)())
//!   (0||Exceptions()(
//!     (0||0(d|45292)()))))
//! ```
//!
//! Days of the week are numbered from Sunday = 1. Exceptions carry their date
//! as a number of days since [`exception_epoch`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, TimeDelta};
use tracing::debug;

use crate::calendar::{Calendar, CalendarException, CalendarId, WEEK, WorkingRange};
use crate::error::{ReconcileError, Result};
use crate::structured_text::{DecodeMode, StructuredTextRecord};

pub fn exception_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or(NaiveDate::MIN)
}

fn parse_time(text: &str) -> Result<NaiveTime> {
    let text = text.trim();
    if text == "24:00" {
        return Ok(NaiveTime::MIN);
    }
    let format = if text.contains(' ') { "%I:%M %p" } else { "%H:%M" };
    NaiveTime::parse_from_str(text, format)
        .map_err(|e| ReconcileError::Calendar(format!("bad time {text:?}: {e}")))
}

fn hours_to_minutes(hours: Option<f64>) -> Option<u32> {
    hours.map(|h| (h * 60.0).max(0.0) as u32)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarDecoder {
    mode: DecodeMode,
}

impl CalendarDecoder {
    pub fn new(mode: DecodeMode) -> Self {
        Self { mode }
    }

    /// Builds a calendar the way an import does: decode the data field, make
    /// sure the result has working time, then apply the hours per day, week,
    /// month and year given alongside it. Missing figures are derived later.
    pub fn read(
        &self,
        unique_id: CalendarId,
        name: &str,
        parent: Option<Arc<Calendar>>,
        data: Option<&str>,
        hours_per_period: [Option<f64>; 4],
        ignored: &mut Vec<ReconcileError>,
    ) -> Result<Calendar> {
        let mut calendar = Calendar::new(unique_id, name);
        calendar.set_parent(parent);
        if let Some(data) = data {
            self.decode(&mut calendar, data, ignored)?;
        }
        calendar.ensure_working_time();
        let [day, week, month, year] = hours_per_period.map(hours_to_minutes);
        calendar.supply_capacities(day, week, month, year);
        Ok(calendar)
    }

    /// Applies the weekly pattern and exceptions found in `data` to `calendar`.
    pub fn decode(
        &self,
        calendar: &mut Calendar,
        data: &str,
        ignored: &mut Vec<ReconcileError>,
    ) -> Result<()> {
        if data.trim().is_empty() {
            return Ok(());
        }
        let root = StructuredTextRecord::parse_with(data, self.mode, ignored)?;
        if let Some(days) = root.child("DaysOfWeek") {
            self.decode_days(calendar, days, ignored)?;
        }
        if let Some(exceptions) = root.child("Exceptions") {
            self.decode_exceptions(calendar, exceptions, ignored)?;
        }
        Ok(())
    }

    fn decode_days(
        &self,
        calendar: &mut Calendar,
        days: &StructuredTextRecord,
        ignored: &mut Vec<ReconcileError>,
    ) -> Result<()> {
        let by_number: HashMap<usize, &StructuredTextRecord> = days
            .children()
            .iter()
            .filter_map(|d| {
                let number = d.name().parse::<usize>().ok()?;
                (1..=7).contains(&number).then_some((number, d))
            })
            .collect();
        for (index, day) in WEEK.iter().enumerate() {
            // a day without a record is not worked
            let ranges = match by_number.get(&(index + 1)) {
                Some(record) => self.decode_ranges(record, ignored)?,
                None => Vec::new(),
            };
            calendar.set_day(*day, ranges);
        }
        Ok(())
    }

    fn decode_exceptions(
        &self,
        calendar: &mut Calendar,
        exceptions: &StructuredTextRecord,
        ignored: &mut Vec<ReconcileError>,
    ) -> Result<()> {
        for exception in exceptions.children() {
            let offset = exception.attribute("d").unwrap_or_default();
            let date = match offset.trim().parse::<i64>() {
                Ok(days) => {
                    TimeDelta::try_days(days).and_then(|d| exception_epoch().checked_add_signed(d))
                }
                Err(_) => None,
            };
            let Some(date) = date else {
                let error = ReconcileError::Calendar(format!("bad exception offset {offset:?}"));
                self.mode.absorb(error, ignored)?;
                continue;
            };
            let ranges = self.decode_ranges(exception, ignored)?;
            calendar.add_exception(CalendarException::new(date, date, ranges));
        }
        Ok(())
    }

    fn decode_ranges(
        &self,
        record: &StructuredTextRecord,
        ignored: &mut Vec<ReconcileError>,
    ) -> Result<Vec<WorkingRange>> {
        let mut ranges = Vec::new();
        for hours in record.children() {
            let (Some(start), Some(finish)) = (hours.attribute("s"), hours.attribute("f")) else {
                continue;
            };
            // incomplete records are ignored
            if start.is_empty() || finish.is_empty() {
                continue;
            }
            match (parse_time(start), parse_time(finish)) {
                (Ok(s), Ok(f)) => ranges.push(WorkingRange::new(s, f)),
                (Err(e), _) | (_, Err(e)) => self.mode.absorb(e, ignored)?,
            }
        }
        Ok(ranges)
    }
}

fn encode_ranges(name: String, ranges: &[WorkingRange]) -> StructuredTextRecord {
    ranges.iter().enumerate().fold(StructuredTextRecord::new(name), |record, (index, range)| {
        record.with_child(
            StructuredTextRecord::new(index.to_string())
                .with_attribute("s", range.start().format("%H:%M").to_string())
                .with_attribute("f", range.end().format("%H:%M").to_string()),
        )
    })
}

/// Encodes the resolved weekly pattern and exceptions of `calendar`, so that
/// derived calendars can be written without their parent.
pub fn encode(calendar: &Calendar) -> StructuredTextRecord {
    let mut days = StructuredTextRecord::new("DaysOfWeek");
    for (index, day) in WEEK.iter().enumerate() {
        days.push(encode_ranges((index + 1).to_string(), calendar.day_hours(*day)));
    }

    let mut exceptions = StructuredTextRecord::new("Exceptions");
    let epoch = exception_epoch();
    for (index, (date, ranges)) in calendar.resolved_exceptions().into_iter().enumerate() {
        let offset = (date - epoch).num_days();
        let record = encode_ranges(index.to_string(), &ranges);
        exceptions.push(record.with_attribute("d", offset.to_string()));
    }
    debug!(
        calendar = calendar.unique_id(),
        exceptions = exceptions.children().len(),
        "encoded calendar"
    );

    StructuredTextRecord::new("CalendarData")
        .with_child(days)
        .with_child(StructuredTextRecord::new("VIEW").with_attribute("ShowTotal", "Y"))
        .with_child(exceptions)
}

pub fn encode_calendar_data(calendar: &Calendar) -> String {
    encode(calendar).to_string()
}
