//! Time-phased work curves for resource assignments.
//!
//! A curve is stored relative to the assignment's start and to the working
//! days of its calendar: period 0 begins at the first working instant at or
//! after the anchor, period `k` at the start of work on the `k`-th working day
//! after that. The text form is a `;`-separated list of runs
//! `<period>*<count>=<hours>`, where `count` consecutive periods carry the same
//! hours; `<period>=<hours>` is a run of one.
//!
//! Only data written by the same scheduling product uses this encoding, so a
//! [`TimephasedCodec`] can only be obtained for [`Provenance::Native`] data.

use std::fmt::Write;

use chrono::{NaiveDateTime, NaiveTime};
use serde::Deserialize;
use tracing::debug;

use crate::calendar::Calendar;
use crate::duration::{Duration, TimeUnit};
use crate::error::{ReconcileError, Result};

// A curve covers at most about a century of working days.
const MAX_PERIODS: usize = 36_600;

/// Where the data being reconciled came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Written by the scheduling product whose curve encoding we understand.
    Native,
    #[default]
    Foreign,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimephasedSample {
    pub start: NaiveDateTime,
    pub work: Duration,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimephasedCurve {
    samples: Vec<TimephasedSample>,
}

impl TimephasedCurve {
    pub fn new(mut samples: Vec<TimephasedSample>) -> Self {
        samples.sort_by_key(|s| s.start);
        Self { samples }
    }
    pub fn samples(&self) -> &[TimephasedSample] {
        &self.samples
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn total_hours(&self, calendar: &Calendar) -> f64 {
        let capacities = calendar.capacities();
        self.samples.iter().map(|s| s.work.convert(TimeUnit::Hours, &capacities).value()).sum()
    }
}

// ------------- period grid -------------
/// Start instants of successive working-day periods from an anchor.
struct PeriodGrid<'c> {
    calendar: &'c Calendar,
    current: NaiveDateTime,
    index: usize,
}

impl<'c> PeriodGrid<'c> {
    fn new(calendar: &'c Calendar, anchor: NaiveDateTime) -> Self {
        Self { calendar, current: calendar.next_work_start(anchor), index: 0 }
    }
    fn advance(&mut self) -> Option<()> {
        let next_day = self.current.date().succ_opt()?;
        self.current = self.calendar.next_work_start(next_day.and_time(NaiveTime::MIN));
        self.index += 1;
        Some(())
    }
    fn seek(&mut self, index: usize) -> Result<NaiveDateTime> {
        while self.index < index {
            self.advance().ok_or_else(|| {
                ReconcileError::Curve("period beyond the supported date range".into())
            })?;
        }
        Ok(self.current)
    }
}

struct Run {
    period: usize,
    count: usize,
    hours: f64,
}

fn parse_run(text: &str) -> Result<Run> {
    let bad = || ReconcileError::Curve(format!("bad run {text:?}"));
    let (periods, hours) = text.split_once('=').ok_or_else(bad)?;
    let (period, count) = match periods.split_once('*') {
        Some((p, c)) => {
            (p.trim().parse().map_err(|_| bad())?, c.trim().parse().map_err(|_| bad())?)
        }
        None => (periods.trim().parse().map_err(|_| bad())?, 1),
    };
    let hours = hours.trim().parse().map_err(|_| bad())?;
    Ok(Run { period, count, hours })
}

#[derive(Debug)]
pub struct TimephasedCodec {
    _native: (),
}

impl TimephasedCodec {
    pub fn for_provenance(provenance: Provenance) -> Option<Self> {
        match provenance {
            Provenance::Native => Some(Self { _native: () }),
            Provenance::Foreign => None,
        }
    }

    /// Decodes a curve and re-anchors its periods at `anchor`. Absent or
    /// empty text, or a missing anchor, decodes to an empty curve.
    pub fn decode(
        &self,
        calendar: &Calendar,
        anchor: Option<NaiveDateTime>,
        encoded: Option<&str>,
    ) -> Result<TimephasedCurve> {
        let (Some(anchor), Some(encoded)) = (anchor, encoded) else {
            return Ok(TimephasedCurve::default());
        };
        if !calendar.has_working_time() {
            let id = calendar.unique_id();
            return Err(ReconcileError::Curve(format!("calendar {id} has no working days")));
        }
        let mut grid = PeriodGrid::new(calendar, anchor);
        let mut samples = Vec::new();
        let mut next_free = 0;
        for text in encoded.split(';').map(str::trim).filter(|t| !t.is_empty()) {
            let run = parse_run(text)?;
            if run.period < next_free {
                let message = format!("run {text:?} overlaps the previous run");
                return Err(ReconcileError::Curve(message));
            }
            let end = run
                .period
                .checked_add(run.count)
                .filter(|end| *end <= MAX_PERIODS)
                .ok_or_else(|| {
                    ReconcileError::Curve(format!("run {text:?} exceeds {MAX_PERIODS} periods"))
                })?;
            for period in run.period..end {
                let start = grid.seek(period)?;
                samples.push(TimephasedSample { start, work: Duration::hours(run.hours) });
            }
            next_free = end;
        }
        debug!(samples = samples.len(), %anchor, "decoded timephased curve");
        Ok(TimephasedCurve { samples })
    }

    /// Re-expresses the curve's sample instants as periods from `anchor`.
    pub fn encode(
        &self,
        calendar: &Calendar,
        anchor: NaiveDateTime,
        curve: &TimephasedCurve,
    ) -> Result<String> {
        let capacities = calendar.capacities();
        let mut grid = PeriodGrid::new(calendar, anchor);
        let mut runs: Vec<Run> = Vec::new();
        for sample in curve.samples() {
            if sample.start < grid.current && grid.index == 0 {
                let message = format!("sample at {} precedes the anchor {anchor}", sample.start);
                return Err(ReconcileError::Curve(message));
            }
            while grid.current.date() < sample.start.date() {
                grid.advance().ok_or_else(|| {
                    ReconcileError::Curve("sample beyond the supported date range".into())
                })?;
            }
            let hours = sample.work.convert(TimeUnit::Hours, &capacities).value();
            match runs.last_mut() {
                Some(run) if run.period + run.count == grid.index && run.hours == hours => {
                    run.count += 1
                }
                Some(run) if run.period + run.count > grid.index => {
                    let message = format!("two samples fall in period {}", grid.index);
                    return Err(ReconcileError::Curve(message));
                }
                _ => runs.push(Run { period: grid.index, count: 1, hours }),
            }
        }
        let mut encoded = String::new();
        for run in &runs {
            if !encoded.is_empty() {
                encoded.push(';');
            }
            if run.count == 1 {
                let _ = write!(encoded, "{}={}", run.period, run.hours);
            } else {
                let _ = write!(encoded, "{}*{}={}", run.period, run.count, run.hours);
            }
        }
        Ok(encoded)
    }
}
