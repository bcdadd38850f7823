//! Rolls leaf activity data up to the WBS summary nodes.
//!
//! Summary nodes carry no schedule data of their own in either interchange
//! format. After the readers have populated the activities, [`reconcile`]
//! prepares each activity's derived values and then walks the forest
//! children-first, once per concern: calendars, dates, work, cost.
//!
//! Nothing here fails. Partial or inconsistent source data degrades the
//! derived value (to zero or to unknown) rather than stopping the import.

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::calendar::{Calendar, CalendarId, CalendarKeeper};
use crate::duration::{self, Capacities, Duration, TimeUnit, max_date, min_date};
use crate::schedule::{CriticalActivityType, Schedule};
use crate::task::{NodeIndex, TaskCost, TaskDates, TaskDurations, TaskTree, TaskWork};

pub fn reconcile(schedule: &mut Schedule) {
    prepare_activities(schedule);
    rollup(schedule);
}

fn effective_calendar(
    tasks: &TaskTree,
    calendars: &CalendarKeeper,
    default: Option<CalendarId>,
    node: NodeIndex,
) -> Option<Arc<Calendar>> {
    tasks.get(node).calendar.or(default).and_then(|id| calendars.get(id))
}

// ------------- activities -------------

/// Fills in the values activities do not carry directly: current start and
/// finish, total work, actual duration and duration at completion.
pub fn prepare_activities(schedule: &mut Schedule) {
    let Schedule {
        tasks,
        calendars,
        default_calendar,
        status_date,
        critical_activity_type,
        ..
    } = schedule;
    let activities: Vec<NodeIndex> = tasks.activities().collect();
    for node in activities {
        let calendar = effective_calendar(tasks, calendars, *default_calendar, node);
        let task = tasks.get_mut(node);

        // longest-path criticality cannot be derived from the source data
        if *critical_activity_type == CriticalActivityType::LongestPath {
            task.critical = false;
        }

        let d = &mut task.dates;
        let start = d.actual_start.or(d.remaining_early_start).or(d.planned_start);
        if let Some(start) = start.or(d.early_start) {
            d.start = Some(start);
        }
        let finish = d.actual_finish.or(d.remaining_early_finish).or(d.planned_finish);
        if let Some(finish) = finish.or(d.early_finish) {
            d.finish = Some(finish);
        }

        let capacities = calendar.as_deref().map(Calendar::capacities).unwrap_or_default();
        if task.work.work.is_none() {
            task.work.work = duration::add(task.work.actual, task.work.remaining, &capacities);
        }

        let Some(calendar) = calendar else {
            debug!(task = task.unique_id(), "no calendar, durations left as read");
            continue;
        };
        if let Some(actual) = actual_duration(&calendar, &task.dates, *status_date) {
            task.durations.actual = Some(actual);
        }
        if let Some(at_completion) =
            duration_at_completion(&calendar, &task.dates, &task.durations)
        {
            task.durations.duration = Some(at_completion);
        }
    }
}

/// Working time an activity has spent in progress. The end point is the
/// actual finish, else the status date (never before the actual start).
/// Time between suspend and resume is not counted. `None` if the activity
/// has not started, or has no finish and there is no status date.
pub fn actual_duration(
    calendar: &Calendar,
    dates: &TaskDates,
    status_date: Option<NaiveDateTime>,
) -> Option<Duration> {
    let actual_start = dates.actual_start?;
    let finish = dates.actual_finish.or_else(|| status_date.map(|s| s.max(actual_start)))?;
    let hours = match dates.suspend {
        Some(suspend) if finish >= suspend => {
            let mut hours = calendar.work(actual_start, suspend, TimeUnit::Hours).value();
            if let Some(resume) = dates.resume.filter(|r| finish > *r) {
                hours += calendar.work(resume, finish, TimeUnit::Hours).value();
            }
            hours
        }
        _ => calendar.work(actual_start, finish, TimeUnit::Hours).value(),
    };
    Some(Duration::hours(hours))
}

fn duration_at_completion(
    calendar: &Calendar,
    dates: &TaskDates,
    durations: &TaskDurations,
) -> Option<Duration> {
    let actual = durations.actual.filter(|d| !d.is_zero());
    let remaining = durations.remaining.filter(|d| !d.is_zero());
    match (actual, remaining, dates.start, dates.finish) {
        (Some(_), Some(_), Some(start), Some(finish)) => {
            Some(calendar.work(start, finish, TimeUnit::Hours))
        }
        (Some(actual), _, _, _) => Some(actual),
        _ => durations.remaining,
    }
}

// ------------- summaries -------------

/// Runs the four rollup passes over the forest.
pub fn rollup(schedule: &mut Schedule) {
    let order = schedule.tasks.post_order();
    rollup_calendars(schedule, &order);
    rollup_dates(schedule, &order);
    rollup_work(schedule, &order);
    rollup_costs(schedule, &order);
    let summaries = order.iter().filter(|n| schedule.tasks.get(**n).is_summary()).count();
    info!(tasks = order.len(), summaries, "rollup complete");
}

/// A summary node whose activities all use one calendar, other than the
/// schedule default, takes that calendar. Any mix leaves it on the default.
fn rollup_calendars(schedule: &mut Schedule, order: &[NodeIndex]) {
    let default = schedule.default_calendar;
    let tasks = &mut schedule.tasks;
    let mut resolved: Vec<Option<CalendarId>> = vec![None; tasks.len()];
    for node in order {
        let task = tasks.get(*node);
        if !task.is_summary() {
            resolved[node.index()] = task.calendar;
            continue;
        }
        let mut calendars: Vec<Option<CalendarId>> =
            task.children().iter().map(|c| resolved[c.index()]).collect();
        calendars.sort_unstable();
        calendars.dedup();
        if let [Some(calendar)] = calendars[..] {
            if Some(calendar) != default {
                tasks.get_mut(*node).calendar = Some(calendar);
                resolved[node.index()] = Some(calendar);
            }
        }
    }
}

fn rollup_dates(schedule: &mut Schedule, order: &[NodeIndex]) {
    let Schedule { tasks, calendars, default_calendar, .. } = schedule;
    for node in order {
        let task = tasks.get(*node);
        if !task.is_summary() || task.children().is_empty() {
            continue;
        }
        let children: Vec<(TaskDates, bool)> = task
            .children()
            .iter()
            .map(|c| (tasks.get(*c).dates, tasks.get(*c).critical))
            .collect();

        let mut d = TaskDates {
            suspend: task.dates.suspend,
            resume: task.dates.resume,
            ..TaskDates::default()
        };
        let mut actual_finish = None;
        for (c, _) in &children {
            d.start = min_date(d.start, c.start);
            d.finish = max_date(d.finish, c.finish);
            d.planned_start = min_date(d.planned_start, c.planned_start);
            d.planned_finish = max_date(d.planned_finish, c.planned_finish);
            d.actual_start = min_date(d.actual_start, c.actual_start);
            actual_finish = max_date(actual_finish, c.actual_finish);
            d.early_start = min_date(d.early_start, c.early_start);
            d.early_finish = max_date(d.early_finish, c.early_finish);
            d.remaining_early_start = min_date(d.remaining_early_start, c.remaining_early_start);
            d.remaining_early_finish = max_date(d.remaining_early_finish, c.remaining_early_finish);
            d.late_start = min_date(d.late_start, c.late_start);
            d.late_finish = max_date(d.late_finish, c.late_finish);
            d.remaining_late_start = min_date(d.remaining_late_start, c.remaining_late_start);
            d.remaining_late_finish = max_date(d.remaining_late_finish, c.remaining_late_finish);
            d.baseline_start = min_date(d.baseline_start, c.baseline_start);
            d.baseline_finish = max_date(d.baseline_finish, c.baseline_finish);
        }
        // a partly finished summary is not finished
        if children.iter().all(|(c, _)| c.actual_finish.is_some()) {
            d.actual_finish = actual_finish;
        }
        let critical = children.iter().any(|(_, critical)| *critical);

        let calendar = effective_calendar(tasks, calendars, *default_calendar, *node);
        let task = tasks.get_mut(*node);
        task.dates = d;
        task.critical = critical;
        task.durations = match calendar {
            Some(calendar) => summary_durations(&calendar, &d),
            None => Default::default(),
        };
    }
}

fn summary_durations(calendar: &Calendar, d: &TaskDates) -> TaskDurations {
    let work = |start: Option<NaiveDateTime>, finish: Option<NaiveDateTime>| match (start, finish) {
        (Some(s), Some(f)) => Some(calendar.work(s, f, TimeUnit::Hours).non_negative()),
        _ => None,
    };

    let planned = work(d.planned_start, d.planned_finish);
    let (actual, remaining) = if d.actual_finish.is_some() {
        (work(d.actual_start, d.actual_finish), Some(Duration::zero(TimeUnit::Hours)))
    } else {
        let current_start = d.remaining_early_start.or(d.early_start).or(d.planned_start);
        let current_finish = d.remaining_early_finish.or(d.early_finish).or(d.planned_finish);
        match current_start {
            Some(_) => (work(d.actual_start, current_start), work(current_start, current_finish)),
            None => (None, None),
        }
    };
    let capacities: Capacities = calendar.capacities();
    let duration = duration::add(actual, remaining, &capacities);

    let percent_complete = match (planned, remaining) {
        (Some(p), Some(r)) if !p.is_zero() => {
            Some(((p.value() - r.value()) / p.value() * 100.0).clamp(0.0, 100.0))
        }
        _ => None,
    };

    TaskDurations { duration, planned, actual, remaining, percent_complete }
}

fn rollup_work(schedule: &mut Schedule, order: &[NodeIndex]) {
    let Schedule { tasks, calendars, default_calendar, .. } = schedule;
    for node in order {
        let task = tasks.get(*node);
        if !task.is_summary() || task.children().is_empty() {
            continue;
        }
        let capacities = effective_calendar(tasks, calendars, *default_calendar, *node)
            .map(|c| c.capacities())
            .unwrap_or_default();
        let mut total = TaskWork::default();
        for child in task.children() {
            let w = &tasks.get(*child).work;
            total.actual = duration::add(total.actual, w.actual, &capacities);
            total.planned = duration::add(total.planned, w.planned, &capacities);
            total.remaining = duration::add(total.remaining, w.remaining, &capacities);
            total.work = duration::add(total.work, w.work, &capacities);
        }
        tasks.get_mut(*node).work = total;
    }
}

fn rollup_costs(schedule: &mut Schedule, order: &[NodeIndex]) {
    let tasks = &mut schedule.tasks;
    for node in order {
        let task = tasks.get(*node);
        if !task.is_summary() || task.children().is_empty() {
            continue;
        }
        let mut total = [0.0; 5];
        for child in task.children() {
            let c = &tasks.get(*child).cost;
            let values = [c.cost, c.planned, c.actual, c.remaining, c.fixed];
            for (sum, value) in total.iter_mut().zip(values) {
                *sum += value.unwrap_or(0.0);
            }
        }
        let [cost, planned, actual, remaining, fixed] = total.map(Some);
        tasks.get_mut(*node).cost = TaskCost { cost, planned, actual, remaining, fixed };
    }
}
