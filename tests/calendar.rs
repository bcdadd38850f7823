use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, Weekday};
use schedule_reconcile::calendar::{Calendar, CalendarException, CalendarKeeper, WorkingRange};
use schedule_reconcile::duration::{Duration, TimeUnit};

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn standard() -> Calendar {
    let mut calendar = Calendar::new(1, "Standard");
    assert!(calendar.ensure_working_time(), "an empty calendar is degenerate");
    calendar
}

#[test]
fn standard_week_capacities() {
    let capacities = standard().capacities();
    assert_eq!(capacities.minutes_per_day, 480);
    assert_eq!(capacities.minutes_per_week, 2400);
    assert_eq!(capacities.minutes_per_month, 9600);
    assert_eq!(capacities.minutes_per_year, 115_200);
}

#[test]
fn degenerate_calendar_has_zero_capacity_and_work() {
    let calendar = Calendar::new(9, "Nothing");
    assert!(!calendar.has_working_time());
    let capacities = calendar.capacities();
    assert_eq!(capacities.minutes_per_day, 0);
    assert_eq!(capacities.minutes_per_week, 0);
    let (start, end) = (at(2024, 1, 1, 0, 0), at(2024, 2, 1, 0, 0));
    assert_eq!(calendar.work(start, end, TimeUnit::Hours).value(), 0.0);
    assert_eq!(calendar.work(start, end, TimeUnit::Days).value(), 0.0);
}

#[test]
fn work_across_partial_days() {
    let calendar = standard();
    // Monday 10:00 to Tuesday 15:00 = 6h + 6h
    let work = calendar.work(at(2024, 1, 1, 10, 0), at(2024, 1, 2, 15, 0), TimeUnit::Hours);
    assert_eq!(work.value(), 12.0);
    // across a weekend
    let week = calendar.work(at(2024, 1, 5, 8, 0), at(2024, 1, 8, 17, 0), TimeUnit::Days);
    assert_eq!(week.value(), 2.0);
}

#[test]
fn work_is_never_negative() {
    let calendar = standard();
    let backwards = calendar.work(at(2024, 1, 2, 17, 0), at(2024, 1, 1, 8, 0), TimeUnit::Hours);
    assert_eq!(backwards.value(), 0.0);
    let empty = calendar.work(at(2024, 1, 2, 9, 0), at(2024, 1, 2, 9, 0), TimeUnit::Minutes);
    assert!(empty.is_zero());
}

#[test]
fn exception_overrides_weekly_pattern() {
    let mut calendar = standard();
    // Tuesday off, Saturday morning worked
    calendar.add_exception(CalendarException::new(day(2024, 1, 2), day(2024, 1, 2), vec![]));
    let morning = WorkingRange::from_hm((9, 0), (12, 0)).unwrap();
    calendar.add_exception(CalendarException::new(day(2024, 1, 6), day(2024, 1, 6), vec![morning]));
    assert!(calendar.hours(day(2024, 1, 2)).is_empty());
    assert_eq!(calendar.hours(day(2024, 1, 6)), &[morning]);
    assert_eq!(calendar.hours(day(2024, 1, 3)).len(), 2);
    let work = calendar.work(at(2024, 1, 1, 0, 0), at(2024, 1, 7, 0, 0), TimeUnit::Hours);
    assert_eq!(work.value(), 4.0 * 8.0 + 3.0);
}

#[test]
fn overlapping_exceptions_expand_to_unique_dates() {
    let mut calendar = standard();
    calendar.add_exception(CalendarException::new(day(2024, 12, 24), day(2024, 12, 26), vec![]));
    let half = WorkingRange::from_hm((8, 0), (12, 0)).unwrap();
    let from = day(2024, 12, 26);
    calendar.add_exception(CalendarException::new(from, day(2024, 12, 27), vec![half]));
    let expanded = calendar.expanded_exceptions();
    assert_eq!(expanded.len(), 4);
    assert!(expanded[&day(2024, 12, 26)].is_empty(), "first exception wins");
    assert_eq!(expanded[&day(2024, 12, 27)], vec![half]);
}

#[test]
fn date_consumes_working_time() {
    let calendar = standard();
    // Friday 15:00 plus 4h lands on Monday 10:00
    let end = calendar.date(at(2024, 1, 5, 15, 0), Duration::hours(4.0));
    assert_eq!(end, at(2024, 1, 8, 10, 0));
    // a full day from 08:00 ends at 17:00 the same day
    let monday = at(2024, 1, 1, 8, 0);
    assert_eq!(calendar.date(monday, Duration::new(1.0, TimeUnit::Days)), at(2024, 1, 1, 17, 0));
    assert_eq!(calendar.date(monday, Duration::zero(TimeUnit::Hours)), monday);
}

#[test]
fn date_stops_at_the_last_working_time_found() {
    // no weekly pattern, one worked day
    let mut calendar = Calendar::new(3, "One day");
    let day_ranges = vec![
        WorkingRange::from_hm((8, 0), (12, 0)).unwrap(),
        WorkingRange::from_hm((13, 0), (17, 0)).unwrap(),
    ];
    calendar.add_exception(CalendarException::new(day(2024, 1, 2), day(2024, 1, 2), day_ranges));
    assert!(calendar.has_working_time());
    assert_eq!(calendar.date(at(2024, 1, 1, 0, 0), Duration::hours(100.0)), at(2024, 1, 2, 17, 0));
    assert_eq!(calendar.date(at(2024, 1, 1, 0, 0), Duration::hours(6.0)), at(2024, 1, 2, 15, 0));
}

#[test]
fn finish_date_moves_back_to_end_of_work() {
    let calendar = standard();
    // 4h from 13:00 on Monday finishes 17:00 on Monday
    let finish = calendar.finish_date(at(2024, 1, 1, 13, 0), Duration::hours(4.0));
    assert_eq!(finish, at(2024, 1, 1, 17, 0));
    // the start of Tuesday's work is normalised back to Monday's end
    assert_eq!(calendar.normalize_finish(at(2024, 1, 2, 8, 0)), at(2024, 1, 1, 17, 0));
    assert_eq!(calendar.normalize_finish(at(2024, 1, 2, 10, 0)), at(2024, 1, 2, 10, 0));
}

#[test]
fn nearest_working_boundaries() {
    let calendar = standard();
    assert_eq!(calendar.next_work_start(at(2024, 1, 1, 12, 30)), at(2024, 1, 1, 13, 0));
    assert_eq!(calendar.next_work_start(at(2024, 1, 6, 9, 0)), at(2024, 1, 8, 8, 0));
    assert_eq!(calendar.next_work_start(at(2024, 1, 1, 9, 0)), at(2024, 1, 1, 9, 0));
    assert_eq!(calendar.previous_work_finish(at(2024, 1, 1, 12, 30)), at(2024, 1, 1, 12, 0));
    assert_eq!(calendar.previous_work_finish(at(2024, 1, 8, 7, 0)), at(2024, 1, 5, 17, 0));
}

#[test]
fn derived_calendar_inherits_from_parent() {
    let mut keeper = CalendarKeeper::new();
    let mut base = standard();
    base.add_exception(CalendarException::new(day(2024, 1, 1), day(2024, 1, 1), vec![]));
    base.add_exception(CalendarException::new(day(2024, 1, 6), day(2024, 1, 6), vec![]));
    let base = keeper.keep(base);

    let mut derived = Calendar::new(2, "Six days");
    derived.set_parent(Some(Arc::clone(&base)));
    derived.set_day(Weekday::Sat, WorkingRange::from_hm((8, 0), (12, 0)).into_iter().collect());
    let derived = keeper.keep(derived);

    assert_eq!(derived.day_hours(Weekday::Mon).len(), 2, "weekday inherited");
    assert!(derived.hours(day(2024, 1, 1)).is_empty(), "parent exception applies when inherited");
    assert_eq!(derived.hours(day(2024, 1, 6)).len(), 1, "own Saturday beats the parent exception");
    assert_eq!(derived.capacities().minutes_per_week, 2640);
    assert_eq!(keeper.len(), 2);
    assert_eq!(keeper.get(2).map(|c| c.name().to_string()), Some("Six days".to_string()));
}
