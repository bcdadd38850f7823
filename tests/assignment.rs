use chrono::{NaiveDate, NaiveDateTime};
use schedule_reconcile::assignment::{Assignment, EncodedCurves};
use schedule_reconcile::calendar::Calendar;
use schedule_reconcile::schedule::Schedule;
use schedule_reconcile::structured_text::DecodeMode;
use schedule_reconcile::task::NodeIndex;
use schedule_reconcile::timephased::Provenance;

fn at(d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
}

fn schedule(provenance: Provenance) -> (Schedule, NodeIndex) {
    let mut schedule = Schedule::new();
    schedule.provenance = provenance;
    let mut calendar = Calendar::new(1, "Standard");
    calendar.ensure_working_time();
    schedule.calendars.keep(calendar);
    schedule.default_calendar = Some(1);
    let task = schedule.tasks.add_activity(1, "Pour", None).unwrap();
    let dates = &mut schedule.tasks.get_mut(task).dates;
    dates.planned_start = Some(at(1, 8));
    dates.actual_start = Some(at(2, 8));
    dates.remaining_early_start = Some(at(4, 8));
    (schedule, task)
}

fn curves() -> EncodedCurves {
    EncodedCurves {
        planned: Some("0*5=8".into()),
        actual: Some("0*2=8".into()),
        remaining: Some("0=4;1=8".into()),
    }
}

#[test]
fn curves_are_anchored_per_kind() {
    let (mut schedule, task) = schedule(Provenance::Native);
    let mut assignment = Assignment::new(task, 7);
    schedule.read_curves(&mut assignment, &curves()).expect("read ok");
    assert_eq!(assignment.planned.len(), 5);
    assert_eq!(assignment.planned.samples()[0].start, at(1, 8));
    assert_eq!(assignment.actual.samples()[0].start, at(2, 8));
    assert_eq!(assignment.remaining.samples()[1].start, at(5, 8));

    let written = schedule.write_curves(&assignment).expect("write ok");
    assert_eq!(written.planned.as_deref(), Some("0*5=8"));
    assert_eq!(written.actual.as_deref(), Some("0*2=8"));
    assert_eq!(written.remaining.as_deref(), Some("0=4;1=8"));
}

#[test]
fn assignment_starts_take_precedence_over_the_task() {
    let (mut schedule, task) = schedule(Provenance::Native);
    let mut assignment = Assignment::new(task, 7);
    // the resource joins the work two days after the task's planned start
    assignment.planned_start = Some(at(3, 8));
    assignment.actual_start = Some(at(3, 13));
    schedule.read_curves(&mut assignment, &curves()).expect("read ok");
    assert_eq!(assignment.planned.samples()[0].start, at(3, 8));
    assert_eq!(assignment.planned.samples()[4].start, at(9, 8), "periods skip the weekend");
    assert_eq!(assignment.actual.samples()[0].start, at(3, 13));
    assert_eq!(assignment.actual.samples()[1].start, at(4, 8));
    assert_eq!(assignment.remaining.samples()[0].start, at(4, 8), "falls back to the task");

    let written = schedule.write_curves(&assignment).expect("write ok");
    assert_eq!(written.planned.as_deref(), Some("0*5=8"));
    assert_eq!(written.actual.as_deref(), Some("0*2=8"));
}

#[test]
fn foreign_curves_are_not_decoded() {
    let (mut schedule, task) = schedule(Provenance::Foreign);
    let mut assignment = Assignment::new(task, 7);
    schedule.read_curves(&mut assignment, &curves()).expect("read ok");
    assert!(assignment.planned.is_empty());
    assert!(schedule.write_curves(&assignment).expect("write ok").planned.is_none());
}

#[test]
fn bad_curve_is_recorded_when_tolerant() {
    let (mut schedule, task) = schedule(Provenance::Native);
    schedule.decode_mode = DecodeMode::Tolerant;
    let mut assignment = Assignment::new(task, 7);
    let encoded = EncodedCurves { planned: Some("garbage".into()), ..curves() };
    schedule.read_curves(&mut assignment, &encoded).expect("tolerated");
    assert!(assignment.planned.is_empty());
    assert_eq!(assignment.actual.len(), 2);
    assert_eq!(schedule.ignored_errors().len(), 1);

    schedule.decode_mode = DecodeMode::Strict;
    assert!(schedule.read_curves(&mut Assignment::new(task, 8), &encoded).is_err());
}
