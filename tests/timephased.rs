use chrono::{NaiveDate, NaiveDateTime};
use schedule_reconcile::calendar::Calendar;
use schedule_reconcile::duration::Duration;
use schedule_reconcile::error::ReconcileError;
use schedule_reconcile::timephased::{
    Provenance, TimephasedCodec, TimephasedCurve, TimephasedSample,
};

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
}

fn standard() -> Calendar {
    let mut calendar = Calendar::new(1, "Standard");
    calendar.ensure_working_time();
    calendar
}

fn codec() -> TimephasedCodec {
    TimephasedCodec::for_provenance(Provenance::Native).expect("native data has a codec")
}

#[test]
fn foreign_data_has_no_codec() {
    assert!(TimephasedCodec::for_provenance(Provenance::Foreign).is_none());
    assert_eq!(Provenance::default(), Provenance::Foreign);
}

#[test]
fn decodes_runs_over_working_days() {
    let calendar = standard();
    let anchor = Some(at(2024, 1, 1, 8, 0));
    let curve = codec().decode(&calendar, anchor, Some("0*3=8;4=4")).expect("decode ok");
    let starts: Vec<NaiveDateTime> = curve.samples().iter().map(|s| s.start).collect();
    let expected = vec![
        at(2024, 1, 1, 8, 0),
        at(2024, 1, 2, 8, 0),
        at(2024, 1, 3, 8, 0),
        at(2024, 1, 5, 8, 0),
    ];
    assert_eq!(starts, expected);
    assert_eq!(curve.samples()[3].work, Duration::hours(4.0));
    assert_eq!(curve.total_hours(&calendar), 28.0);
}

#[test]
fn periods_skip_non_working_days() {
    let calendar = standard();
    // anchored on a Friday afternoon, the next period is Monday morning
    let anchor = Some(at(2024, 1, 5, 13, 0));
    let curve = codec().decode(&calendar, anchor, Some("0*2=4")).expect("decode ok");
    assert_eq!(curve.samples()[0].start, at(2024, 1, 5, 13, 0));
    assert_eq!(curve.samples()[1].start, at(2024, 1, 8, 8, 0));
}

#[test]
fn absent_curve_decodes_empty() {
    let calendar = standard();
    let anchor = Some(at(2024, 1, 1, 8, 0));
    assert!(codec().decode(&calendar, anchor, None).expect("ok").is_empty());
    assert!(codec().decode(&calendar, anchor, Some("")).expect("ok").is_empty());
    assert!(codec().decode(&calendar, None, Some("0=8")).expect("ok").is_empty(), "no anchor");
}

#[test]
fn encode_inverts_decode() {
    let calendar = standard();
    let anchor = at(2024, 1, 3, 10, 0);
    for encoded in ["0*3=8;4=4", "0=6;1*4=8;7=2.5", "2=8"] {
        let curve = codec().decode(&calendar, Some(anchor), Some(encoded)).expect("decode ok");
        assert_eq!(codec().encode(&calendar, anchor, &curve).expect("encode ok"), encoded);
    }
}

#[test]
fn encode_collapses_equal_periods() {
    let calendar = standard();
    let samples = (1..=5)
        .map(|d| TimephasedSample { start: at(2024, 1, d, 8, 0), work: Duration::hours(8.0) })
        .collect();
    let curve = TimephasedCurve::new(samples);
    let encoded = codec().encode(&calendar, at(2024, 1, 1, 8, 0), &curve).expect("encode ok");
    assert_eq!(encoded, "0*5=8");
}

#[test]
fn malformed_curves_are_errors() {
    let calendar = standard();
    let anchor = Some(at(2024, 1, 1, 8, 0));
    let overlap = codec().decode(&calendar, anchor, Some("0*3=8;1=4"));
    assert!(matches!(overlap, Err(ReconcileError::Curve(_))));
    let garbage = codec().decode(&calendar, anchor, Some("x=1"));
    assert!(matches!(garbage, Err(ReconcileError::Curve(_))));

    let sample = TimephasedSample { start: at(2023, 12, 29, 8, 0), work: Duration::hours(8.0) };
    let early = TimephasedCurve::new(vec![sample]);
    let encoded = codec().encode(&calendar, at(2024, 1, 1, 8, 0), &early);
    assert!(encoded.is_err(), "sample before the anchor");
}

#[test]
fn oversized_runs_are_errors() {
    let calendar = standard();
    let anchor = Some(at(2024, 1, 1, 8, 0));
    let overflow = codec().decode(&calendar, anchor, Some("1*18446744073709551615=8"));
    assert!(matches!(overflow, Err(ReconcileError::Curve(_))), "got {overflow:?}");
    let huge = codec().decode(&calendar, anchor, Some("0*100000000=8"));
    assert!(matches!(huge, Err(ReconcileError::Curve(_))), "got {huge:?}");
    let late = codec().decode(&calendar, anchor, Some("0=8;36600=8"));
    assert!(matches!(late, Err(ReconcileError::Curve(_))), "got {late:?}");
}

#[test]
fn calendar_without_work_cannot_anchor_a_curve() {
    let empty = Calendar::new(2, "Empty");
    let decoded = codec().decode(&empty, Some(at(2024, 1, 1, 8, 0)), Some("0=8"));
    assert!(matches!(decoded, Err(ReconcileError::Curve(_))), "got {decoded:?}");
}
