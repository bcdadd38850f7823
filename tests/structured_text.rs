use schedule_reconcile::error::ReconcileError;
use schedule_reconcile::structured_text::{DecodeMode, StructuredTextRecord};

const CALENDAR: &str = concat!(
    "(0||CalendarData()(\r\n",
    "  (0||DaysOfWeek()(\r\n",
    "    (0||1()())\r\n",
    "    (0||2()(\r\n",
    "      (0||0(s|08:00|f|12:00)())\r\n",
    "      (0||1(s|13:00|f|17:00)())))))\r\n",
    "  (0||VIEW(ShowTotal|Y)())))"
);

#[test]
fn parses_nested_records() {
    let root = StructuredTextRecord::parse(CALENDAR).expect("parse ok");
    assert_eq!(root.name(), "CalendarData");
    assert_eq!(root.children().len(), 2);
    let days = root.child("DaysOfWeek").expect("days present");
    assert_eq!(days.children().len(), 2);
    let monday = &days.children()[1];
    assert_eq!(monday.name(), "2");
    assert_eq!(monday.children()[0].attribute("s"), Some("08:00"));
    assert_eq!(monday.children()[1].attribute("f"), Some("17:00"));
    let view = root.child("VIEW").expect("view present");
    assert_eq!(view.attribute("ShowTotal"), Some("Y"));
    assert!(view.children().is_empty());
}

#[test]
fn trailing_text_is_ignored() {
    let text = "(0||Root(a|1)()) trailing garbage ((";
    let root = StructuredTextRecord::parse(text).expect("parse ok");
    assert_eq!(root.name(), "Root");
    assert_eq!(root.attribute("a"), Some("1"));
}

#[test]
fn empty_values_and_trailing_pipe() {
    let root = StructuredTextRecord::parse("(0||Root(a||b|2|)())").expect("parse ok");
    assert_eq!(root.attribute("a"), Some(""));
    assert_eq!(root.attribute("b"), Some("2"));
}

#[test]
fn display_parses_back_to_the_same_record() {
    let record = StructuredTextRecord::new("Root")
        .with_attribute("k", "v")
        .with_child(
            StructuredTextRecord::new("A")
                .with_child(StructuredTextRecord::new("0").with_attribute("s", "08:00")),
        )
        .with_child(StructuredTextRecord::new("B"));
    let text = record.to_string();
    assert!(text.starts_with("(0||Root(k|v)("), "unexpected form: {text}");
    let parsed = StructuredTextRecord::parse(&text).expect("parse ok");
    assert_eq!(parsed, record);
}

#[test]
fn malformed_input_is_an_error_when_strict() {
    let err = StructuredTextRecord::parse("(0||Root(a|1)(").expect_err("unterminated record");
    assert!(matches!(err, ReconcileError::Parse { .. }), "got {err:?}");
}

#[test]
fn malformed_input_is_recorded_when_tolerant() {
    let mut ignored = Vec::new();
    let text = "not a record";
    let record = StructuredTextRecord::parse_with(text, DecodeMode::Tolerant, &mut ignored)
        .expect("tolerated");
    assert_eq!(record, StructuredTextRecord::default());
    assert_eq!(ignored.len(), 1);

    let strict = StructuredTextRecord::parse_with("not a record", DecodeMode::Strict, &mut ignored);
    assert!(strict.is_err());
    assert_eq!(ignored.len(), 1, "strict mode records nothing");
}

#[test]
fn truncated_input_keeps_what_was_read_when_tolerant() {
    let cut = CALENDAR.find("(0||1(s|13:00").expect("afternoon range present");
    let mut ignored = Vec::new();
    let truncated = &CALENDAR[..cut];
    let root = StructuredTextRecord::parse_with(truncated, DecodeMode::Tolerant, &mut ignored)
        .expect("tolerated");
    assert_eq!(ignored.len(), 1);
    assert_eq!(root.name(), "CalendarData");
    assert!(root.child("VIEW").is_none(), "lost with the tail");
    let monday = &root.child("DaysOfWeek").expect("days present").children()[1];
    assert_eq!(monday.children().len(), 1);
    assert_eq!(monday.children()[0].attribute("f"), Some("12:00"));
}

#[test]
fn out_of_range_record_number_is_an_error() {
    let err = StructuredTextRecord::parse("(99999999999||Root()())").expect_err("exceeds u32");
    assert!(matches!(err, ReconcileError::Parse { line: Some(1), .. }), "got {err:?}");
    let nested = StructuredTextRecord::parse("(0||Root()((4294967296||Child()())))");
    assert!(nested.is_err());
    let largest = StructuredTextRecord::parse("(4294967295||Root()())").expect("u32::MAX fits");
    assert_eq!(largest.number(), u32::MAX);
}
