use std::fs;

use schedule_reconcile::schedule::{CriticalActivityType, Schedule};
use schedule_reconcile::settings::Settings;
use schedule_reconcile::structured_text::DecodeMode;
use schedule_reconcile::timephased::Provenance;

#[test]
fn missing_file_gives_defaults() {
    let settings = Settings::load(Some("does/not/exist.json")).expect("optional file");
    assert_eq!(settings.decode_mode, DecodeMode::Strict);
    assert_eq!(settings.provenance, Provenance::Foreign);
    assert_eq!(settings.critical_activity_type, CriticalActivityType::TotalFloat);
    assert_eq!(settings.log_filter, "info");
}

#[test]
fn file_values_reach_the_schedule() {
    let path = std::env::temp_dir().join(format!("reconcile-settings-{}.json", std::process::id()));
    let json = r#"{
        "decode_mode": "tolerant",
        "provenance": "native",
        "critical_activity_type": "longest_path"
    }"#;
    fs::write(&path, json).expect("write settings");
    let settings = Settings::load(path.to_str()).expect("settings load");
    fs::remove_file(&path).ok();

    assert_eq!(settings.decode_mode, DecodeMode::Tolerant);
    assert_eq!(settings.log_filter, "info", "unset keys keep their default");
    let schedule = Schedule::with_settings(&settings);
    assert_eq!(schedule.provenance, Provenance::Native);
    assert_eq!(schedule.critical_activity_type, CriticalActivityType::LongestPath);
    assert!(schedule.timephased_codec().is_some());
}
