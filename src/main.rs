//!
//! Decodes the calendar data field stored in a file and shows what it
//! resolves to: the weekly pattern, the exceptions, the capacities and the
//! text the calendar is written back as.
//!
//! Usage: `schedule_reconcile <calendar data file> [settings file]`
//!

use std::{env, fs, process};

use chrono::Weekday;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use schedule_reconcile::calendar::{WEEK, WorkingRange};
use schedule_reconcile::calendar_text::{CalendarDecoder, encode_calendar_data};
use schedule_reconcile::error::{ReconcileError, Result};
use schedule_reconcile::settings::Settings;

fn describe(ranges: &[WorkingRange]) -> String {
    if ranges.is_empty() {
        return String::from("non-working");
    }
    ranges
        .iter()
        .map(|r| format!("{}-{}", r.start().format("%H:%M"), r.end().format("%H:%M")))
        .collect::<Vec<_>>()
        .join(", ")
}

fn run(data_file: &str, settings: &Settings) -> Result<()> {
    let data = fs::read_to_string(data_file)
        .map_err(|e| ReconcileError::Config(format!("cannot read {data_file}: {e}")))?;
    let mut ignored = Vec::new();
    let calendar = CalendarDecoder::new(settings.decode_mode).read(
        1,
        data_file,
        None,
        Some(&data),
        [None; 4],
        &mut ignored,
    )?;
    info!(ignored = ignored.len(), exceptions = calendar.exceptions().len(), "calendar decoded");
    for e in &ignored {
        println!("ignored: {e}");
    }

    for day in WEEK {
        let label = match day {
            Weekday::Sun => "Sun",
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
            Weekday::Sat => "Sat",
        };
        println!("{label}  {}", describe(calendar.day_hours(day)));
    }
    for (date, ranges) in calendar.resolved_exceptions() {
        println!("{date}  {}", describe(&ranges));
    }
    let capacities = calendar.capacities();
    println!(
        "minutes per day {}, week {}, month {}, year {}",
        capacities.minutes_per_day,
        capacities.minutes_per_week,
        capacities.minutes_per_month,
        capacities.minutes_per_year
    );
    println!("{}", encode_calendar_data(&calendar));
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let Some(data_file) = args.get(1) else {
        let program = args.first().map(String::as_str).unwrap_or("schedule_reconcile");
        eprintln!("usage: {program} <calendar data file> [settings file]");
        process::exit(2);
    };
    let settings = match Settings::load(args.get(2).map(String::as_str)) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            process::exit(2);
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .init();

    if let Err(e) = run(data_file, &settings) {
        error!(error = %e, "calendar could not be decoded");
        process::exit(1);
    }
}
