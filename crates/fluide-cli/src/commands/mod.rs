pub mod check;
pub mod chunks;
pub mod config;
pub mod history;
pub mod key;
pub mod plan;
pub mod practice;
pub mod timer;

use chrono::{Datelike, Local, NaiveDate, Weekday};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Parse a day name, or today's weekday when none is given.
pub fn resolve_day(day: Option<&str>) -> Result<Weekday, String> {
    match day {
        Some(name) => name
            .trim()
            .parse::<Weekday>()
            .map_err(|_| format!("unknown day: {name}")),
        None => Ok(Local::now().weekday()),
    }
}

/// The local calendar date sessions are recorded under.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Current-thread runtime for the few async calls the CLI makes.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}
