mod history;
mod log;
mod register;
mod summary;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

pub(crate) use history::cmd_history;
pub(crate) use log::cmd_log;
pub(crate) use register::{cmd_profile, cmd_register};
pub(crate) use summary::cmd_summary;

/// Parse a YYYY-MM-DD argument, defaulting to today's local date.
pub(super) fn parse_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD")),
        None => Ok(Local::now().date_naive()),
    }
}

/// Inclusive UTC bounds of one local calendar day.
pub(super) fn local_day_bounds(date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = Local
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .with_context(|| format!("Cannot resolve local midnight for {date}"))?
        .with_timezone(&Utc);
    let end = start + Duration::days(1) - Duration::nanoseconds(1);
    Ok((start, end))
}

pub(super) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}
