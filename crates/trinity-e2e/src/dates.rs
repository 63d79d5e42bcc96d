// Date and time conversions required by the application's forms.

use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, SecondsFormat, Utc};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Converts a fixture date `dd/mm/yyyy` into the date pickers' `d/Mon/yyyy`.
///
/// An empty input yields an empty string.
pub fn ui_date(value: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Ok(String::new());
    }
    let invalid = |reason: &str| Error::InvalidFixtureValue {
        field: "date".into(),
        value: value.to_string(),
        reason: reason.to_string(),
    };
    let mut parts = value.trim().split('/');
    let (Some(day), Some(month), Some(year), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid("expected dd/mm/yyyy"));
    };
    let day: u32 = day.parse().map_err(|_| invalid("day is not a number"))?;
    let month: usize = month.parse().map_err(|_| invalid("month is not a number"))?;
    if !(1..=12).contains(&month) {
        return Err(invalid("month out of range"));
    }
    Ok(format!("{}/{}/{}", day, MONTHS[month - 1], year))
}

/// Parses an ISO calendar date (`yyyy-mm-dd`).
pub fn parse_iso_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| Error::InvalidFixtureValue {
        field: "date".into(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Monday of the ISO week containing `date`.
pub fn monday_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Whole weeks from `from` to `to` (negative when `to` is earlier).
pub fn weeks_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let days = (to - from).num_days();
    (days as f64 / 7.0).round() as i64
}

fn parse_clock(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|e| Error::InvalidFixtureValue {
        field: "time".into(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Subtracts minutes from an `HH:MM` clock time, wrapping past midnight.
pub fn subtract_minutes(time: &str, minutes: i64) -> Result<String> {
    let parsed = parse_clock(time)?;
    let shifted = parsed - Duration::minutes(minutes);
    Ok(shifted.format("%H:%M").to_string())
}

/// Calendar-style duration between two `HH:MM` times, e.g. `"1h 30m"`.
pub fn duration_label(start: &str, end: &str) -> Result<String> {
    let minutes = (parse_clock(end)? - parse_clock(start)?).num_minutes();
    Ok(format!("{}h {}m", minutes.div_euclid(60), minutes.rem_euclid(60)))
}

/// Shifts an RFC 3339 timestamp by whole hours and renders it in UTC with
/// millisecond precision. Empty input passes through unchanged.
pub fn shift_iso(value: &str, hours: i64) -> Result<String> {
    if value.trim().is_empty() {
        return Ok(value.to_string());
    }
    let parsed = DateTime::parse_from_rfc3339(value.trim()).map_err(|e| {
        Error::InvalidFixtureValue {
            field: "timestamp".into(),
            value: value.to_string(),
            reason: e.to_string(),
        }
    })?;
    let shifted = parsed.with_timezone(&Utc) + Duration::hours(hours);
    Ok(shifted.to_rfc3339_opts(SecondsFormat::Millis, true))
}
