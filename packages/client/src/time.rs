//! Timestamp rendering for post times.

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};

/// Render Unix epoch seconds as `YYYY-MM-DD HH:MM:SS` in the local time zone.
///
/// The result depends on the zone configured for the running process. Use
/// [`format_date_in`] when the output must be reproducible.
///
/// Returns `None` for timestamps outside the representable date range.
pub fn format_date(epoch_seconds: i64) -> Option<String> {
    format_date_in(epoch_seconds, &Local)
}

/// Same as [`format_date`] but in an explicit time zone.
///
/// Month, day, hour, minute and second are zero-padded to two digits; the
/// year is printed as-is.
pub fn format_date_in<Tz: TimeZone>(epoch_seconds: i64, tz: &Tz) -> Option<String> {
    let t = DateTime::from_timestamp(epoch_seconds, 0)?.with_timezone(tz);
    Some(format!(
        "{}-{:02}-{:02} {:02}:{:02}:{:02}",
        t.year(),
        t.month(),
        t.day(),
        t.hour(),
        t.minute(),
        t.second()
    ))
}
