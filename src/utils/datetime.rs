use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Wire format for event dates, e.g. `01-02-2026 13:00`.
pub const EVENT_DATE_FORMAT: &str = "%d-%m-%Y %H:%M";

pub fn format_event_date(date: DateTime<Utc>) -> String {
    date.format(EVENT_DATE_FORMAT).to_string()
}

/// Parses a `dd-MM-yyyy HH:mm` string into a UTC timestamp. Returns `None`
/// when the input does not match the format.
pub fn parse_event_date(input: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(input, EVENT_DATE_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
