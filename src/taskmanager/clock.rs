//! UTC timestamps and calendar dates as ISO-8601 text

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Current UTC time, e.g. `2024-03-09T17:05:00Z`
pub fn now() -> String {
    timestamp(Utc::now())
}

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Calendar date of a `YYYY-MM-DD` date or an RFC 3339 timestamp
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|at| at.date_naive()))
}

/// Whether `due` lies strictly before `today`; empty means no due date
pub fn is_past(due: &str, today: NaiveDate) -> bool {
    parse_date(due).map_or(false, |due| due < today)
}
