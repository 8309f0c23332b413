//! Calendar keys used to bucket completions.
//!
//! Completions are keyed by UTC date (`YYYY-MM-DD`); weekly counters and
//! weekly-rate progression are keyed by ISO-8601 week (`YYYY-Www`).

use chrono::{DateTime, Datelike, Duration, Utc};

/// Date key for the given instant
pub fn date_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// Date key of the day before the given instant
pub fn previous_date_key(at: DateTime<Utc>) -> String {
    date_key(at - Duration::days(1))
}

/// ISO week key for the given instant
///
/// Uses the ISO week-numbering year, so the last days of December can
/// belong to week 1 of the following year.
pub fn week_key(at: DateTime<Utc>) -> String {
    let week = at.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}
