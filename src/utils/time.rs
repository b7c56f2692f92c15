//! Time and timestamp utilities

use chrono::{DateTime, Duration, SecondsFormat, Utc};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Format a timestamp as RFC3339 at second precision with a `Z` suffix.
///
/// This is the format persisted in snapshot review entries; it parses back
/// with [`parse_rfc3339`] to the same second.
pub fn format_rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC3339 timestamp with any offset, normalised to UTC
pub fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Length of a duration in fractional days
pub fn fractional_days(duration: Duration) -> f64 {
    match duration.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0 / SECONDS_PER_DAY,
        None => duration.num_seconds() as f64 / SECONDS_PER_DAY,
    }
}

/// Duration covering a (possibly fractional) number of days
pub fn days_to_duration(days: f64) -> Duration {
    Duration::milliseconds((days * SECONDS_PER_DAY * 1000.0).round() as i64)
}
