//! Date arithmetic shared by the dashboard engines.

use chrono::{DateTime, Utc};

pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Round to the nearest integer, halves away from zero.
pub fn round_half_away(value: f64) -> i64 {
    value.round() as i64
}

/// Whole-percent change from `previous` to `current`; 0 when there is no
/// previous value to compare against.
pub fn percent_change(current: f64, previous: f64) -> i64 {
    if previous == 0.0 {
        return 0;
    }
    round_half_away((current - previous) / previous * 100.0)
}

/// Fractional days from `start` to `end`.
pub fn days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    end.signed_duration_since(start).num_milliseconds() as f64 / MILLIS_PER_DAY as f64
}

/// `start <= ts < end`
pub fn in_window(ts: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    ts >= start && ts < end
}

/// Relative label such as "5m ago". Always floors; future timestamps read
/// as "Just now".
pub fn time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(timestamp).num_seconds();

    if seconds < 60 {
        "Just now".to_string()
    } else if seconds < 3_600 {
        format!("{}m ago", seconds / 60)
    } else if seconds < 86_400 {
        format!("{}h ago", seconds / 3_600)
    } else {
        format!("{}d ago", seconds / 86_400)
    }
}
