//! Resolved-per-day series over a rolling 30-day window.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::types::Issue;

pub const TREND_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub day: NaiveDate,
    /// Short label such as "Oct 7".
    pub date: String,
    pub count: usize,
}

/// One point per UTC calendar day from `now - 29d` through `now`, oldest first.
pub fn resolution_trends(issues: &[Issue], now: DateTime<Utc>) -> Vec<TrendPoint> {
    let mut per_day: HashMap<NaiveDate, usize> = HashMap::new();
    for ts in issues
        .iter()
        .filter(|i| i.status.is_done())
        .filter_map(Issue::resolution_timestamp)
    {
        *per_day.entry(ts.date_naive()).or_insert(0) += 1;
    }

    (0..TREND_DAYS)
        .rev()
        .map(|offset| {
            let day = (now - Duration::days(offset)).date_naive();
            TrendPoint {
                day,
                date: day.format("%b %-d").to_string(),
                count: per_day.get(&day).copied().unwrap_or(0),
            }
        })
        .collect()
}
