//! Recent "created" and "resolved" events for the dashboard feed.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::time::time_ago;
use crate::types::Issue;

pub const FEED_WINDOW_DAYS: i64 = 3;
/// Per event kind, before merging.
pub const FEED_SOURCE_LIMIT: usize = 5;
pub const FEED_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Created,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    #[serde(rename = "type")]
    pub kind: FeedKind,
    pub issue_id: i64,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl FeedEntry {
    /// Relative label, evaluated when read rather than when built.
    pub fn time_ago(&self, now: DateTime<Utc>) -> String {
        time_ago(self.timestamp, now)
    }
}

/// Merge the first five creations and first five resolutions of the last
/// three days, newest first, at most ten entries.
pub fn recent_activity(issues: &[Issue], now: DateTime<Utc>) -> Vec<FeedEntry> {
    let since = now - Duration::days(FEED_WINDOW_DAYS);
    let in_window = |ts: &DateTime<Utc>| *ts >= since && *ts <= now;

    let created = issues
        .iter()
        .filter_map(|issue| {
            let ts = issue.created_date.filter(in_window)?;
            Some(FeedEntry {
                kind: FeedKind::Created,
                issue_id: issue.id,
                description: format!("New issue \"{}\" was created", issue.title),
                timestamp: ts,
            })
        })
        .take(FEED_SOURCE_LIMIT);

    let resolved = issues
        .iter()
        .filter(|issue| issue.status.is_done())
        .filter_map(|issue| {
            let ts = issue.resolution_timestamp().filter(in_window)?;
            Some(FeedEntry {
                kind: FeedKind::Resolved,
                issue_id: issue.id,
                description: format!("Issue \"{}\" was resolved", issue.title),
                timestamp: ts,
            })
        })
        .take(FEED_SOURCE_LIMIT);

    let mut feed: Vec<FeedEntry> = created.chain(resolved).collect();
    feed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    feed.truncate(FEED_LIMIT);
    feed
}
