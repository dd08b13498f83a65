//! Unfinished issues past their due date.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::time::MILLIS_PER_DAY;
use crate::types::Issue;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueIssue {
    #[serde(flatten)]
    pub issue: Issue,
    pub overdue_days: i64,
}

/// Most overdue first. Callers slice if they want a top-N.
pub fn overdue_issues(issues: &[Issue], now: DateTime<Utc>) -> Vec<OverdueIssue> {
    let mut overdue: Vec<OverdueIssue> = issues
        .iter()
        .filter(|i| !i.status.is_done())
        .filter_map(|issue| {
            let due = issue.due_date.filter(|due| *due < now)?;
            Some(OverdueIssue {
                issue: issue.clone(),
                overdue_days: ceil_days(now.signed_duration_since(due).num_milliseconds()),
            })
        })
        .collect();

    overdue.sort_by(|a, b| b.overdue_days.cmp(&a.overdue_days));
    overdue
}

fn ceil_days(millis: i64) -> i64 {
    (millis + MILLIS_PER_DAY - 1).div_euclid(MILLIS_PER_DAY)
}
