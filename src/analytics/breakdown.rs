//! Status and priority count tables.

use serde::Serialize;

use crate::types::{Issue, IssueStatus, Priority};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: IssueStatus,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityCount {
    pub priority: Priority,
    pub label: String,
    pub count: usize,
}

/// Group by status, in order of first occurrence.
pub fn status_breakdown(issues: &[Issue]) -> Vec<StatusCount> {
    let mut breakdown: Vec<StatusCount> = Vec::new();

    for issue in issues {
        match breakdown.iter_mut().find(|row| row.status == issue.status) {
            Some(row) => row.count += 1,
            None => breakdown.push(StatusCount {
                status: issue.status.clone(),
                label: issue.status.label().to_string(),
                count: 1,
            }),
        }
    }

    breakdown
}

/// Dense histogram over critical, high, medium, low (always four rows).
///
/// Issues with any other priority are not counted, so the rows sum to the
/// issue total only when every issue uses one of the four.
pub fn priority_distribution(issues: &[Issue]) -> Vec<PriorityCount> {
    Priority::KNOWN
        .iter()
        .map(|priority| PriorityCount {
            priority: priority.clone(),
            label: priority.label().to_string(),
            count: issues.iter().filter(|i| &i.priority == priority).count(),
        })
        .collect()
}
