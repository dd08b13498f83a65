//! Dashboard aggregation over an in-memory issue snapshot.
//!
//! Every engine is a pure function of `(&[Issue], now)`. `now` is passed in
//! rather than read from the clock so results are reproducible.

pub mod breakdown;
pub mod feed;
pub mod metrics;
pub mod overdue;
pub mod time;
pub mod trends;
pub mod workload;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::store::IssueStore;
use crate::types::Issue;

pub use breakdown::{priority_distribution, status_breakdown, PriorityCount, StatusCount};
pub use feed::{recent_activity, FeedEntry, FeedKind};
pub use metrics::{compute_metrics, DashboardMetrics};
pub use overdue::{overdue_issues, OverdueIssue};
pub use trends::{resolution_trends, TrendPoint};
pub use workload::{assignee_workload, WorkloadEntry};

/// Everything the dashboard shows, computed from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub metrics: DashboardMetrics,
    pub status_breakdown: Vec<StatusCount>,
    pub priority_distribution: Vec<PriorityCount>,
    pub resolution_trends: Vec<TrendPoint>,
    pub assignee_workload: Vec<WorkloadEntry>,
    pub overdue_issues: Vec<OverdueIssue>,
    pub recent_activity: Vec<FeedEntry>,
}

impl Dashboard {
    pub fn compute(issues: &[Issue], now: DateTime<Utc>) -> Self {
        Self {
            generated_at: now,
            metrics: compute_metrics(issues, now),
            status_breakdown: status_breakdown(issues),
            priority_distribution: priority_distribution(issues),
            resolution_trends: resolution_trends(issues, now),
            assignee_workload: assignee_workload(issues),
            overdue_issues: overdue_issues(issues, now),
            recent_activity: recent_activity(issues, now),
        }
    }
}

/// Fetch the full issue set once and aggregate it. A failed fetch is
/// returned unchanged; nothing is computed from partial data.
pub async fn load_dashboard<S>(store: &S, now: DateTime<Utc>) -> Result<Dashboard>
where
    S: IssueStore + ?Sized,
{
    let issues = store.fetch_all_issues().await?;
    debug!(issues = issues.len(), "Aggregating dashboard");
    Ok(Dashboard::compute(&issues, now))
}
