//! Headline KPIs: totals, week-over-week deltas and resolution time.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::time::{days_between, in_window, percent_change, round_half_away};
use crate::types::Issue;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_issues: usize,
    pub open_issues: usize,
    pub resolved_this_week: usize,
    /// Only feeds `resolved_change`.
    #[serde(skip)]
    pub resolved_last_week: usize,
    /// Whole days.
    pub avg_resolution_time: i64,
    pub open_change: i64,
    pub resolved_change: i64,
    pub resolution_time_change: i64,
}

pub fn compute_metrics(issues: &[Issue], now: DateTime<Utc>) -> DashboardMetrics {
    let week_ago = now - Duration::days(7);
    let two_weeks_ago = now - Duration::days(14);

    let resolved: Vec<&Issue> = issues.iter().filter(|i| i.status.is_done()).collect();

    let resolved_between = |start, end| {
        resolved
            .iter()
            .filter_map(|i| i.resolution_timestamp())
            .filter(|ts| in_window(*ts, start, end))
            .count()
    };
    let resolved_this_week = resolved_between(week_ago, now);
    let resolved_last_week = resolved_between(two_weeks_ago, week_ago);

    let still_open_created_between = |start, end| {
        issues
            .iter()
            .filter(|i| i.status.is_active())
            .filter_map(|i| i.created_date)
            .filter(|created| in_window(*created, start, end))
            .count() as i64
    };
    let open_change =
        still_open_created_between(week_ago, now) - still_open_created_between(two_weeks_ago, week_ago);

    let avg_resolution_time = mean_resolution_days(resolved.iter().copied())
        .map(round_half_away)
        .unwrap_or(0);
    let previous_avg = mean_resolution_days(
        resolved
            .iter()
            .copied()
            .filter(|i| i.resolution_timestamp().is_some_and(|ts| ts < week_ago)),
    )
    .map(round_half_away)
    .unwrap_or(0);

    DashboardMetrics {
        total_issues: issues.len(),
        open_issues: issues.iter().filter(|i| i.status.is_active()).count(),
        resolved_this_week,
        resolved_last_week,
        avg_resolution_time,
        open_change,
        resolved_change: percent_change(resolved_this_week as f64, resolved_last_week as f64),
        resolution_time_change: percent_change(avg_resolution_time as f64, previous_avg as f64),
    }
}

/// Mean days from creation to resolution; `None` when no issue has both dates.
fn mean_resolution_days<'a>(issues: impl Iterator<Item = &'a Issue>) -> Option<f64> {
    let (total, count) = issues
        .filter_map(|i| Some(days_between(i.created_date?, i.resolution_timestamp()?)))
        .fold((0.0, 0usize), |(total, count), days| (total + days, count + 1));

    (count > 0).then(|| total / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::{issue, now};
    use crate::types::IssueStatus;

    #[test]
    fn single_resolved_issue_scenario() {
        let now = now();
        let issues = vec![issue(1, IssueStatus::Resolved)
            .created(now - Duration::days(5))
            .updated(now - Duration::days(2))];

        let metrics = compute_metrics(&issues, now);
        assert_eq!(metrics.total_issues, 1);
        assert_eq!(metrics.open_issues, 0);
        assert_eq!(metrics.resolved_this_week, 1);
        assert_eq!(metrics.avg_resolution_time, 3);
        assert_eq!(metrics.resolved_change, 0);
    }

    #[test]
    fn counts_open_and_in_progress_as_open() {
        let now = now();
        let issues = vec![
            issue(1, IssueStatus::Open),
            issue(2, IssueStatus::InProgress),
            issue(3, IssueStatus::Closed),
            issue(4, IssueStatus::Other("blocked".to_string())),
        ];
        let metrics = compute_metrics(&issues, now);
        assert_eq!(metrics.total_issues, 4);
        assert_eq!(metrics.open_issues, 2);
    }

    #[test]
    fn resolved_change_is_zero_without_last_week() {
        let now = now();
        let issues: Vec<_> = (1..=4)
            .map(|id| {
                issue(id, IssueStatus::Closed)
                    .created(now - Duration::days(3))
                    .updated(now - Duration::days(1))
            })
            .collect();

        let metrics = compute_metrics(&issues, now);
        assert_eq!(metrics.resolved_this_week, 4);
        assert_eq!(metrics.resolved_last_week, 0);
        assert_eq!(metrics.resolved_change, 0);
    }

    #[test]
    fn resolved_change_compares_weeks() {
        let now = now();
        let this_week = (1..=3).map(|id| {
            issue(id, IssueStatus::Resolved)
                .created(now - Duration::days(20))
                .updated(now - Duration::days(2))
        });
        let last_week = (4..=5).map(|id| {
            issue(id, IssueStatus::Resolved)
                .created(now - Duration::days(20))
                .updated(now - Duration::days(10))
        });
        let issues: Vec<_> = this_week.chain(last_week).collect();

        let metrics = compute_metrics(&issues, now);
        assert_eq!(metrics.resolved_this_week, 3);
        assert_eq!(metrics.resolved_last_week, 2);
        assert_eq!(metrics.resolved_change, 50);
    }

    #[test]
    fn window_boundaries() {
        let now = now();
        let issues = vec![
            // exactly a week ago: this week
            issue(1, IssueStatus::Resolved).updated(now - Duration::days(7)),
            // exactly two weeks ago: last week
            issue(2, IssueStatus::Resolved).updated(now - Duration::days(14)),
            // resolved "now" is outside [now-7d, now)
            issue(3, IssueStatus::Resolved).updated(now),
        ];
        let metrics = compute_metrics(&issues, now);
        assert_eq!(metrics.resolved_this_week, 1);
        assert_eq!(metrics.resolved_last_week, 1);
    }

    #[test]
    fn missing_updated_date_falls_back_to_created() {
        let now = now();
        let issues = vec![issue(1, IssueStatus::Closed).created(now - Duration::days(1))];
        let metrics = compute_metrics(&issues, now);
        assert_eq!(metrics.resolved_this_week, 1);
        assert_eq!(metrics.avg_resolution_time, 0);
    }

    #[test]
    fn issues_without_dates_drop_out_of_date_buckets() {
        let now = now();
        let undated = issue(1, IssueStatus::Resolved);
        assert!(undated.created_date.is_none());

        let metrics = compute_metrics(&[undated], now);
        assert_eq!(metrics.total_issues, 1);
        assert_eq!(metrics.resolved_this_week, 0);
        assert_eq!(metrics.avg_resolution_time, 0);
    }

    #[test]
    fn open_change_compares_creation_weeks() {
        let now = now();
        let issues = vec![
            issue(1, IssueStatus::Open).created(now - Duration::days(1)),
            issue(2, IssueStatus::InProgress).created(now - Duration::days(2)),
            issue(3, IssueStatus::Open).created(now - Duration::days(3)),
            // created this week but already done: not counted
            issue(4, IssueStatus::Resolved).created(now - Duration::days(1)),
            issue(5, IssueStatus::Open).created(now - Duration::days(9)),
        ];
        assert_eq!(compute_metrics(&issues, now).open_change, 2);
    }

    #[test]
    fn resolution_time_change_against_older_resolutions() {
        let now = now();
        let issues = vec![
            // resolved long ago, took 2 days
            issue(1, IssueStatus::Resolved)
                .created(now - Duration::days(30))
                .updated(now - Duration::days(28)),
            // resolved this week, took 6 days
            issue(2, IssueStatus::Resolved)
                .created(now - Duration::days(7))
                .updated(now - Duration::days(1)),
        ];

        let metrics = compute_metrics(&issues, now);
        assert_eq!(metrics.avg_resolution_time, 4);
        assert_eq!(metrics.resolution_time_change, 100);
    }

    #[test]
    fn resolution_time_change_zero_without_older_resolutions() {
        let now = now();
        let issues = vec![issue(1, IssueStatus::Resolved)
            .created(now - Duration::days(6))
            .updated(now - Duration::days(1))];
        assert_eq!(compute_metrics(&issues, now).resolution_time_change, 0);
    }

    #[test]
    fn empty_input() {
        assert_eq!(compute_metrics(&[], now()), DashboardMetrics::default());
    }

    #[test]
    fn serialises_without_internal_counter() {
        let value = serde_json::to_value(compute_metrics(&[], now())).unwrap();
        assert!(value.get("resolvedLastWeek").is_none());
        assert!(value.get("avgResolutionTime").is_some());
    }
}
