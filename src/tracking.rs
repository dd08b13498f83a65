//! Turns issue updates into activity-log entries.

use tracing::debug;

use crate::error::Result;
use crate::store::IssueStore;
use crate::types::{initials, Activity, ActivityType, Issue, IssueUpdate, NewActivity, UNASSIGNED};

const EMPTY_VALUE: &str = "none";

/// Result of an update that was diffed and logged.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedUpdate {
    pub issue: Issue,
    pub activities: Vec<Activity>,
}

/// One activity per tracked field the update actually changes. Untracked
/// fields (title, description, type, project) produce nothing.
pub fn diff_issue(before: &Issue, update: &IssueUpdate, author: Option<&str>) -> Vec<NewActivity> {
    let mut changes = Vec::new();

    if let Some(status) = &update.status {
        if *status != before.status {
            changes.push((
                ActivityType::StatusChange,
                "status",
                before.status.as_str().to_string(),
                status.as_str().to_string(),
            ));
        }
    }
    if let Some(assignee) = &update.assignee {
        if assignee.trim() != before.assignee.trim() {
            changes.push((
                ActivityType::AssigneeChange,
                "assignee",
                assignee_value(&before.assignee),
                assignee_value(assignee),
            ));
        }
    }
    if let Some(priority) = &update.priority {
        if *priority != before.priority {
            changes.push((
                ActivityType::PriorityChange,
                "priority",
                before.priority.as_str().to_string(),
                priority.as_str().to_string(),
            ));
        }
    }
    if let Some(labels) = &update.labels {
        if *labels != before.labels {
            changes.push((
                ActivityType::LabelChange,
                "labels",
                labels_value(&before.labels),
                labels_value(labels),
            ));
        }
    }
    if let Some(due_date) = update.due_date {
        let (old, new) = (
            before.due_date.map(|d| d.date_naive()),
            due_date.map(|d| d.date_naive()),
        );
        if old != new {
            let render = |d: Option<chrono::NaiveDate>| {
                d.map_or_else(|| EMPTY_VALUE.to_string(), |d| d.format("%Y-%m-%d").to_string())
            };
            changes.push((ActivityType::DueDateChange, "due date", render(old), render(new)));
        }
    }

    let author = author.map(str::trim).filter(|a| !a.is_empty());
    changes
        .into_iter()
        .map(|(activity_type, field, old_value, new_value)| NewActivity {
            issue_id: before.id,
            activity_type,
            content: format!("changed **{field}** from **{old_value}** to **{new_value}**"),
            author_name: author.map(String::from),
            author_avatar: author.map(initials),
            field_changed: field.to_string(),
            old_value,
            new_value,
        })
        .collect()
}

fn assignee_value(assignee: &str) -> String {
    let assignee = assignee.trim();
    if assignee.is_empty() {
        UNASSIGNED.to_string()
    } else {
        assignee.to_string()
    }
}

fn labels_value(labels: &[String]) -> String {
    if labels.is_empty() {
        EMPTY_VALUE.to_string()
    } else {
        labels.join(", ")
    }
}

/// Update an issue and record an activity for each tracked change.
pub async fn apply_update<S>(
    store: &S,
    id: i64,
    update: IssueUpdate,
    author: Option<&str>,
) -> Result<TrackedUpdate>
where
    S: IssueStore + ?Sized,
{
    let before = store.fetch_issue(id).await?;
    let changes = diff_issue(&before, &update, author);
    let issue = store.update_issue(id, update).await?;

    let mut activities = Vec::with_capacity(changes.len());
    for change in changes {
        activities.push(store.record_activity(change).await?);
    }
    debug!(id, recorded = activities.len(), "Tracked issue update");

    Ok(TrackedUpdate { issue, activities })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{IssueStatus, NewIssue, Priority};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn issue() -> Issue {
        NewIssue {
            title: "Export fails".to_string(),
            description: "CSV export returns 500".to_string(),
            assignee: "Mike Chen".to_string(),
            project: "Analytics Dashboard".to_string(),
            labels: vec!["export".to_string()],
            ..Default::default()
        }
        .into_issue(4, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn status_change_is_recorded() {
        let update = IssueUpdate {
            status: Some(IssueStatus::Resolved),
            ..Default::default()
        };
        let changes = diff_issue(&issue(), &update, Some("Lisa Park"));

        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.activity_type, ActivityType::StatusChange);
        assert_eq!(change.content, "changed **status** from **open** to **resolved**");
        assert_eq!(change.author_name.as_deref(), Some("Lisa Park"));
        assert_eq!(change.author_avatar.as_deref(), Some("LP"));
    }

    #[test]
    fn unchanged_and_untracked_fields_produce_nothing() {
        let update = IssueUpdate {
            title: Some("Export fails on large files".to_string()),
            status: Some(IssueStatus::Open),
            priority: Some(Priority::Medium),
            assignee: Some(" Mike Chen ".to_string()),
            ..Default::default()
        };
        assert!(diff_issue(&issue(), &update, None).is_empty());
    }

    #[test]
    fn empty_values_render_as_placeholders() {
        let update = IssueUpdate {
            assignee: Some(String::new()),
            labels: Some(Vec::new()),
            due_date: Some(Some(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap())),
            ..Default::default()
        };
        let contents: Vec<String> = diff_issue(&issue(), &update, None)
            .into_iter()
            .map(|c| c.content)
            .collect();

        assert_eq!(
            contents,
            vec![
                "changed **assignee** from **Mike Chen** to **Unassigned**",
                "changed **labels** from **export** to **none**",
                "changed **due date** from **none** to **2024-07-01**",
            ]
        );
    }

    #[tokio::test]
    async fn apply_update_persists_issue_and_activities() {
        let store = MemoryStore::with_issues(vec![issue()]);
        let tracked = apply_update(
            &store,
            4,
            IssueUpdate {
                status: Some(IssueStatus::InProgress),
                priority: Some(Priority::High),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

        assert_eq!(tracked.issue.status, IssueStatus::InProgress);
        assert_eq!(tracked.activities.len(), 2);
        assert!(tracked.activities.iter().all(|a| a.author_name == "System"));

        let logged = store.fetch_activities(4).await.unwrap();
        assert_eq!(logged.len(), 2);
    }

    #[tokio::test]
    async fn missing_issue_records_nothing() {
        let store = MemoryStore::default();
        let err = apply_update(&store, 9, IssueUpdate::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::TrackFlowError::IssueNotFound(9)));
    }
}
