use std::fmt;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::wire;
use super::{IssueStatus, Priority};
use crate::error::{Result, TrackFlowError};

/// Label used wherever an issue has no assignee.
pub const UNASSIGNED: &str = "Unassigned";

/// Kind of work an issue tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum IssueType {
    #[default]
    Bug,
    #[serde(rename = "Feature Request")]
    #[value(name = "feature")]
    FeatureRequest,
    Task,
    Improvement,
    /// Stored type this build does not know about.
    #[serde(other)]
    #[value(skip)]
    Unknown,
}

impl IssueType {
    pub fn label(self) -> &'static str {
        match self {
            IssueType::Bug => "Bug",
            IssueType::FeatureRequest => "Feature Request",
            IssueType::Task => "Task",
            IssueType::Improvement => "Improvement",
            IssueType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(rename = "Id", alias = "id")]
    pub id: i64,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub title: String,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub description: String,
    #[serde(rename = "type", default)]
    pub issue_type: IssueType,
    #[serde(default)]
    pub status: IssueStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub assignee: String,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub project: String,
    #[serde(default, deserialize_with = "wire::optional_id")]
    pub project_id: Option<i64>,
    #[serde(default, deserialize_with = "wire::list")]
    pub labels: Vec<String>,
    #[serde(default, deserialize_with = "wire::optional_datetime")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, alias = "createdAt", deserialize_with = "wire::optional_datetime")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default, alias = "updatedAt", deserialize_with = "wire::optional_datetime")]
    pub updated_date: Option<DateTime<Utc>>,
}

impl Issue {
    /// When a resolved or closed issue was resolved: its last update, or its
    /// creation when it was never updated.
    pub fn resolution_timestamp(&self) -> Option<DateTime<Utc>> {
        self.updated_date.or(self.created_date)
    }

    /// Assignee name, or "Unassigned" when blank.
    pub fn assignee_label(&self) -> &str {
        if self.assignee.trim().is_empty() {
            UNASSIGNED
        } else {
            &self.assignee
        }
    }

    /// Case-insensitive match on title, assignee or project.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term)
            || self.assignee.to_lowercase().contains(&term)
            || self.project.to_lowercase().contains(&term)
    }
}

/// Input for creating an issue. The store assigns id and timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    pub issue_type: IssueType,
    pub status: IssueStatus,
    pub priority: Priority,
    pub assignee: String,
    pub project: String,
    pub project_id: Option<i64>,
    pub labels: Vec<String>,
    pub due_date: Option<DateTime<Utc>>,
}

impl NewIssue {
    pub fn validate(&self) -> Result<()> {
        require("title", &self.title, "Title is required")?;
        require("description", &self.description, "Description is required")?;
        require("assignee", &self.assignee, "Assignee is required")?;
        require("project", &self.project, "Project is required")?;
        Ok(())
    }

    pub fn into_issue(self, id: i64, now: DateTime<Utc>) -> Issue {
        Issue {
            id,
            title: self.title.trim().to_string(),
            description: self.description,
            issue_type: self.issue_type,
            status: self.status,
            priority: self.priority,
            assignee: self.assignee,
            project: self.project,
            project_id: self.project_id,
            labels: self.labels,
            due_date: self.due_date,
            created_date: Some(now),
            updated_date: Some(now),
        }
    }
}

/// Partial update: only `Some` fields change.
///
/// `due_date` and `project_id` are doubly optional so they can be cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub issue_type: Option<IssueType>,
    pub status: Option<IssueStatus>,
    pub priority: Option<Priority>,
    pub assignee: Option<String>,
    pub project: Option<String>,
    pub project_id: Option<Option<i64>>,
    pub labels: Option<Vec<String>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl IssueUpdate {
    pub fn is_empty(&self) -> bool {
        *self == IssueUpdate::default()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            require("title", title, "Title cannot be empty")?;
        }
        Ok(())
    }

    /// Apply to an issue, always refreshing `updated_date` without letting it
    /// fall behind `created_date`.
    pub fn apply_to(&self, issue: &mut Issue, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            issue.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            issue.description = description.clone();
        }
        if let Some(issue_type) = self.issue_type {
            issue.issue_type = issue_type;
        }
        if let Some(status) = &self.status {
            issue.status = status.clone();
        }
        if let Some(priority) = &self.priority {
            issue.priority = priority.clone();
        }
        if let Some(assignee) = &self.assignee {
            issue.assignee = assignee.clone();
        }
        if let Some(project) = &self.project {
            issue.project = project.clone();
        }
        if let Some(project_id) = self.project_id {
            issue.project_id = project_id;
        }
        if let Some(labels) = &self.labels {
            issue.labels = labels.clone();
        }
        if let Some(due_date) = self.due_date {
            issue.due_date = due_date;
        }
        issue.updated_date = Some(match issue.created_date {
            Some(created) if created > now => created,
            _ => now,
        });
    }
}

fn require(field: &'static str, value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(TrackFlowError::validation(field, message))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn deserializes_backend_record() {
        let issue: Issue = serde_json::from_str(
            r#"{
                "Id": 42,
                "Name": "Login fails",
                "title": "Login fails",
                "description": "500 on submit",
                "type": "Feature Request",
                "status": "in-progress",
                "priority": "high",
                "assignee": null,
                "project": "Authentication System",
                "projectId": "3",
                "labels": "auth,backend",
                "dueDate": "2024-03-01",
                "createdDate": "2024-02-01T10:00:00Z",
                "updatedDate": ""
            }"#,
        )
        .unwrap();

        assert_eq!(issue.id, 42);
        assert_eq!(issue.issue_type, IssueType::FeatureRequest);
        assert_eq!(issue.status, IssueStatus::InProgress);
        assert_eq!(issue.priority, Priority::High);
        assert_eq!(issue.assignee_label(), UNASSIGNED);
        assert_eq!(issue.project_id, Some(3));
        assert_eq!(issue.labels, vec!["auth", "backend"]);
        assert_eq!(
            issue.due_date,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(issue.updated_date, None);
        assert_eq!(issue.resolution_timestamp(), issue.created_date);
    }

    #[test]
    fn legacy_timestamp_names_are_accepted() {
        let issue: Issue = serde_json::from_str(
            r#"{
                "Id": 1,
                "status": "resolved",
                "createdAt": "2024-10-10T00:00:00Z",
                "updatedAt": "2024-10-13T00:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(
            issue.created_date,
            Some(Utc.with_ymd_and_hms(2024, 10, 10, 0, 0, 0).unwrap())
        );
        assert_eq!(
            issue.updated_date,
            Some(Utc.with_ymd_and_hms(2024, 10, 13, 0, 0, 0).unwrap())
        );

        let now = Utc.with_ymd_and_hms(2024, 10, 15, 0, 0, 0).unwrap();
        let metrics = crate::analytics::compute_metrics(&[issue], now);
        assert_eq!(metrics.resolved_this_week, 1);
        assert_eq!(metrics.avg_resolution_time, 3);
    }

    #[test]
    fn unknown_type_does_not_fail_the_record() {
        let issue: Issue = serde_json::from_str(r#"{"id": 1, "type": "Epic"}"#).unwrap();
        assert_eq!(issue.issue_type, IssueType::Unknown);
        assert_eq!(issue.created_date, None);
    }

    #[test]
    fn validation_names_the_first_missing_field() {
        let input = NewIssue {
            title: "Crash on save".to_string(),
            description: "  ".to_string(),
            ..Default::default()
        };
        match input.validate() {
            Err(TrackFlowError::Validation { field, .. }) => assert_eq!(field, "description"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn update_touches_only_supplied_fields() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
        let mut issue = NewIssue {
            title: "Old".to_string(),
            assignee: "Mike Chen".to_string(),
            due_date: Some(created),
            ..Default::default()
        }
        .into_issue(1, created);

        IssueUpdate {
            status: Some(IssueStatus::Resolved),
            due_date: Some(None),
            ..Default::default()
        }
        .apply_to(&mut issue, now);

        assert_eq!(issue.title, "Old");
        assert_eq!(issue.assignee, "Mike Chen");
        assert_eq!(issue.status, IssueStatus::Resolved);
        assert_eq!(issue.due_date, None);
        assert_eq!(issue.updated_date, Some(now));
    }

    #[test]
    fn updated_date_never_precedes_created_date() {
        let created = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
        let skewed_now = Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap();
        let mut issue = NewIssue::default().into_issue(1, created);

        IssueUpdate::default().apply_to(&mut issue, skewed_now);
        assert_eq!(issue.updated_date, Some(created));
    }

    #[test]
    fn search_matches_title_assignee_or_project() {
        let issue = NewIssue {
            title: "Broken chart".to_string(),
            assignee: "Emily Rodriguez".to_string(),
            project: "Analytics Dashboard".to_string(),
            ..Default::default()
        }
        .into_issue(1, Utc::now());

        assert!(issue.matches_search("CHART"));
        assert!(issue.matches_search("emily"));
        assert!(issue.matches_search("analytics"));
        assert!(!issue.matches_search("billing"));
    }
}
