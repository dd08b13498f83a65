//! In-memory store, optionally backed by a JSON snapshot file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::{IssueStore, ProjectStore};
use crate::error::{Result, TrackFlowError};
use crate::types::wire;
use crate::types::{
    Activity, Comment, CommentUpdate, Issue, IssueUpdate, NewActivity, NewComment, NewIssue,
    NewProject, Project, ProjectUpdate,
};

/// On-disk shape of the mock data file. Malformed rows are dropped on load.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Snapshot {
    #[serde(default, deserialize_with = "wire::records")]
    pub issues: Vec<Issue>,
    #[serde(default, deserialize_with = "wire::records")]
    pub comments: Vec<Comment>,
    #[serde(default, deserialize_with = "wire::records")]
    pub activities: Vec<Activity>,
    #[serde(default, deserialize_with = "wire::records")]
    pub projects: Vec<Project>,
}

pub struct MemoryStore {
    data: RwLock<Snapshot>,
    path: Option<PathBuf>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::from_snapshot(Snapshot::default())
    }
}

impl MemoryStore {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            data: RwLock::new(snapshot),
            path: None,
        }
    }

    pub fn with_issues(issues: Vec<Issue>) -> Self {
        Self::from_snapshot(Snapshot {
            issues,
            ..Default::default()
        })
    }

    /// Load a snapshot file; a missing file starts an empty store that
    /// `save` will create.
    pub fn load(path: &Path) -> Result<Self> {
        let snapshot = if path.exists() {
            let contents =
                std::fs::read_to_string(path).map_err(|e| TrackFlowError::DataFileRead {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            serde_json::from_str(&contents).map_err(|e| TrackFlowError::DataFileParse {
                path: path.to_path_buf(),
                source: e,
            })?
        } else {
            debug!("Data file {} does not exist yet", path.display());
            Snapshot::default()
        };

        Ok(Self {
            data: RwLock::new(snapshot),
            path: Some(path.to_path_buf()),
        })
    }

    /// Write back to the file this store was loaded from, if any.
    pub async fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let contents = serde_json::to_string_pretty(&*self.data.read().await)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| TrackFlowError::DataFileWrite {
                path: path.clone(),
                source: e,
            })?;
        }
        std::fs::write(path, contents).map_err(|e| TrackFlowError::DataFileWrite {
            path: path.clone(),
            source: e,
        })?;

        debug!("Saved data file {}", path.display());
        Ok(())
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.data.read().await.clone()
    }
}

fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
    ids.max().unwrap_or(0) + 1
}

/// Ids of `root` and every reply beneath it. Each id appears once even when
/// parent links form a cycle.
fn comment_subtree(comments: &[Comment], root: i64) -> Vec<i64> {
    let mut seen = HashSet::from([root]);
    let mut ids = vec![root];
    let mut cursor = 0;
    while cursor < ids.len() {
        let parent = ids[cursor];
        for reply in comments.iter().filter(|c| c.parent_id == Some(parent)) {
            if seen.insert(reply.id) {
                ids.push(reply.id);
            }
        }
        cursor += 1;
    }
    ids
}

#[async_trait]
impl IssueStore for MemoryStore {
    async fn fetch_all_issues(&self) -> Result<Vec<Issue>> {
        let mut issues = self.data.read().await.issues.clone();
        issues.sort_by(|a, b| b.created_date.cmp(&a.created_date));
        Ok(issues)
    }

    async fn fetch_issue(&self, id: i64) -> Result<Issue> {
        self.data
            .read()
            .await
            .issues
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or(TrackFlowError::IssueNotFound(id))
    }

    async fn create_issue(&self, input: NewIssue) -> Result<Issue> {
        input.validate()?;
        let mut data = self.data.write().await;
        let id = next_id(data.issues.iter().map(|i| i.id));
        let issue = input.into_issue(id, Utc::now());
        data.issues.push(issue.clone());
        debug!(id, "Created issue");
        Ok(issue)
    }

    async fn update_issue(&self, id: i64, update: IssueUpdate) -> Result<Issue> {
        update.validate()?;
        let mut data = self.data.write().await;
        let issue = data
            .issues
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(TrackFlowError::IssueNotFound(id))?;
        update.apply_to(issue, Utc::now());
        debug!(id, "Updated issue");
        Ok(issue.clone())
    }

    async fn delete_issue(&self, id: i64) -> Result<()> {
        let mut data = self.data.write().await;
        let before = data.issues.len();
        data.issues.retain(|i| i.id != id);
        if data.issues.len() == before {
            return Err(TrackFlowError::IssueNotFound(id));
        }
        data.comments.retain(|c| c.issue_id != id);
        data.activities.retain(|a| a.issue_id != id);
        debug!(id, "Deleted issue");
        Ok(())
    }

    async fn fetch_comments(&self, issue_id: i64) -> Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .data
            .read()
            .await
            .comments
            .iter()
            .filter(|c| c.issue_id == issue_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_date);
        Ok(comments)
    }

    async fn create_comment(&self, input: NewComment) -> Result<Comment> {
        input.validate()?;
        let mut data = self.data.write().await;
        if !data.issues.iter().any(|i| i.id == input.issue_id) {
            return Err(TrackFlowError::IssueNotFound(input.issue_id));
        }
        if let Some(parent_id) = input.parent_id {
            let parent_ok = data
                .comments
                .iter()
                .any(|c| c.id == parent_id && c.issue_id == input.issue_id);
            if !parent_ok {
                return Err(TrackFlowError::CommentNotFound(parent_id));
            }
        }

        let id = next_id(data.comments.iter().map(|c| c.id));
        let comment = input.into_comment(id, Utc::now());
        data.comments.push(comment.clone());
        Ok(comment)
    }

    async fn update_comment(&self, id: i64, update: CommentUpdate) -> Result<Comment> {
        if update.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(TrackFlowError::validation("content", "Comment cannot be empty"));
        }
        let mut data = self.data.write().await;
        let comment = data
            .comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(TrackFlowError::CommentNotFound(id))?;
        update.apply_to(comment, Utc::now());
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: i64) -> Result<()> {
        let mut data = self.data.write().await;
        if !data.comments.iter().any(|c| c.id == id) {
            return Err(TrackFlowError::CommentNotFound(id));
        }
        let doomed = comment_subtree(&data.comments, id);
        data.comments.retain(|c| !doomed.contains(&c.id));
        debug!(id, removed = doomed.len(), "Deleted comment thread");
        Ok(())
    }

    async fn fetch_activities(&self, issue_id: i64) -> Result<Vec<Activity>> {
        let mut activities: Vec<Activity> = self
            .data
            .read()
            .await
            .activities
            .iter()
            .filter(|a| a.issue_id == issue_id)
            .cloned()
            .collect();
        activities.sort_by(|a, b| b.created_date.cmp(&a.created_date));
        Ok(activities)
    }

    async fn record_activity(&self, input: NewActivity) -> Result<Activity> {
        let mut data = self.data.write().await;
        if !data.issues.iter().any(|i| i.id == input.issue_id) {
            return Err(TrackFlowError::IssueNotFound(input.issue_id));
        }
        let id = next_id(data.activities.iter().map(|a| a.id));
        let activity = input.into_activity(id, Utc::now());
        data.activities.push(activity.clone());
        Ok(activity)
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn fetch_projects(&self) -> Result<Vec<Project>> {
        let mut projects = self.data.read().await.projects.clone();
        projects.sort_by(|a, b| b.created_date.cmp(&a.created_date));
        Ok(projects)
    }

    async fn fetch_project(&self, id: i64) -> Result<Project> {
        self.data
            .read()
            .await
            .projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(TrackFlowError::ProjectNotFound(id))
    }

    async fn create_project(&self, input: NewProject) -> Result<Project> {
        input.validate()?;
        let mut data = self.data.write().await;
        let id = next_id(data.projects.iter().map(|p| p.id));
        let project = input.into_project(id, Utc::now());
        data.projects.push(project.clone());
        Ok(project)
    }

    async fn update_project(&self, id: i64, update: ProjectUpdate) -> Result<Project> {
        let mut data = self.data.write().await;
        let project = data
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(TrackFlowError::ProjectNotFound(id))?;
        update.apply_to(project, Utc::now());
        Ok(project.clone())
    }

    async fn delete_project(&self, id: i64) -> Result<()> {
        let mut data = self.data.write().await;
        let before = data.projects.len();
        data.projects.retain(|p| p.id != id);
        if data.projects.len() == before {
            return Err(TrackFlowError::ProjectNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IssueStatus, Priority};

    fn new_issue(title: &str) -> NewIssue {
        NewIssue {
            title: title.to_string(),
            description: "Steps to reproduce".to_string(),
            assignee: "Sarah Johnson".to_string(),
            project: "Issue Tracking".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_assigns_ids_and_timestamps() {
        let store = MemoryStore::default();
        let first = store.create_issue(new_issue("First")).await.unwrap();
        let second = store.create_issue(new_issue("Second")).await.unwrap();

        assert_eq!((first.id, second.id), (1, 2));
        assert_eq!(first.status, IssueStatus::Open);
        assert_eq!(first.priority, Priority::Medium);
        assert!(first.created_date.is_some());
        assert_eq!(first.created_date, first.updated_date);
    }

    #[tokio::test]
    async fn create_rejects_invalid_input() {
        let store = MemoryStore::default();
        let err = store.create_issue(NewIssue::default()).await.unwrap_err();
        assert!(matches!(err, TrackFlowError::Validation { field: "title", .. }));
        assert!(store.fetch_all_issues().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn partial_update_and_missing_issue() {
        let store = MemoryStore::default();
        let issue = store.create_issue(new_issue("Crash")).await.unwrap();

        let updated = store
            .update_issue(
                issue.id,
                IssueUpdate {
                    priority: Some(Priority::Critical),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Crash");
        assert_eq!(updated.priority, Priority::Critical);
        assert!(updated.updated_date >= updated.created_date);

        assert!(matches!(
            store.update_issue(99, IssueUpdate::default()).await,
            Err(TrackFlowError::IssueNotFound(99))
        ));
    }

    #[tokio::test]
    async fn replies_must_belong_to_the_same_issue() {
        let store = MemoryStore::default();
        let a = store.create_issue(new_issue("A")).await.unwrap();
        let b = store.create_issue(new_issue("B")).await.unwrap();
        let root = store
            .create_comment(NewComment {
                issue_id: a.id,
                content: "On A".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let err = store
            .create_comment(NewComment {
                issue_id: b.id,
                content: "Wrong thread".to_string(),
                parent_id: Some(root.id),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TrackFlowError::CommentNotFound(_)));
    }

    #[tokio::test]
    async fn deleting_a_comment_removes_its_replies() {
        let store = MemoryStore::default();
        let issue = store.create_issue(new_issue("Thread")).await.unwrap();
        let mut parent = None;
        for depth in 0..3 {
            let comment = store
                .create_comment(NewComment {
                    issue_id: issue.id,
                    content: format!("depth {depth}"),
                    parent_id: parent,
                    ..Default::default()
                })
                .await
                .unwrap();
            parent = Some(comment.id);
        }
        let unrelated = store
            .create_comment(NewComment {
                issue_id: issue.id,
                content: "separate".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        store.delete_comment(1).await.unwrap();
        let remaining = store.fetch_comments(issue.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, unrelated.id);
    }

    #[tokio::test]
    async fn deleting_an_issue_drops_its_history() {
        let store = MemoryStore::default();
        let issue = store.create_issue(new_issue("Gone")).await.unwrap();
        store
            .record_activity(NewActivity {
                issue_id: issue.id,
                content: "changed".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        store.delete_issue(issue.id).await.unwrap();
        assert!(store.fetch_activities(issue.id).await.unwrap().is_empty());
        assert!(matches!(
            store.delete_issue(issue.id).await,
            Err(TrackFlowError::IssueNotFound(_))
        ));
    }

    #[tokio::test]
    async fn snapshot_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");

        let store = MemoryStore::load(&path).unwrap();
        store.create_issue(new_issue("Persisted")).await.unwrap();
        store
            .create_project(NewProject {
                name: "Issue Tracking".to_string(),
                description: "Core".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        store.save().await.unwrap();

        let reloaded = MemoryStore::load(&path).unwrap();
        pretty_assertions::assert_eq!(reloaded.snapshot().await, store.snapshot().await);
    }

    #[tokio::test]
    async fn cyclic_replies_are_deleted_once() {
        let store = MemoryStore::default();
        let issue = store.create_issue(new_issue("Loop")).await.unwrap();
        for _ in 0..2 {
            store
                .create_comment(NewComment {
                    issue_id: issue.id,
                    content: "ping".to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        {
            let mut data = store.data.write().await;
            data.comments[0].parent_id = Some(2);
            data.comments[1].parent_id = Some(1);
        }

        let comments = store.snapshot().await.comments;
        assert_eq!(comment_subtree(&comments, 1), vec![1, 2]);

        store.delete_comment(1).await.unwrap();
        assert!(store.fetch_comments(issue.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_rows_do_not_reject_the_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(
            &path,
            r#"{
                "issues": [{"Id": 1, "title": "Crash", "status": "open"}],
                "comments": [
                    {"Id": 1, "issueId": 1, "content": "when?", "createdDate": "soon"},
                    {"Id": 2, "issueId": 1, "content": "today", "createdDate": "2024-03-09T10:00:00Z"}
                ]
            }"#,
        )
        .unwrap();

        let store = MemoryStore::load(&path).unwrap();
        let comments = store.fetch_comments(1).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, 2);
        assert_eq!(store.fetch_all_issues().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            MemoryStore::load(&path),
            Err(TrackFlowError::DataFileParse { .. })
        ));
    }
}
