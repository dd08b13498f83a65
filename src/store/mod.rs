//! Data-source collaborators the tracker reads from and writes to.

mod api;
mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    Activity, Comment, CommentUpdate, Issue, IssueUpdate, NewActivity, NewComment, NewIssue,
    NewProject, Project, ProjectUpdate,
};

pub use api::{ApiClient, ApiStore};
pub use memory::{MemoryStore, Snapshot};

/// Issues and their comment/activity history.
#[async_trait]
pub trait IssueStore: Send + Sync {
    /// Full working set, newest created first. No filtering or paging.
    async fn fetch_all_issues(&self) -> Result<Vec<Issue>>;

    async fn fetch_issue(&self, id: i64) -> Result<Issue>;

    async fn create_issue(&self, input: NewIssue) -> Result<Issue>;

    /// Partial update; `updated_date` is always refreshed.
    async fn update_issue(&self, id: i64, update: IssueUpdate) -> Result<Issue>;

    async fn delete_issue(&self, id: i64) -> Result<()>;

    /// Oldest first.
    async fn fetch_comments(&self, issue_id: i64) -> Result<Vec<Comment>>;

    async fn create_comment(&self, input: NewComment) -> Result<Comment>;

    async fn update_comment(&self, id: i64, update: CommentUpdate) -> Result<Comment>;

    async fn delete_comment(&self, id: i64) -> Result<()>;

    /// Newest first.
    async fn fetch_activities(&self, issue_id: i64) -> Result<Vec<Activity>>;

    async fn record_activity(&self, input: NewActivity) -> Result<Activity>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn fetch_projects(&self) -> Result<Vec<Project>>;

    async fn fetch_project(&self, id: i64) -> Result<Project>;

    async fn create_project(&self, input: NewProject) -> Result<Project>;

    async fn update_project(&self, id: i64, update: ProjectUpdate) -> Result<Project>;

    async fn delete_project(&self, id: i64) -> Result<()>;
}
