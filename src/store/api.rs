use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use super::{IssueStore, ProjectStore};
use crate::error::{Result, TrackFlowError};
use crate::types::wire::{decode_records, join_list};
use crate::types::{
    Activity, Comment, CommentUpdate, Issue, IssueUpdate, NewActivity, NewComment, NewIssue,
    NewProject, Project, ProjectUpdate,
};

const ISSUE_TABLE: &str = "issue";
const COMMENT_TABLE: &str = "app_Comment";
const ACTIVITY_TABLE: &str = "app_Activity";
const PROJECT_TABLE: &str = "project";

/// Rows requested per query page.
const PAGE_SIZE: usize = 1000;

/// HTTP client for the hosted record backend.
pub struct ApiClient {
    http: Client,
    base: Url,
    api_key: String,
    project_id: Option<String>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    success: bool,
    message: Option<String>,
    data: Option<T>,
    #[serde(default = "Vec::new")]
    results: Vec<RecordResult<T>>,
}

#[derive(Deserialize)]
struct RecordResult<T> {
    success: bool,
    message: Option<String>,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn accepted(self) -> Result<Self> {
        if !self.success {
            return Err(TrackFlowError::Rejected {
                message: self.message.unwrap_or_else(|| "request failed".to_string()),
            });
        }
        if let Some(failed) = self.results.iter().find(|r| !r.success) {
            return Err(TrackFlowError::Rejected {
                message: failed
                    .message
                    .clone()
                    .unwrap_or_else(|| "record operation failed".to_string()),
            });
        }
        Ok(self)
    }

    fn first_record(self) -> Result<T> {
        self.results
            .into_iter()
            .next()
            .and_then(|r| r.data)
            .or(self.data)
            .ok_or(TrackFlowError::EmptyResponse)
    }
}

impl ApiClient {
    pub fn new(base: Url, api_key: String, project_id: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base,
            api_key,
            project_id,
        }
    }

    fn records_url(&self, table: &str, suffix: &str) -> Result<Url> {
        let path = format!("tables/{table}/records{suffix}");
        self.base
            .join(&path)
            .map_err(|_| TrackFlowError::InvalidUrl(format!("{}{path}", self.base)))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<Envelope<T>> {
        debug!(%method, %url, "Backend request");

        let mut request = self
            .http
            .request(method, url)
            .header("Authorization", &self.api_key)
            .header("Content-Type", "application/json");
        if let Some(project_id) = &self.project_id {
            request = request.header("X-Project-Id", project_id);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(TrackFlowError::ApiError {
                status: response.status().as_u16(),
                message: response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<failed to read response body>".to_string()),
            });
        }

        let envelope: Envelope<T> = response.json().await?;
        envelope.accepted()
    }

    /// Every matching row, fetched page by page. Rows that fail to decode
    /// are skipped.
    pub async fn query<T: DeserializeOwned>(&self, table: &str, params: Value) -> Result<Vec<T>> {
        let url = self.records_url(table, "/query")?;
        let rows = collect_pages(PAGE_SIZE, |offset| {
            let body = with_paging(params.clone(), PAGE_SIZE, offset);
            let url = url.clone();
            async move {
                let envelope: Envelope<Vec<Value>> =
                    self.send(Method::POST, url, Some(body)).await?;
                Ok::<_, TrackFlowError>(envelope.data.unwrap_or_default())
            }
        })
        .await?;
        Ok(decode_records(rows))
    }

    /// `None` when the backend has no such record.
    pub async fn get<T: DeserializeOwned>(&self, table: &str, id: i64) -> Result<Option<T>> {
        let url = self.records_url(table, &format!("/{id}"))?;
        match self.send::<T>(Method::GET, url, None).await {
            Ok(envelope) => Ok(envelope.data),
            Err(TrackFlowError::ApiError { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn create<T: DeserializeOwned>(&self, table: &str, record: Value) -> Result<T> {
        let url = self.records_url(table, "")?;
        let body = json!({ "records": [record] });
        self.send(Method::POST, url, Some(body)).await?.first_record()
    }

    pub async fn update<T: DeserializeOwned>(&self, table: &str, record: Value) -> Result<T> {
        let url = self.records_url(table, "")?;
        let body = json!({ "records": [record] });
        self.send(Method::PATCH, url, Some(body)).await?.first_record()
    }

    pub async fn delete(&self, table: &str, ids: &[i64]) -> Result<()> {
        let url = self.records_url(table, "")?;
        let body = json!({ "RecordIds": ids });
        self.send::<Value>(Method::DELETE, url, Some(body)).await?;
        Ok(())
    }
}

/// Request pages until one comes back with fewer or more rows than asked
/// for. A longer page means the backend ignored paging and sent everything.
async fn collect_pages<F, Fut>(page_size: usize, mut fetch_page: F) -> Result<Vec<Value>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<Value>>>,
{
    let mut rows = Vec::new();
    loop {
        let page = fetch_page(rows.len()).await?;
        let last = page.len() != page_size;
        rows.extend(page);
        if last {
            return Ok(rows);
        }
    }
}

fn with_paging(mut params: Value, limit: usize, offset: usize) -> Value {
    if let Value::Object(map) = &mut params {
        map.insert(
            "pagingInfo".to_string(),
            json!({ "limit": limit, "offset": offset }),
        );
    }
    params
}

fn fields(names: &[&str]) -> Value {
    Value::Array(
        names
            .iter()
            .map(|name| json!({ "field": { "Name": name } }))
            .collect(),
    )
}

fn order_by(field: &str, direction: &str) -> Value {
    json!([{ "fieldName": field, "sorttype": direction }])
}

fn where_issue(issue_id: i64) -> Value {
    json!([{ "FieldName": "issueId", "Operator": "EqualTo", "Values": [issue_id] }])
}

fn timestamp(at: Option<DateTime<Utc>>) -> Value {
    at.map_or(Value::Null, |at| Value::String(at.to_rfc3339()))
}

const ISSUE_FIELDS: &[&str] = &[
    "Name",
    "title",
    "description",
    "type",
    "status",
    "priority",
    "assignee",
    "project",
    "projectId",
    "labels",
    "dueDate",
    "createdDate",
    "updatedDate",
];

const COMMENT_FIELDS: &[&str] = &[
    "Name",
    "issueId",
    "content",
    "authorName",
    "authorAvatar",
    "createdDate",
    "updatedDate",
    "parentId",
    "mentions",
];

const ACTIVITY_FIELDS: &[&str] = &[
    "Name",
    "issueId",
    "type",
    "content",
    "authorName",
    "authorAvatar",
    "createdDate",
    "fieldChanged",
    "oldValue",
    "newValue",
];

const PROJECT_FIELDS: &[&str] = &[
    "Name",
    "description",
    "status",
    "teamMembers",
    "memberCount",
    "issueCount",
    "createdAt",
    "updatedAt",
];

fn issue_record(issue: &Issue) -> Value {
    json!({
        "Name": issue.title,
        "title": issue.title,
        "description": issue.description,
        "type": issue.issue_type,
        "status": issue.status,
        "priority": issue.priority,
        "assignee": issue.assignee,
        "project": issue.project,
        "projectId": issue.project_id,
        "labels": join_list(&issue.labels),
        "dueDate": issue.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
        "createdDate": timestamp(issue.created_date),
        "updatedDate": timestamp(issue.updated_date),
    })
}

fn comment_record(comment: &Comment) -> Value {
    json!({
        "Name": format!("Comment on Issue {}", comment.issue_id),
        "issueId": comment.issue_id,
        "content": comment.content,
        "authorName": comment.author_name,
        "authorAvatar": comment.author_avatar,
        "createdDate": comment.created_date.to_rfc3339(),
        "updatedDate": timestamp(comment.updated_date),
        "parentId": comment.parent_id,
        "mentions": join_list(&comment.mentions),
    })
}

fn activity_record(activity: &Activity) -> Value {
    json!({
        "Name": format!("Activity on Issue {}", activity.issue_id),
        "issueId": activity.issue_id,
        "type": activity.activity_type,
        "content": activity.content,
        "authorName": activity.author_name,
        "authorAvatar": activity.author_avatar,
        "createdDate": activity.created_date.to_rfc3339(),
        "fieldChanged": activity.field_changed,
        "oldValue": activity.old_value,
        "newValue": activity.new_value,
    })
}

fn project_record(project: &Project) -> Value {
    json!({
        "Name": project.name,
        "description": project.description,
        "status": project.status,
        "teamMembers": join_list(&project.team_members),
        "memberCount": project.member_count,
        "issueCount": project.issue_count,
        "createdAt": timestamp(project.created_date),
        "updatedAt": timestamp(project.updated_date),
    })
}

/// Inserts the record id the backend keys updates on.
fn with_id(mut record: Value, id: i64) -> Value {
    if let Value::Object(map) = &mut record {
        map.insert("Id".to_string(), json!(id));
    }
    record
}

/// Backend-backed store. Partial updates are applied locally to the current
/// record and written back whole, so both stores share update semantics.
pub struct ApiStore {
    client: ApiClient,
}

impl ApiStore {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    async fn fetch_comment(&self, id: i64) -> Result<Comment> {
        self.client
            .get(COMMENT_TABLE, id)
            .await?
            .ok_or(TrackFlowError::CommentNotFound(id))
    }
}

#[async_trait]
impl IssueStore for ApiStore {
    async fn fetch_all_issues(&self) -> Result<Vec<Issue>> {
        let params = json!({
            "fields": fields(ISSUE_FIELDS),
            "orderBy": order_by("createdDate", "DESC"),
        });
        let issues: Vec<Issue> = self.client.query(ISSUE_TABLE, params).await?;
        debug!(count = issues.len(), "Fetched issues");
        Ok(issues)
    }

    async fn fetch_issue(&self, id: i64) -> Result<Issue> {
        self.client
            .get(ISSUE_TABLE, id)
            .await?
            .ok_or(TrackFlowError::IssueNotFound(id))
    }

    async fn create_issue(&self, input: NewIssue) -> Result<Issue> {
        input.validate()?;
        let draft = input.into_issue(0, Utc::now());
        self.client.create(ISSUE_TABLE, issue_record(&draft)).await
    }

    async fn update_issue(&self, id: i64, update: IssueUpdate) -> Result<Issue> {
        update.validate()?;
        let mut issue = self.fetch_issue(id).await?;
        update.apply_to(&mut issue, Utc::now());
        self.client
            .update(ISSUE_TABLE, with_id(issue_record(&issue), id))
            .await
    }

    async fn delete_issue(&self, id: i64) -> Result<()> {
        self.client.delete(ISSUE_TABLE, &[id]).await
    }

    async fn fetch_comments(&self, issue_id: i64) -> Result<Vec<Comment>> {
        let params = json!({
            "fields": fields(COMMENT_FIELDS),
            "where": where_issue(issue_id),
            "orderBy": order_by("createdDate", "ASC"),
        });
        self.client.query(COMMENT_TABLE, params).await
    }

    async fn create_comment(&self, input: NewComment) -> Result<Comment> {
        input.validate()?;
        let draft = input.into_comment(0, Utc::now());
        self.client
            .create(COMMENT_TABLE, comment_record(&draft))
            .await
    }

    async fn update_comment(&self, id: i64, update: CommentUpdate) -> Result<Comment> {
        if update.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(TrackFlowError::validation("content", "Comment cannot be empty"));
        }
        let mut comment = self.fetch_comment(id).await?;
        update.apply_to(&mut comment, Utc::now());
        self.client
            .update(COMMENT_TABLE, with_id(comment_record(&comment), id))
            .await
    }

    async fn delete_comment(&self, id: i64) -> Result<()> {
        self.client.delete(COMMENT_TABLE, &[id]).await
    }

    async fn fetch_activities(&self, issue_id: i64) -> Result<Vec<Activity>> {
        let params = json!({
            "fields": fields(ACTIVITY_FIELDS),
            "where": where_issue(issue_id),
            "orderBy": order_by("createdDate", "DESC"),
        });
        self.client.query(ACTIVITY_TABLE, params).await
    }

    async fn record_activity(&self, input: NewActivity) -> Result<Activity> {
        let draft = input.into_activity(0, Utc::now());
        self.client
            .create(ACTIVITY_TABLE, activity_record(&draft))
            .await
    }
}

#[async_trait]
impl ProjectStore for ApiStore {
    async fn fetch_projects(&self) -> Result<Vec<Project>> {
        let params = json!({
            "fields": fields(PROJECT_FIELDS),
            "orderBy": order_by("createdAt", "DESC"),
        });
        self.client.query(PROJECT_TABLE, params).await
    }

    async fn fetch_project(&self, id: i64) -> Result<Project> {
        self.client
            .get(PROJECT_TABLE, id)
            .await?
            .ok_or(TrackFlowError::ProjectNotFound(id))
    }

    async fn create_project(&self, input: NewProject) -> Result<Project> {
        input.validate()?;
        let draft = input.into_project(0, Utc::now());
        self.client
            .create(PROJECT_TABLE, project_record(&draft))
            .await
    }

    async fn update_project(&self, id: i64, update: ProjectUpdate) -> Result<Project> {
        let mut project = self.fetch_project(id).await?;
        update.apply_to(&mut project, Utc::now());
        self.client
            .update(PROJECT_TABLE, with_id(project_record(&project), id))
            .await
    }

    async fn delete_project(&self, id: i64) -> Result<()> {
        self.client.delete(PROJECT_TABLE, &[id]).await
    }
}
