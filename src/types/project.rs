use std::fmt;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::wire;
use crate::error::{Result, TrackFlowError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    Active,
    #[serde(rename = "In Progress")]
    #[value(name = "in-progress")]
    InProgress,
    Planning,
    #[serde(rename = "On Hold")]
    #[value(name = "on-hold")]
    OnHold,
    Completed,
    Archived,
    #[serde(other)]
    #[value(skip)]
    Unknown,
}

impl ProjectStatus {
    pub fn label(self) -> &'static str {
        match self {
            ProjectStatus::Active => "Active",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::Planning => "Planning",
            ProjectStatus::OnHold => "On Hold",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Archived => "Archived",
            ProjectStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "Id", alias = "id")]
    pub id: i64,
    #[serde(alias = "Name", default, deserialize_with = "wire::nullable_string")]
    pub name: String,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default, deserialize_with = "wire::list")]
    pub team_members: Vec<String>,
    #[serde(default)]
    pub member_count: u32,
    #[serde(default)]
    pub issue_count: u32,
    #[serde(alias = "createdAt", default, deserialize_with = "wire::optional_datetime")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(alias = "updatedAt", default, deserialize_with = "wire::optional_datetime")]
    pub updated_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub team_members: Vec<String>,
}

impl NewProject {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TrackFlowError::validation("name", "Project name is required"));
        }
        if self.description.trim().is_empty() {
            return Err(TrackFlowError::validation(
                "description",
                "Project description is required",
            ));
        }
        Ok(())
    }

    pub fn into_project(self, id: i64, now: DateTime<Utc>) -> Project {
        let member_count = self.team_members.len() as u32;
        Project {
            id,
            name: self.name.trim().to_string(),
            description: self.description,
            status: self.status,
            team_members: self.team_members,
            member_count,
            issue_count: 0,
            created_date: Some(now),
            updated_date: Some(now),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub team_members: Option<Vec<String>>,
    pub issue_count: Option<u32>,
}

impl ProjectUpdate {
    pub fn apply_to(&self, project: &mut Project, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            project.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            project.description = description.clone();
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(members) = &self.team_members {
            project.team_members = members.clone();
            project.member_count = members.len() as u32;
        }
        if let Some(issue_count) = self.issue_count {
            project.issue_count = issue_count;
        }
        project.updated_date = Some(now);
    }
}

/// Add a member, rejecting blanks and case-insensitive duplicates.
pub fn add_member(members: &mut Vec<String>, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TrackFlowError::validation("member", "Member name is required"));
    }
    let lowered = name.to_lowercase();
    if members.iter().any(|m| m.to_lowercase() == lowered) {
        return Err(TrackFlowError::DuplicateMember(name.to_string()));
    }
    members.push(name.to_string());
    Ok(())
}

/// Remove an exact match. Returns whether anything was removed.
pub fn remove_member(members: &mut Vec<String>, name: &str) -> bool {
    let before = members.len();
    members.retain(|m| m != name);
    members.len() != before
}

/// Build a member list from user input, dropping duplicates.
pub fn dedup_members<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut members = Vec::new();
    for name in names {
        if let Err(e) = add_member(&mut members, name.as_ref()) {
            tracing::warn!("Skipping team member: {e}");
        }
    }
    members
}
