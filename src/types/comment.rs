use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::wire;
use crate::error::{Result, TrackFlowError};

pub const DEFAULT_AUTHOR: &str = "Current User";
pub const DEFAULT_AVATAR: &str = "CU";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "Id", alias = "id")]
    pub id: i64,
    pub issue_id: i64,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub content: String,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub author_name: String,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub author_avatar: String,
    #[serde(deserialize_with = "wire::datetime")]
    pub created_date: DateTime<Utc>,
    #[serde(default, deserialize_with = "wire::optional_datetime")]
    pub updated_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "wire::optional_id")]
    pub parent_id: Option<i64>,
    #[serde(default, deserialize_with = "wire::list")]
    pub mentions: Vec<String>,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn is_edited(&self) -> bool {
        self.updated_date
            .is_some_and(|updated| updated != self.created_date)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewComment {
    pub issue_id: i64,
    pub content: String,
    pub author_name: Option<String>,
    pub parent_id: Option<i64>,
    pub mentions: Vec<String>,
}

impl NewComment {
    pub fn validate(&self) -> Result<()> {
        if self.content.trim().is_empty() {
            return Err(TrackFlowError::validation("content", "Comment cannot be empty"));
        }
        Ok(())
    }

    pub fn into_comment(self, id: i64, now: DateTime<Utc>) -> Comment {
        let author_name = self
            .author_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());
        let author_avatar = if author_name == DEFAULT_AUTHOR {
            DEFAULT_AVATAR.to_string()
        } else {
            initials(&author_name)
        };

        Comment {
            id,
            issue_id: self.issue_id,
            content: self.content,
            author_name,
            author_avatar,
            created_date: now,
            updated_date: Some(now),
            parent_id: self.parent_id,
            mentions: self.mentions,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentUpdate {
    pub content: Option<String>,
    pub mentions: Option<Vec<String>>,
}

impl CommentUpdate {
    pub fn apply_to(&self, comment: &mut Comment, now: DateTime<Utc>) {
        if let Some(content) = &self.content {
            comment.content = content.clone();
        }
        if let Some(mentions) = &self.mentions {
            comment.mentions = mentions.clone();
        }
        comment.updated_date = Some(now.max(comment.created_date));
    }
}

/// Up to two upper-cased initials, e.g. "Sarah Johnson" -> "SJ".
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}
