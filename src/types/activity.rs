use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::wire;

pub const SYSTEM_AUTHOR: &str = "System";
pub const SYSTEM_AVATAR: &str = "SY";

/// What kind of change an activity records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    StatusChange,
    AssigneeChange,
    PriorityChange,
    LabelChange,
    DueDateChange,
    #[default]
    #[serde(other)]
    Other,
}

impl ActivityType {
    /// Short glyph shown next to the entry in the timeline.
    pub fn symbol(self) -> &'static str {
        match self {
            ActivityType::StatusChange => "⎇",
            ActivityType::AssigneeChange => "👤",
            ActivityType::PriorityChange => "⚠",
            ActivityType::LabelChange => "🏷",
            ActivityType::DueDateChange => "📅",
            ActivityType::Other => "•",
        }
    }
}

/// Append-only record of a change to an issue.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "Id", alias = "id")]
    pub id: i64,
    pub issue_id: i64,
    #[serde(rename = "type", default)]
    pub activity_type: ActivityType,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub content: String,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub author_name: String,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub author_avatar: String,
    #[serde(deserialize_with = "wire::datetime")]
    pub created_date: DateTime<Utc>,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub field_changed: String,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub old_value: String,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub new_value: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewActivity {
    pub issue_id: i64,
    pub activity_type: ActivityType,
    pub content: String,
    pub author_name: Option<String>,
    pub author_avatar: Option<String>,
    pub field_changed: String,
    pub old_value: String,
    pub new_value: String,
}

impl NewActivity {
    pub fn into_activity(self, id: i64, now: DateTime<Utc>) -> Activity {
        Activity {
            id,
            issue_id: self.issue_id,
            activity_type: self.activity_type,
            content: self.content,
            author_name: self
                .author_name
                .unwrap_or_else(|| SYSTEM_AUTHOR.to_string()),
            author_avatar: self
                .author_avatar
                .unwrap_or_else(|| SYSTEM_AVATAR.to_string()),
            created_date: now,
            field_changed: self.field_changed,
            old_value: self.old_value,
            new_value: self.new_value,
        }
    }
}
