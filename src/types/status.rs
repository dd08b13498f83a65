use std::fmt;

use colored::Colorize;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Workflow status of an issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum IssueStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
    /// Unrecognised value, passed through as-is.
    Other(String),
}

impl IssueStatus {
    pub fn from_value(value: &str) -> Self {
        match value {
            "open" => IssueStatus::Open,
            "in-progress" => IssueStatus::InProgress,
            "resolved" => IssueStatus::Resolved,
            "closed" => IssueStatus::Closed,
            other => IssueStatus::Other(other.to_string()),
        }
    }

    pub fn parse_known(value: &str) -> Result<Self, String> {
        let normalized = value.trim().to_lowercase().replace([' ', '_'], "-");
        match Self::from_value(&normalized) {
            IssueStatus::Other(raw) => Err(format!(
                "unknown status '{raw}' (expected open, in-progress, resolved or closed)"
            )),
            known => Ok(known),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            IssueStatus::Open => "open",
            IssueStatus::InProgress => "in-progress",
            IssueStatus::Resolved => "resolved",
            IssueStatus::Closed => "closed",
            IssueStatus::Other(raw) => raw,
        }
    }

    /// Display label; unknown statuses fall back to the raw value.
    pub fn label(&self) -> &str {
        match self {
            IssueStatus::Open => "Open",
            IssueStatus::InProgress => "In Progress",
            IssueStatus::Resolved => "Resolved",
            IssueStatus::Closed => "Closed",
            IssueStatus::Other(raw) => raw,
        }
    }

    /// Open or in progress.
    pub fn is_active(&self) -> bool {
        matches!(self, IssueStatus::Open | IssueStatus::InProgress)
    }

    /// Resolved or closed.
    pub fn is_done(&self) -> bool {
        matches!(self, IssueStatus::Resolved | IssueStatus::Closed)
    }

    pub fn colored(&self) -> String {
        let label = self.label();
        match self {
            IssueStatus::Open => label.cyan().to_string(),
            IssueStatus::InProgress => label.blue().to_string(),
            IssueStatus::Resolved => label.green().to_string(),
            IssueStatus::Closed => label.bright_black().to_string(),
            IssueStatus::Other(_) => label.to_string(),
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for IssueStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IssueStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.map_or(IssueStatus::default(), |v| IssueStatus::from_value(&v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_accepts_display_spellings() {
        assert_eq!(IssueStatus::parse_known("In Progress"), Ok(IssueStatus::InProgress));
        assert_eq!(IssueStatus::parse_known("in_progress"), Ok(IssueStatus::InProgress));
        assert!(IssueStatus::parse_known("blocked").is_err());
    }

    #[test]
    fn unknown_status_label_is_raw_value() {
        let status: IssueStatus = serde_json::from_str(r#""blocked""#).unwrap();
        assert_eq!(status.label(), "blocked");
        assert!(!status.is_active());
        assert!(!status.is_done());
    }
}
