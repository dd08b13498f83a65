use std::fmt;

use colored::Colorize;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Priority levels for issues.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
    /// Anything else the backend stored, kept verbatim.
    Other(String),
}

impl Priority {
    /// The four known priorities, most urgent first.
    pub const KNOWN: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    /// Create Priority from its stored value.
    pub fn from_value(value: &str) -> Self {
        match value {
            "critical" => Priority::Critical,
            "high" => Priority::High,
            "medium" => Priority::Medium,
            "low" => Priority::Low,
            other => Priority::Other(other.to_string()),
        }
    }

    /// Parse a user-supplied priority, accepting only the known values.
    pub fn parse_known(value: &str) -> Result<Self, String> {
        match Self::from_value(&value.trim().to_lowercase()) {
            Priority::Other(raw) => Err(format!(
                "unknown priority '{raw}' (expected critical, high, medium or low)"
            )),
            known => Ok(known),
        }
    }

    /// Get the stored value.
    pub fn as_str(&self) -> &str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::Other(raw) => raw,
        }
    }

    /// Get the label for this priority.
    pub fn label(&self) -> &str {
        match self {
            Priority::Critical => "Critical",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
            Priority::Other(raw) => raw,
        }
    }

    /// Get the colored label for terminal output.
    pub fn colored(&self) -> String {
        let label = self.label();
        match self {
            Priority::Critical => label.red().bold().to_string(),
            Priority::High => label.yellow().bold().to_string(),
            Priority::Medium => label.blue().to_string(),
            Priority::Low => label.bright_black().to_string(),
            Priority::Other(_) => label.to_string(),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for Priority {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.map_or(Priority::default(), |v| Priority::from_value(&v)))
    }
}
