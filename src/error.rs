use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackFlowError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Request rejected by backend: {message}")]
    Rejected { message: String },

    #[error("Empty response from API")]
    EmptyResponse,

    #[error("Failed to read config file at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write config file at {path}: {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error(
        "No API key found. Set TRACKFLOW_API_KEY env var or add api_key to ~/.config/trackflow/config.toml"
    )]
    MissingApiKey,

    #[error(
        "No API URL found. Set TRACKFLOW_API_URL, add api_url to the config file, or pass --data <file>"
    )]
    MissingApiUrl,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Issue not found: {0}")]
    IssueNotFound(i64),

    #[error("Comment not found: {0}")]
    CommentNotFound(i64),

    #[error("Project not found: {0}")]
    ProjectNotFound(i64),

    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Team member already added: {0}")]
    DuplicateMember(String),

    #[error("Failed to read data file {path}: {source}")]
    DataFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse data file {path}: {source}")]
    DataFileParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write data file {path}: {source}")]
    DataFileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TrackFlowError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackFlowError>;
