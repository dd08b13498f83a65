use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, TrackFlowError};

const API_KEY_ENV: &str = "TRACKFLOW_API_KEY";
const API_URL_ENV: &str = "TRACKFLOW_API_URL";
const DATA_FILE_ENV: &str = "TRACKFLOW_DATA";

#[derive(Deserialize, Serialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub project_id: Option<String>,
    pub data_file: Option<PathBuf>,
    pub author_name: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &std::path::Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents =
            std::fs::read_to_string(config_path).map_err(|e| TrackFlowError::ConfigRead {
                path: config_path.to_path_buf(),
                source: e,
            })?;

        Self::parse(&contents).map_err(|e| TrackFlowError::ConfigParse {
            path: config_path.to_path_buf(),
            source: e,
        })
    }

    /// Write as TOML, creating the parent directory if needed.
    pub fn save_to(&self, config_path: &std::path::Path) -> Result<()> {
        let write_err = |e: std::io::Error| TrackFlowError::ConfigWrite {
            path: config_path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let contents = toml::to_string(self)?;
        std::fs::write(config_path, contents).map_err(write_err)
    }

    pub fn parse(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn config_path() -> Result<PathBuf> {
        ProjectDirs::from("", "", "trackflow")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or(TrackFlowError::NoConfigDir)
    }

    /// Get API key with env var taking precedence over config file
    pub fn api_key(&self) -> Result<String> {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            return Ok(key);
        }

        self.api_key.clone().ok_or(TrackFlowError::MissingApiKey)
    }

    /// Backend base URL, validated. Env var wins over the file.
    pub fn api_url(&self) -> Result<Url> {
        let raw = std::env::var(API_URL_ENV)
            .ok()
            .or_else(|| self.api_url.clone())
            .ok_or(TrackFlowError::MissingApiUrl)?;

        parse_base_url(&raw)
    }

    /// Snapshot file for the in-memory store, preferring an explicit argument.
    pub fn resolve_data_file(&self, explicit: Option<PathBuf>) -> Option<PathBuf> {
        explicit
            .or_else(|| std::env::var(DATA_FILE_ENV).ok().map(PathBuf::from))
            .or_else(|| self.data_file.clone())
    }

    /// Author recorded on comments and activities, preferring an explicit argument.
    pub fn resolve_author(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .map(String::from)
            .or_else(|| self.author_name.clone())
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    // Url::join drops the last segment unless the base ends with a slash.
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };

    let url = Url::parse(&normalized).map_err(|_| TrackFlowError::InvalidUrl(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(TrackFlowError::InvalidUrl(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config = Config::parse(
            r#"
api_url = "https://api.example.com/v1"
api_key = "secret"
project_id = "tf-123"
data_file = "/tmp/trackflow.json"
author_name = "Sarah Johnson"
"#,
        )
        .unwrap();

        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.project_id.as_deref(), Some("tf-123"));
        assert_eq!(config.data_file, Some(PathBuf::from("/tmp/trackflow.json")));
        assert_eq!(config.author_name.as_deref(), Some("Sarah Johnson"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_key = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, TrackFlowError::ConfigParse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = parse_base_url("https://api.example.com/v1").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/");
        assert_eq!(
            url.join("tables/issue/records").unwrap().as_str(),
            "https://api.example.com/v1/tables/issue/records"
        );
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(matches!(
            parse_base_url("ftp://example.com"),
            Err(TrackFlowError::InvalidUrl(_))
        ));
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trackflow").join("config.toml");
        let config = Config {
            api_url: Some("https://api.example.com".to_string()),
            api_key: Some("secret".to_string()),
            author_name: Some("Tom Wilson".to_string()),
            ..Default::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn explicit_author_wins() {
        let config = Config {
            author_name: Some("Mike Chen".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolve_author(Some("Lisa Park")).as_deref(), Some("Lisa Park"));
        assert_eq!(config.resolve_author(None).as_deref(), Some("Mike Chen"));
    }
}
