//! Configuration for the notice ingestion service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PripConfig {
    /// HTTP transport configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Sender gate
    #[serde(default)]
    pub auth: AuthConfig,
    /// Where the record collection lives
    #[serde(default)]
    pub storage: StorageConfig,
    /// Section and number rules
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// Pipeline limits and markers
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl PripConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// Build configuration from the environment.
    ///
    /// `PRIP_CONFIG` names an optional TOML file used as the base; the
    /// deployment variables below override whatever it sets.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var("PRIP_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::load(path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(owner_id) = get("OWNER_ID") {
            self.auth.owner_id = owner_id;
        }
        if let Some(token) = get("GH_TOKEN") {
            self.storage.github.token = token;
        }
        if let Some(owner) = get("GH_OWNER") {
            self.storage.github.owner = owner;
        }
        if let Some(repo) = get("GH_REPO") {
            self.storage.github.repo = repo;
        }
        if let Some(branch) = get("GH_BRANCH") {
            self.storage.github.branch = branch;
        }
        if let Some(path) = get("GH_PATH") {
            self.storage.github.path = path;
        }
        if let Some(host) = get("PRIP_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PRIP_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PRIP_PORT value: {}", port),
            }
        }
    }

    /// Check that the selected backend has everything it needs
    pub fn validate(&self) -> Result<()> {
        if self.auth.owner_id.trim().is_empty() {
            return Err(Error::Config("OWNER_ID is not set".to_string()));
        }

        if self.storage.backend == StorageBackend::Github {
            let github = &self.storage.github;
            let missing: Vec<&str> = [
                ("GH_TOKEN", github.token.as_str()),
                ("GH_OWNER", github.owner.as_str()),
                ("GH_REPO", github.repo.as_str()),
            ]
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

            if !missing.is_empty() {
                return Err(Error::Config(format!(
                    "Missing GitHub settings: {}",
                    missing.join(", ")
                )));
            }
        }

        if self.pipeline.sentinel_tokens.is_empty() {
            return Err(Error::Config("At least one sentinel token is required".to_string()));
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Maximum upload size in bytes (default: 20MB)
    pub max_upload_size: usize,
    /// Timeout for downloading linked documents, in seconds
    pub download_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_upload_size: 20 * 1024 * 1024,
            download_timeout_secs: 60,
        }
    }
}

/// Sender gate configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// The only sender id allowed to add notices
    pub owner_id: String,
}

impl AuthConfig {
    /// Whether the given sender may trigger ingestion
    pub fn is_owner(&self, sender_id: &str) -> bool {
        !self.owner_id.is_empty() && self.owner_id.trim() == sender_id.trim()
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON file in a GitHub repository
    #[default]
    Github,
    /// JSON file on the local filesystem
    Local,
    /// Process memory (lost on exit)
    Memory,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub local: LocalStorageConfig,
}

/// GitHub repository-contents configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Fine-grained token with contents read/write
    #[serde(default)]
    pub token: String,
    /// Repository owner
    #[serde(default)]
    pub owner: String,
    /// Repository name
    #[serde(default)]
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Path of the collection file inside the repository
    #[serde(default = "default_collection_path")]
    pub path: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Request timeout in seconds
    #[serde(default = "default_github_timeout")]
    pub timeout_secs: u64,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_collection_path() -> String {
    "data/prips.json".to_string()
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_github_timeout() -> u64 {
    30
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            owner: String::new(),
            repo: String::new(),
            branch: default_branch(),
            path: default_collection_path(),
            api_base: default_api_base(),
            timeout_secs: default_github_timeout(),
        }
    }
}

/// Local file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    pub path: PathBuf,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data").join("prips.json"),
        }
    }
}

/// One marker phrase and the section label it maps to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionRule {
    /// Phrase searched for case-insensitively
    pub marker: String,
    /// Label stored on the record
    pub label: String,
}

impl SectionRule {
    pub fn new(marker: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            label: label.into(),
        }
    }
}

/// Classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Checked in order, first match wins
    pub sections: Vec<SectionRule>,
    /// Label used when no marker matches
    pub default_label: String,
    /// Keyword that precedes the serial number
    pub number_keyword: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            sections: vec![
                SectionRule::new("ПРИП Новороссийск", "ПРИП Новороссийск"),
                SectionRule::new("НАВИП", "НАВИП"),
            ],
            default_label: "Other".to_string(),
            number_keyword: "№".to_string(),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum description length in characters
    pub max_desc_chars: usize,
    /// End-of-message tokens, matched alone on a line
    pub sentinel_tokens: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_desc_chars: 800,
            // Latin and Cyrillic spellings
            sentinel_tokens: vec!["NNNN".to_string(), "НННН".to_string()],
        }
    }
}
