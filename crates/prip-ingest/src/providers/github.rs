//! GitHub repository-contents backend
//!
//! Stores the collection as one file in a repository branch. The blob `sha`
//! returned on read is the version tag; GitHub rejects a write whose `sha`
//! is stale, which gives the optimistic-concurrency precondition for free.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::GithubConfig;
use crate::error::{Error, Result};
use crate::providers::contents::{ContentsProvider, RemoteFile};

const API_VERSION: &str = "2022-11-28";

/// GitHub contents API client for a single file
pub struct GithubContents {
    client: Client,
    config: GithubConfig,
    url: Url,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
    #[serde(default)]
    size: u64,
}

#[derive(Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Deserialize)]
struct PutContent {
    sha: String,
}

impl GithubContents {
    /// Create a new GitHub contents client
    pub fn new(config: &GithubConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("prip-ingest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        let url = contents_url(config)?;

        Ok(Self {
            client,
            config: config.clone(),
            url,
        })
    }

    fn read_url(&self) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair("ref", &self.config.branch);
        url
    }

    fn unavailable(&self, action: &str, detail: impl std::fmt::Display) -> Error {
        Error::store_unavailable(format!("GitHub {} of {} failed: {}", action, self.location(), detail))
    }

    /// Files over 1MB come back without inline content
    async fn fetch_raw(&self) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.read_url())
            .bearer_auth(&self.config.token)
            .header("Accept", "application/vnd.github.raw+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await
            .map_err(|e| self.unavailable("raw read", e))?;

        if !response.status().is_success() {
            return Err(self.unavailable("raw read", response.status()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.unavailable("raw read", e))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ContentsProvider for GithubContents {
    async fn fetch(&self) -> Result<Option<RemoteFile>> {
        let response = self
            .client
            .get(self.read_url())
            .bearer_auth(&self.config.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await
            .map_err(|e| self.unavailable("read", e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::info!("{} does not exist yet, starting from an empty collection", self.location());
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.unavailable("read", format!("{} {}", status, body)));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| self.unavailable("read", e))?;

        let parsed = parse_content_response(body, &self.location())?;
        match parsed {
            ParsedContent::Inline(file) => Ok(Some(file)),
            ParsedContent::TooLarge { version } => {
                tracing::debug!("{} has no inline content, fetching raw", self.location());
                let content = self.fetch_raw().await?;
                Ok(Some(RemoteFile { content, version }))
            }
        }
    }

    async fn write(
        &self,
        content: &[u8],
        expected_version: Option<&str>,
        message: &str,
    ) -> Result<String> {
        let request = PutRequest {
            message,
            content: STANDARD.encode(content),
            branch: &self.config.branch,
            sha: expected_version,
        };

        let response = self
            .client
            .put(self.url.clone())
            .bearer_auth(&self.config.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.unavailable("write", e))?;

        let status = response.status();
        if is_conflict(status) {
            return Err(Error::ConcurrentModification(self.location()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.unavailable("write", format!("{} {}", status, body)));
        }

        let put: PutResponse = response
            .json()
            .await
            .map_err(|e| self.unavailable("write", e))?;
        Ok(put.content.sha)
    }

    fn location(&self) -> String {
        format!(
            "{}/{}:{}@{}",
            self.config.owner, self.config.repo, self.config.path, self.config.branch
        )
    }

    fn name(&self) -> &str {
        "github"
    }
}

enum ParsedContent {
    Inline(RemoteFile),
    TooLarge { version: String },
}

/// `/repos/{owner}/{repo}/contents/{path}` with every segment escaped
fn contents_url(config: &GithubConfig) -> Result<Url> {
    let mut url = Url::parse(&config.api_base)
        .map_err(|e| Error::Config(format!("Invalid GitHub API base '{}': {}", config.api_base, e)))?;

    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| Error::Config(format!("GitHub API base '{}' cannot be a base", config.api_base)))?;
        segments
            .pop_if_empty()
            .extend(["repos", config.owner.as_str(), config.repo.as_str(), "contents"])
            .extend(config.path.split('/').filter(|s| !s.is_empty()));
    }

    Ok(url)
}

/// A 409 is a stale `sha`; a 422 on create means the file appeared meanwhile
fn is_conflict(status: StatusCode) -> bool {
    status == StatusCode::CONFLICT || status == StatusCode::UNPROCESSABLE_ENTITY
}

fn parse_content_response(body: serde_json::Value, location: &str) -> Result<ParsedContent> {
    if body.is_array() {
        return Err(Error::UnexpectedResourceType(location.to_string()));
    }

    let response: ContentResponse = serde_json::from_value(body)?;
    if response.kind != "file" {
        return Err(Error::UnexpectedResourceType(location.to_string()));
    }

    if response.encoding == "none" || (response.content.is_empty() && response.size > 0) {
        return Ok(ParsedContent::TooLarge {
            version: response.sha,
        });
    }

    let cleaned: String = response
        .content
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let content = STANDARD
        .decode(cleaned)
        .map_err(|e| Error::store_unavailable(format!("Invalid base64 from {}: {}", location, e)))?;

    Ok(ParsedContent::Inline(RemoteFile {
        content,
        version: response.sha,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> GithubConfig {
        GithubConfig {
            token: "t".to_string(),
            owner: "someone".to_string(),
            repo: "prip-navip-map".to_string(),
            ..GithubConfig::default()
        }
    }

    #[test]
    fn test_contents_url() {
        let url = contents_url(&config()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/someone/prip-navip-map/contents/data/prips.json"
        );

        let mut custom = config();
        custom.api_base = "https://ghe.example.com/api/v3/".to_string();
        custom.path = "/карта/prips.json".to_string();
        let url = contents_url(&custom).unwrap();
        assert!(url.as_str().starts_with("https://ghe.example.com/api/v3/repos/someone/"));
        assert!(url.path().ends_with("/contents/%D0%BA%D0%B0%D1%80%D1%82%D0%B0/prips.json"));
    }

    #[test]
    fn test_location() {
        let provider = GithubContents::new(&config()).unwrap();
        assert_eq!(provider.location(), "someone/prip-navip-map:data/prips.json@main");
        assert_eq!(provider.read_url().query(), Some("ref=main"));
    }

    #[test]
    fn test_parse_file_response() {
        // GitHub wraps base64 at 60 columns
        let encoded = STANDARD.encode(b"[\n  {\"title\": \"x\"}\n]");
        let wrapped = format!("{}\n{}\n", &encoded[..10], &encoded[10..]);
        let body = json!({
            "type": "file",
            "encoding": "base64",
            "size": 21,
            "sha": "abc123",
            "content": wrapped,
        });

        match parse_content_response(body, "loc").unwrap() {
            ParsedContent::Inline(file) => {
                assert_eq!(file.version, "abc123");
                assert_eq!(file.content, b"[\n  {\"title\": \"x\"}\n]");
            }
            ParsedContent::TooLarge { .. } => panic!("expected inline content"),
        }
    }

    #[test]
    fn test_directory_listing_is_rejected() {
        let body = json!([{"type": "file", "sha": "a", "name": "prips.json"}]);
        assert!(matches!(
            parse_content_response(body, "loc"),
            Err(Error::UnexpectedResourceType(_))
        ));

        let body = json!({"type": "submodule", "sha": "a"});
        assert!(matches!(
            parse_content_response(body, "loc"),
            Err(Error::UnexpectedResourceType(_))
        ));
    }

    #[test]
    fn test_large_file_needs_raw_fetch() {
        let body = json!({"type": "file", "encoding": "none", "size": 2_000_000, "sha": "big", "content": ""});
        match parse_content_response(body, "loc").unwrap() {
            ParsedContent::TooLarge { version } => assert_eq!(version, "big"),
            ParsedContent::Inline(_) => panic!("expected raw fetch"),
        }
    }

    #[test]
    fn test_conflict_statuses() {
        assert!(is_conflict(StatusCode::CONFLICT));
        assert!(is_conflict(StatusCode::UNPROCESSABLE_ENTITY));
        assert!(!is_conflict(StatusCode::UNAUTHORIZED));
        assert!(!is_conflict(StatusCode::OK));
    }

    #[test]
    fn test_put_request_omits_missing_sha() {
        let request = PutRequest {
            message: "add PRIP: x",
            content: STANDARD.encode(b"[]"),
            branch: "main",
            sha: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("sha").is_none());
        assert_eq!(value["content"], "W10=");
    }
}
