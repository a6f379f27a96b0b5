//! Lists and reads a public GitHub repository through the REST contents API.

use async_trait::async_trait;
use base64::prelude::*;
use chrono::DateTime;
use reqwest::Url;
use serde::Deserialize;
use std::sync::Arc;
use tokio::task::JoinSet;

use super::http::{HttpResponse, HttpTransport};
use super::{ContentSource, ListResult};
use crate::core::batch::BatchPolicy;
use crate::core::error::{CoreError, ReadError};
use crate::core::FileItem;
use crate::utils::file_detection::contains_null_byte;

/// The contents API refuses to serve file bodies above this size.
pub const GITHUB_API_MAX_FILE_SIZE_BYTES: u64 = 1024 * 1024;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const JSON_ACCEPT: &str = "application/vnd.github.v3+json";
const RAW_ACCEPT: &str = "application/vnd.github.v3.raw";

/// Owner and repository name parsed from a `https://github.com/{owner}/{repo}` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinates {
    pub owner: String,
    pub repo: String,
}

impl RepoCoordinates {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Accepts `https://github.com/{owner}/{repo}[.git]` with optional extra
    /// path segments (`/tree/main/...`). Any other host is rejected.
    pub fn parse_url(url: &str) -> Result<Self, CoreError> {
        let invalid = || CoreError::InvalidUrl(url.to_string());

        let parsed = Url::parse(url.trim()).map_err(|_| invalid())?;
        if parsed.host_str() != Some("github.com") {
            return Err(invalid());
        }

        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        let [owner, repo, ..] = segments.as_slice() else {
            return Err(invalid());
        };
        let repo = repo.strip_suffix(".git").unwrap_or(*repo);
        if repo.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(*owner, repo))
    }

    /// `owner/repo`, used as the tree root label.
    pub fn display_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    fn location(&self, path: &str) -> String {
        if path.is_empty() {
            self.display_name()
        } else {
            format!("{}/{}", self.display_name(), path)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ContentEntry {
    path: String,
    #[serde(default)]
    size: u64,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Directory(Vec<ContentEntry>),
    Single(ContentEntry),
}

#[derive(Debug, Deserialize)]
struct FileContent {
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

/// Everything needed to talk to the contents endpoint of one repository.
/// Cheap to clone so listing requests can run as independent tasks.
#[derive(Clone)]
struct ContentsClient {
    api_base: String,
    coords: RepoCoordinates,
    transport: Arc<dyn HttpTransport>,
}

impl ContentsClient {
    fn contents_url(&self, path: &str) -> Result<Url, CoreError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| CoreError::InvalidUrl(format!("{}: {}", self.api_base, e)))?;
        url.path_segments_mut()
            .map_err(|_| CoreError::InvalidUrl(self.api_base.clone()))?
            .pop_if_empty()
            .extend([
                "repos",
                self.coords.owner.as_str(),
                self.coords.repo.as_str(),
                "contents",
            ])
            .extend(path.split('/'));
        Ok(url)
    }

    /// Lists one directory. Returns the entries and the sub-directories still
    /// to be listed.
    async fn list_directory(&self, path: &str) -> Result<(Vec<ContentEntry>, Vec<String>), CoreError> {
        let url = self.contents_url(path)?;
        let response = self.transport.get(&url, JSON_ACCEPT).await?;
        if !response.is_success() {
            return Err(api_error(&response, &self.coords, path));
        }

        match serde_json::from_slice::<ContentsResponse>(&response.body)? {
            ContentsResponse::Directory(entries) => {
                let follow = entries
                    .iter()
                    .filter(|entry| entry.kind == "dir")
                    .map(|entry| entry.path.clone())
                    .collect();
                Ok((entries, follow))
            }
            ContentsResponse::Single(entry) if entry.kind == "file" || entry.kind == "dir" => {
                let follow = if entry.kind == "dir" && entry.path != path {
                    vec![entry.path.clone()]
                } else {
                    Vec::new()
                };
                Ok((vec![entry], follow))
            }
            ContentsResponse::Single(_) => Err(CoreError::UnexpectedResponse(path.to_string())),
        }
    }

    async fn read_via_json(&self, url: &Url, path: &str) -> Result<String, ReadError> {
        let response = self
            .transport
            .get(url, JSON_ACCEPT)
            .await
            .map_err(|e| transport_error(path, e))?;
        if !response.is_success() {
            return Err(ReadError::Http {
                status: response.status,
                path: path.to_string(),
            });
        }

        let file: FileContent = serde_json::from_slice(&response.body)
            .map_err(|e| transport_error(path, CoreError::from(e)))?;
        match (file.encoding.as_deref(), file.content) {
            (Some("base64"), Some(content)) if !content.is_empty() => {
                if file.size > GITHUB_API_MAX_FILE_SIZE_BYTES {
                    return Err(ReadError::ApiLimit {
                        size: file.size,
                        limit: GITHUB_API_MAX_FILE_SIZE_BYTES,
                    });
                }
                let compact: String = content.split_whitespace().collect();
                let bytes = BASE64_STANDARD
                    .decode(compact)
                    .map_err(|_| ReadError::Decode(path.to_string()))?;
                decode_text(bytes, path)
            }
            _ => Err(ReadError::Decode(path.to_string())),
        }
    }
}

/// A public GitHub repository.
pub struct GithubRepoSource {
    client: ContentsClient,
    policy: BatchPolicy,
}

impl GithubRepoSource {
    pub fn new(coords: RepoCoordinates, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            client: ContentsClient {
                api_base: DEFAULT_API_BASE.to_string(),
                coords,
                transport,
            },
            policy: BatchPolicy::REMOTE,
        }
    }

    pub fn from_url(url: &str, transport: Arc<dyn HttpTransport>) -> Result<Self, CoreError> {
        Ok(Self::new(RepoCoordinates::parse_url(url)?, transport))
    }

    /// Points the source at another API host (GitHub Enterprise, test doubles).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.client.api_base = api_base.into();
        self
    }

    pub fn with_batch_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl ContentSource for GithubRepoSource {
    /// Walks the repository one directory level at a time; every directory
    /// of a level is requested concurrently.
    async fn list(&self) -> Result<ListResult, CoreError> {
        let mut entries = Vec::new();
        let mut pending = vec![String::new()];

        while !pending.is_empty() {
            let mut level = JoinSet::new();
            for dir in pending.drain(..) {
                let client = self.client.clone();
                level.spawn(async move { client.list_directory(&dir).await });
            }
            while let Some(joined) = level.join_next().await {
                let (listed, follow) = joined??;
                pending.extend(follow);
                entries.extend(listed);
            }
        }

        let total_count = entries.len();
        let mut items: Vec<FileItem> = entries
            .into_iter()
            .filter_map(|entry| match entry.kind.as_str() {
                "file" => Some(FileItem::file(entry.path, entry.size)),
                "dir" => Some(FileItem::directory(entry.path)),
                _ => None, // symlinks and submodules are counted, never read
            })
            .collect();
        items.sort_by(|a, b| a.path.cmp(&b.path));

        tracing::info!(
            "Listed {} entries in {}",
            total_count,
            self.client.coords.display_name()
        );

        Ok(ListResult {
            items,
            total_count,
            root_name: self.client.coords.display_name(),
        })
    }

    /// Fetches the raw body, falling back once to the JSON+base64 form. If
    /// both fail, the caller sees the error of the raw request.
    async fn read(&self, item: &FileItem, _max_size_bytes: u64) -> Result<String, ReadError> {
        if item.size > GITHUB_API_MAX_FILE_SIZE_BYTES {
            return Err(ReadError::ApiLimit {
                size: item.size,
                limit: GITHUB_API_MAX_FILE_SIZE_BYTES,
            });
        }
        if item.size == 0 {
            return Ok(String::new());
        }

        let url = self
            .client
            .contents_url(&item.path)
            .map_err(|e| transport_error(&item.path, e))?;
        let response = self
            .client
            .transport
            .get(&url, RAW_ACCEPT)
            .await
            .map_err(|e| transport_error(&item.path, e))?;

        if response.is_success() {
            return decode_text(response.body, &item.path);
        }

        let primary = ReadError::Http {
            status: response.status,
            path: item.path.clone(),
        };
        match self.client.read_via_json(&url, &item.path).await {
            Ok(content) => {
                tracing::debug!("Read {} through the base64 fallback", item.path);
                Ok(content)
            }
            Err(fallback) => {
                tracing::debug!("Fallback for {} failed too: {}", item.path, fallback);
                Err(primary)
            }
        }
    }

    fn batch_policy(&self) -> BatchPolicy {
        self.policy
    }

    fn content_ceiling(&self) -> Option<u64> {
        Some(GITHUB_API_MAX_FILE_SIZE_BYTES)
    }
}

fn api_error(response: &HttpResponse, coords: &RepoCoordinates, path: &str) -> CoreError {
    match response.status {
        404 => CoreError::NotFound(coords.location(path)),
        403 => {
            let exhausted = response
                .header("x-ratelimit-remaining")
                .and_then(|v| v.trim().parse::<u64>().ok())
                == Some(0);
            if exhausted {
                let reset_at = response
                    .header("x-ratelimit-reset")
                    .and_then(|v| v.trim().parse::<i64>().ok())
                    .and_then(|secs| DateTime::from_timestamp(secs, 0));
                CoreError::RateLimited { reset_at }
            } else {
                CoreError::AccessDenied(coords.location(path))
            }
        }
        status => {
            let message = serde_json::from_slice::<ApiMessage>(&response.body)
                .map(|m| m.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            CoreError::Api {
                status,
                message,
                path: path.to_string(),
            }
        }
    }
}

fn decode_text(bytes: Vec<u8>, path: &str) -> Result<String, ReadError> {
    if contains_null_byte(&bytes) {
        return Err(ReadError::NullByte(path.to_string()));
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn transport_error(path: &str, error: CoreError) -> ReadError {
    ReadError::Transport {
        path: path.to_string(),
        message: error.to_string(),
    }
}
