//! Where candidate files come from.
//!
//! A [`ContentSource`] lists every item once per run and reads accepted files
//! one by one. The orchestrator is written against this trait only.

pub mod github;
pub mod http;
pub mod local;

use async_trait::async_trait;

use super::batch::BatchPolicy;
use super::error::{CoreError, ReadError};
use super::FileItem;

pub use github::{GithubRepoSource, RepoCoordinates, GITHUB_API_MAX_FILE_SIZE_BYTES};
pub use http::{HttpResponse, HttpTransport, ReqwestTransport};
pub use local::LocalFolderSource;

/// The outcome of discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListResult {
    /// Discovered files and directories, sorted by path.
    pub items: Vec<FileItem>,
    /// Number of entries the source saw, including ones that never became items.
    pub total_count: usize,
    /// Label used for the root of the rendered tree.
    pub root_name: String,
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Discovers the candidate items. Any error here is fatal for the run.
    async fn list(&self) -> Result<ListResult, CoreError>;

    /// Reads one file as text. Failures are per-file and never fatal.
    async fn read(&self, item: &FileItem, max_size_bytes: u64) -> Result<String, ReadError>;

    /// Window size and pacing for reads from this source.
    fn batch_policy(&self) -> BatchPolicy;

    /// Hard per-file size limit imposed by the source itself, if any.
    /// Files above it are skipped without being read.
    fn content_ceiling(&self) -> Option<u64> {
        None
    }
}
