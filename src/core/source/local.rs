//! Reads candidate files from a directory on the local file system.

use async_trait::async_trait;
use camino::Utf8Path;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use super::{ContentSource, ListResult};
use crate::core::batch::BatchPolicy;
use crate::core::error::{CoreError, ReadError};
use crate::core::FileItem;
use crate::utils::file_detection::contains_null_byte;

const FALLBACK_ROOT_NAME: &str = "local_codebase";

/// A local folder. Every regular file below `root` is an item; directories
/// are implicit in the file paths.
pub struct LocalFolderSource {
    root: PathBuf,
    policy: BatchPolicy,
}

impl LocalFolderSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            policy: BatchPolicy::LOCAL,
        }
    }

    pub fn with_batch_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Walks the whole tree. Nothing is filtered here: the walker's own
    /// ignore handling is switched off so that every file is accounted for.
    fn walk(root: &Path) -> (Vec<FileItem>, usize) {
        let mut items = Vec::new();
        let mut total = 0;

        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry below {}: {}", root.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            total += 1;

            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let Some(relative) = Utf8Path::from_path(relative) else {
                tracing::warn!("Skipping non UTF-8 path: {}", entry.path().display());
                continue;
            };
            let path = relative
                .components()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join("/");
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);

            items.push(FileItem::file(path, size));
        }

        items.sort_by(|a, b| a.path.cmp(&b.path));
        (items, total)
    }
}

#[async_trait]
impl ContentSource for LocalFolderSource {
    async fn list(&self) -> Result<ListResult, CoreError> {
        if !self.root.is_dir() {
            return Err(CoreError::NotADirectory(self.root.clone()));
        }

        let root = tokio::fs::canonicalize(&self.root)
            .await
            .map_err(|e| CoreError::Io(e, self.root.clone()))?;
        let root_name = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| FALLBACK_ROOT_NAME.to_string());

        let walk_root = root.clone();
        let (items, total_count) =
            tokio::task::spawn_blocking(move || Self::walk(&walk_root)).await?;

        tracing::info!(
            "Listed {} files below {}",
            total_count,
            root.display()
        );

        Ok(ListResult {
            items,
            total_count,
            root_name,
        })
    }

    async fn read(&self, item: &FileItem, max_size_bytes: u64) -> Result<String, ReadError> {
        if item.size > max_size_bytes {
            return Err(ReadError::SizeExceeded {
                size: item.size,
                limit: max_size_bytes,
            });
        }
        if item.size == 0 {
            return Ok(String::new());
        }

        let full_path = self.root.join(&item.path);
        let bytes = tokio::fs::read(&full_path)
            .await
            .map_err(|source| ReadError::Io {
                path: item.path.clone(),
                source,
            })?;

        // The file may have grown since it was listed.
        if bytes.len() as u64 > max_size_bytes {
            return Err(ReadError::SizeExceeded {
                size: bytes.len() as u64,
                limit: max_size_bytes,
            });
        }
        if contains_null_byte(&bytes) {
            return Err(ReadError::NullByte(item.name.clone()));
        }

        // Invalid UTF-8 becomes U+FFFD.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn batch_policy(&self) -> BatchPolicy {
        self.policy
    }
}
