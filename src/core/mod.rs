pub mod aggregator;
pub mod batch;
pub mod error;
pub mod filter;
pub mod ignore;
pub mod pattern;
pub mod progress;
pub mod report;
pub mod source;
pub mod tree_generator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    File,
    Directory,
}

/// One entry discovered by a [`source::ContentSource`].
///
/// `path` is slash-separated and relative to the source root, without a
/// leading slash. A directory item never yields content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileItem {
    pub path: String,
    pub name: String,
    pub size: u64,
    pub kind: ItemKind,
}

impl FileItem {
    pub fn file(path: impl Into<String>, size: u64) -> Self {
        let path = path.into();
        Self {
            name: base_name(&path).to_string(),
            path,
            size,
            kind: ItemKind::File,
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: base_name(&path).to_string(),
            path,
            size: 0,
            kind: ItemKind::Directory,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == ItemKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == ItemKind::Directory
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// The outcome of reading one accepted file. `content` is set only on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadResult {
    pub path: String,
    pub content: Option<String>,
    pub size: u64,
    pub error: Option<String>,
}

impl ReadResult {
    pub fn success(path: impl Into<String>, content: String, size: u64) -> Self {
        Self {
            path: path.into(),
            content: Some(content),
            size,
            error: None,
        }
    }

    pub fn failure(path: impl Into<String>, size: u64, error: impl ToString) -> Self {
        Self {
            path: path.into(),
            content: None,
            size,
            error: Some(error.to_string()),
        }
    }

    pub fn failed(&self) -> bool {
        self.content.is_none()
    }
}

pub use aggregator::Aggregator;
pub use batch::{run_batched, BatchPolicy};
pub use error::{CoreError, ReadError};
pub use filter::{Decision, FilterConfig, FilterMode, FilterPolicy, RejectReason};
pub use ignore::GitignoreRuleSet;
pub use progress::{EventSink, NoopSink, RunEvent, RunStage};
pub use report::{OutputSection, RunReport};
pub use source::{ContentSource, GithubRepoSource, ListResult, LocalFolderSource};
pub use tree_generator::{TreeGenerator, TreeNode};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_item_derives_name_from_last_segment() {
        assert_eq!(FileItem::file("src/core/mod.rs", 10).name, "mod.rs");
        assert_eq!(FileItem::file("README.md", 3).name, "README.md");
        assert_eq!(FileItem::directory("src/core").name, "core");
    }

    #[test]
    fn read_result_failure_has_no_content() {
        let failed = ReadResult::failure("a.bin", 4, ReadError::NullByte("a.bin".into()));
        assert!(failed.failed());
        assert!(failed.error.unwrap().contains("a.bin"));
        assert!(!ReadResult::success("a.txt", String::new(), 0).failed());
    }
}
