//! The terminal result of a run and the text artifact rendered from it.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const STRUCTURE_HEADER: &str = "Directory structure:\n";
pub const CONTENT_HEADER: &str =
    "================================================\nFILE CONTENT:\n================================================\n\n";

/// Which part of the artifact to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputSection {
    #[default]
    All,
    Structure,
    Content,
}

impl FromStr for OutputSection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(OutputSection::All),
            "structure" | "tree" => Ok(OutputSection::Structure),
            "content" => Ok(OutputSection::Content),
            other => Err(format!(
                "unknown section '{other}' (expected 'all', 'structure' or 'content')"
            )),
        }
    }
}

impl fmt::Display for OutputSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputSection::All => f.write_str("all"),
            OutputSection::Structure => f.write_str("structure"),
            OutputSection::Content => f.write_str("content"),
        }
    }
}

/// Counts and text produced once per run.
///
/// `processed_count + read_error_count + ignored_count + api_skip_count`
/// always equals `total_items_listed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub root_name: String,
    pub total_items_listed: usize,
    pub processed_count: usize,
    pub ignored_count: usize,
    pub read_error_count: usize,
    pub api_skip_count: usize,
    pub tree_text: String,
    pub combined_text: String,
    /// Non-fatal problems met during the run.
    pub warnings: Vec<String>,
    /// Paths that were accepted but could not be read, with the reason.
    pub failed_paths: Vec<(String, String)>,
}

impl RunReport {
    /// The one-line status shown when a run completes. Zero-valued optional
    /// clauses are left out.
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("Done. Processed {} files.", self.processed_count)];
        if self.ignored_count > 0 {
            parts.push(format!("Ignored/Filtered {}.", self.ignored_count));
        }
        if self.read_error_count > 0 {
            parts.push(format!("Read errors: {}.", self.read_error_count));
        }
        if self.api_skip_count > 0 {
            parts.push(format!("API skips (>1MB): {}.", self.api_skip_count));
        }
        parts.push(format!("Total items analyzed: {}.", self.total_items_listed));
        parts.join(" ")
    }

    /// Tree, separator and concatenated file contents.
    pub fn render_artifact(&self) -> String {
        let mut artifact = String::with_capacity(
            STRUCTURE_HEADER.len() + self.tree_text.len() + CONTENT_HEADER.len() + self.combined_text.len() + 1,
        );
        artifact.push_str(STRUCTURE_HEADER);
        artifact.push_str(&self.tree_text);
        artifact.push('\n');
        artifact.push_str(CONTENT_HEADER);
        artifact.push_str(&self.combined_text);
        artifact
    }

    pub fn render_section(&self, section: OutputSection) -> String {
        match section {
            OutputSection::All => self.render_artifact(),
            OutputSection::Structure => format!("{STRUCTURE_HEADER}{}", self.tree_text),
            OutputSection::Content => self.combined_text.clone(),
        }
    }

    /// Number of cl100k tokens in the full artifact, if the encoder is available.
    pub fn estimate_tokens(&self) -> Option<usize> {
        match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Some(bpe.encode_with_special_tokens(&self.render_artifact()).len()),
            Err(e) => {
                tracing::warn!("Token estimate unavailable: {}", e);
                None
            }
        }
    }

    /// False when no file made it into the output.
    pub fn has_output(&self) -> bool {
        self.processed_count > 0 && !self.combined_text.is_empty()
    }
}

/// File name used when saving the artifact, e.g. `octo_demo_ingest.txt`.
pub fn download_file_name(root_name: &str) -> String {
    let safe: String = root_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!("{safe}_ingest.txt")
}
