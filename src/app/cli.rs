//! Command line surface.

use clap::Parser;
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::core::filter::FilterMode;
use crate::core::report::OutputSection;

/// Flatten a local folder or a public GitHub repository into one LLM-ready text file.
#[derive(Debug, Clone, Parser)]
#[command(name = "repo-ingest", version, about)]
pub struct Cli {
    /// A local directory, or a repository URL such as https://github.com/owner/repo
    #[arg(required_unless_present_any = ["export_config", "import_config"])]
    pub source: Option<String>,

    /// Skip files larger than this many kilobytes
    #[arg(long, value_name = "KB")]
    pub max_size_kb: Option<u64>,

    /// Comma-separated glob patterns, e.g. "*.rs, docs/"
    #[arg(short, long)]
    pub patterns: Option<String>,

    /// Whether the patterns select files (include) or drop them (exclude)
    #[arg(short, long, value_name = "include|exclude")]
    pub mode: Option<FilterMode>,

    /// Number of files read concurrently per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// GitHub API base URL
    #[arg(long, value_name = "URL")]
    pub api_base: Option<String>,

    /// GitHub token for authenticated requests
    #[arg(long)]
    pub token: Option<String>,

    /// Write the output to this file instead of stdout
    #[arg(short, long, conflicts_with = "download")]
    pub output: Option<PathBuf>,

    /// Save as <root>_ingest.txt in the configured output directory
    #[arg(long)]
    pub download: bool,

    /// Which part of the output to emit: all, structure or content
    #[arg(long, default_value_t = OutputSection::All)]
    pub section: OutputSection,

    /// Use this config file instead of the platform default
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Replace the stored settings with an exported settings file
    #[arg(long, value_name = "FILE", conflicts_with = "export_config")]
    pub import_config: Option<PathBuf>,

    /// Write the effective settings, without the token, to a file
    #[arg(long, value_name = "FILE")]
    pub export_config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Applies the one-off overrides given on the command line.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(kb) = self.max_size_kb {
            config.max_file_size_kb = kb;
        }
        if let Some(patterns) = &self.patterns {
            config.filter_patterns = patterns.clone();
        }
        if let Some(mode) = self.mode {
            config.filter_mode = mode;
        }
        if let Some(size) = self.batch_size {
            config.local_batch_size = size;
            config.remote_batch_size = size;
        }
        if let Some(base) = &self.api_base {
            config.github_api_base = base.clone();
        }
        if let Some(token) = &self.token {
            config.github_token = Some(token.clone());
        }
    }
}
