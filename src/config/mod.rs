pub mod settings;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::core::batch::BatchPolicy;
use crate::core::filter::{parse_user_patterns, FilterConfig, FilterMode};
use crate::core::source::github::DEFAULT_API_BASE;

pub const TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const API_BASE_ENV: &str = "REPO_INGEST_API_BASE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub max_file_size_kb: u64,
    pub filter_mode: FilterMode,
    /// Comma-separated, as typed by the user.
    pub filter_patterns: String,
    pub local_batch_size: usize,
    pub remote_batch_size: usize,
    pub remote_batch_delay_ms: u64,
    pub github_api_base: String,
    pub github_token: Option<String>,
    pub output_directory: Option<PathBuf>,
}

impl AppConfig {
    /// The immutable filter snapshot handed to one run.
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig::new(
            self.max_file_size_kb.saturating_mul(1024),
            parse_user_patterns(&self.filter_patterns),
            self.filter_mode,
        )
    }

    pub fn batch_policy_local(&self) -> BatchPolicy {
        BatchPolicy {
            batch_size: self.local_batch_size.max(1),
            inter_batch_delay: Duration::ZERO,
        }
    }

    pub fn batch_policy_remote(&self) -> BatchPolicy {
        BatchPolicy {
            batch_size: self.remote_batch_size.max(1),
            inter_batch_delay: Duration::from_millis(self.remote_batch_delay_ms),
        }
    }

    /// `GITHUB_TOKEN` fills in a missing token; `REPO_INGEST_API_BASE`
    /// replaces the API base.
    pub fn apply_env_overrides(&mut self) {
        if self.github_token.is_none() {
            if let Some(token) = non_empty_env(TOKEN_ENV) {
                tracing::debug!("Using GitHub token from {}", TOKEN_ENV);
                self.github_token = Some(token);
            }
        }
        if let Some(base) = non_empty_env(API_BASE_ENV) {
            tracing::debug!("Using API base {} from {}", base, API_BASE_ENV);
            self.github_api_base = base;
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

impl Default for AppConfig {
    fn default() -> Self {
        let local = BatchPolicy::LOCAL;
        let remote = BatchPolicy::REMOTE;
        Self {
            max_file_size_kb: 1024,
            filter_mode: FilterMode::Exclude,
            filter_patterns: String::new(),
            local_batch_size: local.batch_size,
            remote_batch_size: remote.batch_size,
            remote_batch_delay_ms: remote.inter_batch_delay.as_millis() as u64,
            github_api_base: DEFAULT_API_BASE.to_string(),
            github_token: None,
            output_directory: None,
        }
    }
}
