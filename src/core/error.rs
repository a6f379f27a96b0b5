//! Defines the custom error types for the `core` module.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a whole run.
///
/// Every variant is fatal for a run: it aborts discovery and no partial
/// tree or content is produced. Per-file problems are [`ReadError`]s instead.
#[derive(Debug, Error)]
pub enum CoreError {
    /// File system failure at the given path.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    /// The local root exists but is not a folder.
    #[error("Path is not a valid directory: {0}")]
    NotADirectory(PathBuf),

    /// The repository URL is not of the form `https://github.com/{owner}/{repo}`.
    #[error("Invalid GitHub URL: {0}")]
    InvalidUrl(String),

    /// The repository or a path inside it does not exist (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The API rate limit is exhausted (HTTP 403 with zero remaining requests).
    #[error("{}", rate_limit_message(.reset_at))]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    /// Access was denied for a reason other than rate limiting (HTTP 403).
    #[error("Access denied for {0}")]
    AccessDenied(String),

    /// Any other non-success API response.
    #[error("API error ({status}) for path \"/{path}\": {message}")]
    Api {
        status: u16,
        message: String,
        path: String,
    },

    /// The API answered with a body we could not interpret as a listing.
    #[error("Unexpected API response for path \"/{0}\"")]
    UnexpectedResponse(String),

    /// Represents a transport-level HTTP failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a malformed JSON body.
    #[error("Failed to parse API response: {0}")]
    Json(#[from] serde_json::Error),

    /// A spawned listing task panicked or was cancelled.
    /// This is often due to a task panicking.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

fn rate_limit_message(reset_at: &Option<DateTime<Utc>>) -> String {
    match reset_at {
        Some(reset) => format!(
            "Rate limit exceeded. Try again after {}.",
            reset.format("%H:%M:%S UTC")
        ),
        None => "Rate limit exceeded.".to_string(),
    }
}

/// A non-fatal failure to read a single file.
///
/// These never abort a run; the file is left out of the output and tallied
/// under read errors.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Size ({size} bytes) > limit ({limit} bytes)")]
    SizeExceeded { size: u64, limit: u64 },

    #[error("File size ({size} bytes) > API limit ({limit} bytes)")]
    ApiLimit { size: u64, limit: u64 },

    #[error("Null byte detected: {0}")]
    NullByte(String),

    #[error("Could not decode API content: {0}")]
    Decode(String),

    #[error("Read error for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("API fetch error ({status}) \"{path}\"")]
    Http { status: u16, path: String },

    #[error("Request failed for \"{path}\": {message}")]
    Transport { path: String, message: String },

    #[error("Read task for \"{path}\" did not complete: {message}")]
    Task { path: String, message: String },
}
