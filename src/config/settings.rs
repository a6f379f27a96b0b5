use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

use super::AppConfig;

const APP_NAME: &str = "RepoIngest";
const CONFIG_FILE: &str = "config.json";

// Resolved config files:
// Linux:   ~/.config/repoingest/config.json
// macOS:   ~/Library/Application Support/com.repoingest.RepoIngest/config.json
// Windows: %APPDATA%\repoingest\RepoIngest\config\config.json

/// The per-user file used when no `--config` path is given.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "repoingest", APP_NAME).map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

fn resolve(explicit: Option<&Path>) -> Result<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(default_config_path)
        .context("No config directory available on this platform")
}

/// Loads the configuration from `path`, or from the per-user file.
/// A missing file is created with defaults. A file that cannot be parsed is
/// left untouched on disk and defaults are used for this run.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = resolve(path)?;

    if !path.exists() {
        tracing::info!("Writing default settings to {}", path.display());
        let config = AppConfig::default();
        save_config_to(&config, &path)?;
        return Ok(config);
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    Ok(serde_json::from_str::<AppConfig>(&raw).unwrap_or_else(|e| {
        tracing::warn!("Ignoring unreadable settings in {}: {}", path.display(), e);
        AppConfig::default()
    }))
}

/// Saves the configuration to `path`, or to the per-user file.
pub fn save_config(config: &AppConfig, path: Option<&Path>) -> Result<()> {
    save_config_to(config, &resolve(path)?)
}

fn save_config_to(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    tracing::debug!("Settings stored in {}", path.display());
    Ok(())
}

/// Writes a shareable copy of `config`. The GitHub token never leaves the
/// machine this way.
pub fn export_config(config: &AppConfig, destination: &Path) -> Result<()> {
    let shareable = AppConfig {
        github_token: None,
        ..config.clone()
    };
    fs::write(destination, serde_json::to_string_pretty(&shareable)?)
        .with_context(|| format!("Failed to write {}", destination.display()))?;
    tracing::info!("Settings exported to {}", destination.display());
    Ok(())
}

/// Reads settings someone exported. Unlike [`load_config`], a file that does
/// not parse is an error.
pub fn import_config(source: &Path) -> Result<AppConfig> {
    let raw = fs::read_to_string(source)
        .with_context(|| format!("Failed to read {}", source.display()))?;
    let config = serde_json::from_str::<AppConfig>(&raw)
        .with_context(|| format!("Invalid config file {}", source.display()))?;
    tracing::info!("Settings imported from {}", source.display());
    Ok(config)
}
