//! Runs one ingest from the command line: config, source, aggregation, output.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::cli::Cli;
use crate::config::{settings, AppConfig};
use crate::core::aggregator::Aggregator;
use crate::core::filter::FilterConfig;
use crate::core::progress::RunEvent;
use crate::core::report::{download_file_name, RunReport};
use crate::core::source::{
    ContentSource, GithubRepoSource, LocalFolderSource, RepoCoordinates, ReqwestTransport,
};

/// Where the items of a run come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    Local(PathBuf),
    Remote(String),
}

impl SourceSpec {
    /// URLs (and bare `github.com/...` references) are remote; anything else
    /// is a local path.
    pub fn classify(input: &str) -> Self {
        let input = input.trim();
        if input.starts_with("http://") || input.starts_with("https://") {
            SourceSpec::Remote(input.to_string())
        } else if input.starts_with("github.com/") {
            SourceSpec::Remote(format!("https://{input}"))
        } else {
            SourceSpec::Local(PathBuf::from(input))
        }
    }
}

/// Builds the content source for `spec` with the batch policy and API
/// settings from `config`.
pub fn build_source(spec: &SourceSpec, config: &AppConfig) -> Result<Arc<dyn ContentSource>> {
    match spec {
        SourceSpec::Local(path) => Ok(Arc::new(
            LocalFolderSource::new(path).with_batch_policy(config.batch_policy_local()),
        )),
        SourceSpec::Remote(url) => {
            let coords = RepoCoordinates::parse_url(url)?;
            let transport = ReqwestTransport::new(config.github_token.clone())
                .context("Failed to set up the HTTP client")?;
            Ok(Arc::new(
                GithubRepoSource::new(coords, Arc::new(transport))
                    .with_api_base(config.github_api_base.clone())
                    .with_batch_policy(config.batch_policy_remote()),
            ))
        }
    }
}

/// Runs the aggregator and forwards its events to the log.
pub async fn run_ingest(source: Arc<dyn ContentSource>, filter: FilterConfig) -> Result<RunReport> {
    let (tx, rx) = mpsc::unbounded_channel();
    let forwarder = tokio::spawn(log_events(rx));

    let aggregator = Aggregator::new(source, tx);
    let result = aggregator.run(filter).await;
    // Dropping the aggregator closes the channel so the forwarder can finish.
    drop(aggregator);
    forwarder.await?;

    Ok(result?)
}

async fn log_events(mut rx: mpsc::UnboundedReceiver<RunEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            RunEvent::Stage(stage) => tracing::info!("{}", stage),
            RunEvent::FilterProgress {
                analyzed,
                total,
                filtered,
            } => tracing::info!("Analyzing item {}/{}... (Filtered: {})", analyzed, total, filtered),
            RunEvent::ReadProgress { done, total } => {
                tracing::info!("Reading file {}/{}...", done, total)
            }
            RunEvent::Warning(message) => tracing::warn!("{}", message),
            // Logged by the aggregator itself.
            RunEvent::Finished(_) | RunEvent::Failed(_) => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

/// Resolves `-o` / `--download` into a destination. A download goes to the
/// configured output directory, or the working directory when none is set.
pub fn output_target(cli: &Cli, config: &AppConfig, root_name: &str) -> Result<OutputTarget> {
    if let Some(path) = &cli.output {
        return Ok(OutputTarget::File(path.clone()));
    }
    if cli.download {
        let dir = match &config.output_directory {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Failed to resolve the working directory")?,
        };
        return Ok(OutputTarget::File(dir.join(download_file_name(root_name))));
    }
    Ok(OutputTarget::Stdout)
}

pub fn write_file(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Saved output to {}", path.display());
    Ok(())
}

/// The binary's entry point after argument parsing.
///
/// `--import-config` replaces the stored settings before anything else runs;
/// `--export-config` writes the settings in effect for this invocation.
/// Without a source nothing is ingested.
pub async fn run_cli(cli: Cli) -> Result<()> {
    let mut config = match &cli.import_config {
        Some(path) => {
            let imported = settings::import_config(path)?;
            settings::save_config(&imported, cli.config.as_deref())?;
            imported
        }
        None => settings::load_config(cli.config.as_deref())?,
    };
    config.apply_env_overrides();
    cli.apply_to(&mut config);

    if let Some(path) = &cli.export_config {
        settings::export_config(&config, path)?;
    }

    let Some(source) = cli.source.as_deref() else {
        return Ok(());
    };
    let spec = SourceSpec::classify(source);
    let source = build_source(&spec, &config)?;
    let report = run_ingest(source, config.filter_config()).await?;

    for (path, reason) in &report.failed_paths {
        tracing::debug!("Not included: {} ({})", path, reason);
    }
    if let Some(tokens) = report.estimate_tokens() {
        tracing::info!("Estimated tokens: {}", tokens);
    }

    let text = report.render_section(cli.section);
    match output_target(&cli, &config, &report.root_name)? {
        OutputTarget::File(_) if !report.has_output() => {
            tracing::warn!("No processable files found; nothing written");
        }
        OutputTarget::File(path) => write_file(&path, &text)?,
        OutputTarget::Stdout => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::FilterMode;
    use clap::Parser;
    use std::fs;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("repo-ingest").chain(args.iter().copied()))
    }

    #[test]
    fn urls_are_remote_and_paths_are_local() {
        assert_eq!(
            SourceSpec::classify("https://github.com/octo/demo"),
            SourceSpec::Remote("https://github.com/octo/demo".into())
        );
        assert_eq!(
            SourceSpec::classify("github.com/octo/demo"),
            SourceSpec::Remote("https://github.com/octo/demo".into())
        );
        assert_eq!(
            SourceSpec::classify("./projects/demo"),
            SourceSpec::Local(PathBuf::from("./projects/demo"))
        );
    }

    #[test]
    fn invalid_repository_url_fails_early() {
        let spec = SourceSpec::Remote("https://gitlab.com/octo/demo".into());
        let error = build_source(&spec, &AppConfig::default()).err().unwrap();
        assert!(error.to_string().contains("Invalid GitHub URL"));
    }

    #[test]
    fn download_uses_the_output_directory() {
        let config = AppConfig {
            output_directory: Some(PathBuf::from("/tmp/ingest")),
            ..Default::default()
        };
        let target = output_target(&cli(&[".", "--download"]), &config, "octo/demo").unwrap();
        assert_eq!(
            target,
            OutputTarget::File(PathBuf::from("/tmp/ingest/octo_demo_ingest.txt"))
        );

        let target = output_target(&cli(&[".", "-o", "out.txt"]), &config, "octo/demo").unwrap();
        assert_eq!(target, OutputTarget::File(PathBuf::from("out.txt")));

        let target = output_target(&cli(&["."]), &config, "octo/demo").unwrap();
        assert_eq!(target, OutputTarget::Stdout);
    }

    #[tokio::test]
    async fn run_ingest_reads_a_local_folder() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("notes.md"), "# notes").unwrap();

        let source = build_source(&SourceSpec::Local(dir.path().to_path_buf()), &AppConfig::default()).unwrap();
        let filter = FilterConfig::new(1024, vec!["*.md".into()], FilterMode::Exclude);
        let report = run_ingest(source, filter).await.unwrap();

        assert_eq!(report.processed_count, 1);
        assert_eq!(report.ignored_count, 1);
        assert!(report.combined_text.contains("--- FILENAME: main.rs ---\nfn main() {}\n\n"));
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn run_cli_writes_the_requested_file() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("project");
        fs::create_dir_all(project.join("src")).unwrap();
        fs::write(project.join("src/lib.rs"), "pub fn f() {}").unwrap();
        let out = dir.path().join("out/structure.txt");
        let config = dir.path().join("config.json");

        let cli = cli(&[
            project.to_str().unwrap(),
            "--section",
            "structure",
            "-o",
            out.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ]);
        run_cli(cli).await.unwrap();

        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            "Directory structure:\n└── project/\n    └── src/\n        └── lib.rs\n"
        );
        assert!(config.exists());
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn settings_can_be_exported_and_imported() {
        let dir = tempfile::tempdir().unwrap();
        let stored = dir.path().join("stored.json");
        let shared = dir.path().join("shared.json");

        run_cli(cli(&[
            "--config",
            stored.to_str().unwrap(),
            "--patterns",
            "*.lock",
            "--token",
            "ghp_secret",
            "--export-config",
            shared.to_str().unwrap(),
        ]))
        .await
        .unwrap();
        let exported = fs::read_to_string(&shared).unwrap();
        assert!(exported.contains("*.lock"));
        assert!(!exported.contains("ghp_secret"));

        let target = dir.path().join("target.json");
        run_cli(cli(&[
            "--config",
            target.to_str().unwrap(),
            "--import-config",
            shared.to_str().unwrap(),
        ]))
        .await
        .unwrap();
        let imported = settings::load_config(Some(&target)).unwrap();
        assert_eq!(imported.filter_patterns, "*.lock");
        assert_eq!(imported.github_token, None);
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source =
            build_source(&SourceSpec::Local(dir.path().join("nope")), &AppConfig::default()).unwrap();
        let filter = AppConfig::default().filter_config();
        assert!(run_ingest(source, filter).await.is_err());
    }
}
