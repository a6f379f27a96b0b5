//! Sequences one run: list, load `.gitignore`, filter, read in batches, aggregate.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use super::batch::run_batched;
use super::error::{CoreError, ReadError};
use super::filter::{Decision, FilterConfig, FilterPolicy};
use super::ignore::GitignoreRuleSet;
use super::progress::{EventSink, RunEvent, RunStage};
use super::report::RunReport;
use super::source::{ContentSource, ListResult};
use super::tree_generator::TreeGenerator;
use super::{FileItem, ReadResult};

/// Filter progress is reported, and the task yields, every this many items.
const FILTER_PROGRESS_INTERVAL: usize = 100;

const ROOT_GITIGNORE: &str = ".gitignore";

/// Drives runs against one [`ContentSource`] and reports to one [`EventSink`].
///
/// Each call to [`Aggregator::run`] starts from scratch; nothing is cached
/// between runs.
pub struct Aggregator<S: EventSink> {
    source: Arc<dyn ContentSource>,
    sink: S,
    stage: Mutex<RunStage>,
}

impl<S: EventSink> Aggregator<S> {
    pub fn new(source: Arc<dyn ContentSource>, sink: S) -> Self {
        Self {
            source,
            sink,
            stage: Mutex::new(RunStage::Idle),
        }
    }

    /// The stage the most recent run is in (or ended in).
    pub fn stage(&self) -> RunStage {
        *self.stage.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs the whole pipeline with a snapshot of the filter settings.
    ///
    /// Only discovery failures are returned as errors. Per-file problems end up
    /// in the report's counts.
    pub async fn run(&self, config: FilterConfig) -> Result<RunReport, CoreError> {
        let started = Instant::now();
        self.enter(RunStage::Preparing);

        match self.execute(config).await {
            Ok(report) => {
                self.enter(RunStage::Done);
                let summary = report.summary();
                tracing::info!("{} ({:.2?})", summary, started.elapsed());
                self.sink.send_event(RunEvent::Finished(summary));
                Ok(report)
            }
            Err(e) => {
                self.enter(RunStage::Failed);
                tracing::error!("Run failed: {}", e);
                self.sink.send_event(RunEvent::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    fn enter(&self, stage: RunStage) {
        *self.stage.lock().unwrap_or_else(|e| e.into_inner()) = stage;
        tracing::debug!("Stage: {}", stage);
        self.sink.send_event(RunEvent::Stage(stage));
    }

    fn record_warning(&self, warnings: &mut Vec<String>, message: String) {
        tracing::warn!("{}", message);
        self.sink.send_event(RunEvent::Warning(message.clone()));
        warnings.push(message);
    }

    async fn execute(&self, config: FilterConfig) -> Result<RunReport, CoreError> {
        self.enter(RunStage::ListingItems);
        let listing = self.source.list().await?;
        let total = listing.total_count;

        if total == 0 {
            tracing::info!("Nothing found in {}", listing.root_name);
            let no_paths: [&str; 0] = [];
            return Ok(RunReport {
                tree_text: TreeGenerator::generate_tree(&no_paths, &listing.root_name),
                root_name: listing.root_name,
                ..Default::default()
            });
        }

        self.enter(RunStage::LoadingGitignore);
        let mut warnings = Vec::new();
        let rules = self.load_gitignore(&listing, config.max_size_bytes, &mut warnings).await;
        let config = config.with_gitignore_rules(rules);
        let policy = FilterPolicy::new(&config);

        self.enter(RunStage::Filtering);
        let ceiling = self.source.content_ceiling();
        let item_count = listing.items.len();
        let mut filtered = 0;
        let mut api_skips = 0;
        let mut accepted = Vec::new();
        let mut tasks = Vec::new();

        for (index, item) in listing.items.iter().enumerate() {
            if item.is_directory() || item.path == ROOT_GITIGNORE {
                // The rules file feeds the filter; it is never part of the output.
                filtered += 1;
            } else if ceiling.is_some_and(|limit| item.size > limit) {
                tracing::debug!("Skipping {}: {} bytes exceeds the source limit", item.path, item.size);
                api_skips += 1;
            } else {
                match policy.evaluate(&item.path, item.size, &item.name) {
                    Decision::Reject(reason) => {
                        tracing::debug!("Filtered {}: {:?}", item.path, reason);
                        filtered += 1;
                    }
                    Decision::Accept => {
                        tasks.push(read_task(self.source.clone(), item.clone(), config.max_size_bytes));
                        accepted.push(item.clone());
                    }
                }
            }

            let analyzed = index + 1;
            if analyzed % FILTER_PROGRESS_INTERVAL == 0 || analyzed == item_count {
                self.sink.send_event(RunEvent::FilterProgress {
                    analyzed,
                    total: item_count,
                    filtered,
                });
                tokio::task::yield_now().await;
            }
        }
        tracing::info!(
            "{} of {} items accepted for reading",
            tasks.len(),
            total
        );

        self.enter(RunStage::Reading);
        let sink = self.sink.clone();
        let outcomes = run_batched(tasks, self.source.batch_policy(), |done, total| {
            sink.send_event(RunEvent::ReadProgress { done, total });
        })
        .await;

        let results = outcomes
            .into_iter()
            .zip(&accepted)
            .map(|(outcome, item)| {
                outcome.unwrap_or_else(|e| {
                    let error = ReadError::Task {
                        path: item.path.clone(),
                        message: e.to_string(),
                    };
                    tracing::warn!("{}", error);
                    ReadResult::failure(item.path.clone(), item.size, error)
                })
            })
            .collect();

        self.enter(RunStage::Aggregating);
        Ok(Self::aggregate(listing, results, api_skips, warnings))
    }

    /// Reads and parses a root `.gitignore`, if listed. An unreadable file
    /// is a warning and leaves the rule set empty.
    async fn load_gitignore(
        &self,
        listing: &ListResult,
        max_size_bytes: u64,
        warnings: &mut Vec<String>,
    ) -> GitignoreRuleSet {
        let Some(item) = listing
            .items
            .iter()
            .find(|item| item.is_file() && item.path == ROOT_GITIGNORE)
        else {
            tracing::info!("No root .gitignore found");
            return GitignoreRuleSet::default();
        };

        match self.source.read(item, max_size_bytes).await {
            Ok(content) => {
                let rules = GitignoreRuleSet::parse(&content);
                tracing::info!(
                    "Loaded {} rules from .gitignore ({} negations ignored)",
                    rules.len(),
                    rules.negated_count()
                );
                rules
            }
            Err(e) => {
                self.record_warning(warnings, format!("Could not read .gitignore: {e}"));
                GitignoreRuleSet::default()
            }
        }
    }

    fn aggregate(
        listing: ListResult,
        results: Vec<ReadResult>,
        api_skip_count: usize,
        warnings: Vec<String>,
    ) -> RunReport {
        let (mut successes, failures): (Vec<_>, Vec<_>) =
            results.into_iter().partition(|result| !result.failed());
        successes.sort_by(|a, b| a.path.cmp(&b.path));

        let paths: Vec<&str> = successes.iter().map(|r| r.path.as_str()).collect();
        let tree_text = TreeGenerator::generate_tree(&paths, &listing.root_name);

        let mut combined_text = String::new();
        for result in &successes {
            combined_text.push_str(&format!("--- FILENAME: {} ---\n", result.path));
            combined_text.push_str(result.content.as_deref().unwrap_or_default());
            combined_text.push_str("\n\n");
        }

        let mut failed_paths: Vec<(String, String)> = failures
            .into_iter()
            .map(|r| (r.path, r.error.unwrap_or_default()))
            .collect();
        failed_paths.sort();

        let processed_count = successes.len();
        let read_error_count = failed_paths.len();
        let ignored_count = listing
            .total_count
            .saturating_sub(processed_count + read_error_count + api_skip_count);

        RunReport {
            root_name: listing.root_name,
            total_items_listed: listing.total_count,
            processed_count,
            ignored_count,
            read_error_count,
            api_skip_count,
            tree_text,
            combined_text,
            warnings,
            failed_paths,
        }
    }
}

fn read_task(
    source: Arc<dyn ContentSource>,
    item: FileItem,
    max_size_bytes: u64,
) -> impl Future<Output = ReadResult> + Send + 'static {
    async move {
        match source.read(&item, max_size_bytes).await {
            Ok(content) => ReadResult::success(item.path, content, item.size),
            Err(e) => {
                tracing::warn!("Skipping file {}: {}", item.path, e);
                ReadResult::failure(item.path, item.size, e)
            }
        }
    }
}
