//! Status events emitted by a run, and the sink abstraction that receives them.

use std::fmt;
use tokio::sync::mpsc;

/// The states of one aggregation run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Idle,
    Preparing,
    ListingItems,
    LoadingGitignore,
    Filtering,
    Reading,
    Aggregating,
    Done,
    Failed,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunStage::Idle => "Idle",
            RunStage::Preparing => "Preparing...",
            RunStage::ListingItems => "Listing items...",
            RunStage::LoadingGitignore => "Reading .gitignore...",
            RunStage::Filtering => "Analyzing items...",
            RunStage::Reading => "Reading files...",
            RunStage::Aggregating => "Generating structure...",
            RunStage::Done => "Done",
            RunStage::Failed => "Failed",
        };
        f.write_str(label)
    }
}

/// Events sent from a running aggregation to whoever drives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// The run entered a new stage.
    Stage(RunStage),
    /// Periodic update while filtering the listed items.
    FilterProgress {
        analyzed: usize,
        total: usize,
        filtered: usize,
    },
    /// Cumulative number of finished reads after each batch window.
    ReadProgress { done: usize, total: usize },
    /// A non-fatal problem (e.g. an unreadable `.gitignore`).
    Warning(String),
    /// The run completed; carries the summary sentence.
    Finished(String),
    /// The run aborted; carries the error message.
    Failed(String),
}

/// A fire-and-forget receiver of [`RunEvent`]s.
pub trait EventSink: Send + Sync + Clone + 'static {
    fn send_event(&self, event: RunEvent);
}

impl EventSink for mpsc::UnboundedSender<RunEvent> {
    fn send_event(&self, event: RunEvent) {
        // A dropped receiver just means nobody is listening any more.
        if let Err(e) = self.send(event) {
            tracing::debug!("Run event dropped: {}", e);
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn send_event(&self, _event: RunEvent) {}
}
