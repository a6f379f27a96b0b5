//! Bounded-concurrency execution of read tasks in fixed-size windows.

use std::future::Future;
use std::time::Duration;

use super::error::CoreError;

/// How many tasks run at once, and how long to pause between windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    pub batch_size: usize,
    pub inter_batch_delay: Duration,
}

impl BatchPolicy {
    /// Local reads are not rate-limited and can run wider.
    pub const LOCAL: BatchPolicy = BatchPolicy {
        batch_size: 15,
        inter_batch_delay: Duration::ZERO,
    };

    /// Remote reads stay narrow and pause between windows to respect API throttling.
    pub const REMOTE: BatchPolicy = BatchPolicy {
        batch_size: 5,
        inter_batch_delay: Duration::from_millis(50),
    };
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self::LOCAL
    }
}

/// Runs `tasks` window by window and returns one result per task, in input order.
///
/// Every task of a window is spawned before any is awaited, and the whole window
/// finishes before the next starts. `on_progress(done, total)` is called after
/// each window. Between windows the runner always suspends, sleeping for the
/// policy's delay when one is set. A task that panics shows up as an `Err` in
/// its own slot; the batch itself always completes.
pub async fn run_batched<T, Fut, P>(
    tasks: Vec<Fut>,
    policy: BatchPolicy,
    mut on_progress: P,
) -> Vec<Result<T, CoreError>>
where
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
    P: FnMut(usize, usize),
{
    let total = tasks.len();
    let batch_size = policy.batch_size.max(1);
    let mut results = Vec::with_capacity(total);
    let mut pending = tasks.into_iter().peekable();

    while pending.peek().is_some() {
        let handles: Vec<_> = pending.by_ref().take(batch_size).map(tokio::spawn).collect();

        for handle in handles {
            results.push(handle.await.map_err(CoreError::from));
        }

        on_progress(results.len(), total);

        if pending.peek().is_some() && !policy.inter_batch_delay.is_zero() {
            tokio::time::sleep(policy.inter_batch_delay).await;
        } else {
            tokio::task::yield_now().await;
        }
    }

    results
}
