use futures_util::future::join_all;
use std::fmt::Display;
use std::future::Future;
use tracing::{debug, warn};

use super::progress::{ProgressBand, ProgressSink};

/// Configuration for chunked task execution.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// The number of items in flight at once.
    ///
    /// A chunk must fully settle before the next one is issued, so this is
    /// also the peak number of pending worker futures.
    pub chunk_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { chunk_size: 10 }
    }
}

/// Outcome counters of one [`BatchRunner::run`] call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub chunks: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Runs a task list in sequential chunks with concurrency inside each chunk.
///
/// Workers are polled concurrently on the calling task (no spawning), so they
/// may borrow from the caller. Failed items are logged and omitted from the
/// output; results keep input order only up to chunk granularity.
///
/// # Examples
///
/// ```rust,ignore
/// let runner = BatchRunner::new(BatchConfig { chunk_size: 10 });
/// let sizes = runner
///     .run(nodes, |node| async move { resolve(node).await }, ProgressBand::new(0, 50), &progress)
///     .await;
/// ```
#[derive(Debug, Clone, Default)]
pub struct BatchRunner {
    config: BatchConfig,
}

impl BatchRunner {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    pub fn chunk_size(&self) -> usize {
        self.config.chunk_size.max(1)
    }

    /// Process `items` chunk by chunk, reporting progress inside `band`
    pub async fn run<T, R, E, F, Fut>(
        &self,
        items: Vec<T>,
        worker: F,
        band: ProgressBand,
        progress: &dyn ProgressSink,
    ) -> Vec<R>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: Display,
    {
        let (results, stats) = self.run_with_stats(items, worker, band, progress).await;
        if stats.failed > 0 {
            warn!(
                "Batch finished with {} of {} items dropped",
                stats.failed,
                stats.failed + stats.succeeded
            );
        }
        results
    }

    /// Same as [`run`](Self::run), also returning counters
    pub async fn run_with_stats<T, R, E, F, Fut>(
        &self,
        items: Vec<T>,
        worker: F,
        band: ProgressBand,
        progress: &dyn ProgressSink,
    ) -> (Vec<R>, BatchStats)
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: Display,
    {
        let chunk_size = self.chunk_size();
        let total_chunks = items.len().div_ceil(chunk_size);
        let mut stats = BatchStats::default();
        let mut results = Vec::with_capacity(items.len());

        if total_chunks == 0 {
            progress.report(band.end());
            return (results, stats);
        }

        let mut remaining = items.into_iter().peekable();
        while remaining.peek().is_some() {
            let chunk: Vec<T> = remaining.by_ref().take(chunk_size).collect();
            let settled = join_all(chunk.into_iter().map(&worker)).await;

            for outcome in settled {
                match outcome {
                    Ok(result) => {
                        stats.succeeded += 1;
                        results.push(result);
                    }
                    Err(e) => {
                        stats.failed += 1;
                        debug!("Batch item dropped: {}", e);
                    }
                }
            }

            stats.chunks += 1;
            progress.report(band.at(stats.chunks, total_chunks));
        }

        (results, stats)
    }
}
