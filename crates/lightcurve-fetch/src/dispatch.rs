use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use crate::archive::Archive;
use crate::layout::ArtifactLayout;
use crate::result::{FetchResult, FetchStatus};
use crate::stats::{Advisory, AdvisoryPolicy, RunStats};
use crate::summary::{Summary, SummaryError, SummarySink};
use crate::target::TargetId;
use crate::worker::{fetch_one, panic_message};

pub const DEFAULT_WORKERS: usize = 20;
pub const DEFAULT_CHECKPOINT_EVERY: usize = 50;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(300);

/// Knobs for one run of the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Maximum fetches in flight at once.
    pub workers: usize,
    /// Persist the summary after every this many completed results.
    pub checkpoint_every: usize,
    /// Upper bound on a single fetch. `None` waits indefinitely.
    pub fetch_timeout: Option<Duration>,
    pub advisory: AdvisoryPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            checkpoint_every: DEFAULT_CHECKPOINT_EVERY,
            fetch_timeout: Some(DEFAULT_FETCH_TIMEOUT),
            advisory: AdvisoryPolicy::default(),
        }
    }
}

/// Progress hooks. All methods are called from the dispatcher loop, one at
/// a time.
pub trait RunObserver: Send + Sync {
    fn started(&self, _pending: usize) {}
    fn completed(&self, _result: &FetchResult, _done: usize, _total: usize) {}
    fn checkpointed(&self, _done: usize, _total: usize) {}
    fn finished(&self) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to write final summary: {0}")]
    FinalSummary(#[source] SummaryError),
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Identifiers dispatched in this run.
    pub attempted: usize,
    /// Checkpoints written before the final summary.
    pub checkpoints: usize,
    /// Statistics over the whole summary, prior rows included.
    pub stats: RunStats,
    pub advisory: Option<Advisory>,
}

/// Runs workers over a bounded pool and folds their results into a summary.
pub struct Dispatcher {
    archive: Arc<dyn Archive>,
    layout: ArtifactLayout,
    config: RunConfig,
}

impl Dispatcher {
    pub fn new(archive: Arc<dyn Archive>, layout: ArtifactLayout, config: RunConfig) -> Self {
        Self {
            archive,
            layout,
            config,
        }
    }

    /// Fetch every pending identifier and append the results to `summary`.
    ///
    /// Results arrive in completion order. The summary goes to `sink` after
    /// every `checkpoint_every` results and once more at the end; only the
    /// final write can fail the run.
    pub async fn run(
        &self,
        pending: Vec<TargetId>,
        summary: &mut Summary,
        sink: &dyn SummarySink,
        observer: &dyn RunObserver,
    ) -> Result<RunReport, RunError> {
        let total = pending.len();
        let workers = self.config.workers.max(1);
        let checkpoint_every = self.config.checkpoint_every.max(1);

        tracing::info!(
            pending = total,
            workers,
            checkpoint_every,
            archive = self.archive.label(),
            "dispatching fetches"
        );
        observer.started(total);

        let mut results = futures::stream::iter(pending)
            .map(|target| {
                let archive = Arc::clone(&self.archive);
                let layout = self.layout.clone();
                let timeout = self.config.fetch_timeout;
                async move {
                    let id = target.clone();
                    match tokio::spawn(fetch_one(archive, target, layout, timeout)).await {
                        Ok(result) => result,
                        Err(e) => {
                            let msg = if e.is_panic() {
                                panic_message(e.into_panic())
                            } else {
                                e.to_string()
                            };
                            tracing::warn!(kepler_id = %id, error = %msg, "fetch task died");
                            FetchResult::failed(id, FetchStatus::Crashed(msg))
                        }
                    }
                }
            })
            .buffer_unordered(workers);

        let mut done = 0usize;
        let mut checkpoints = 0usize;

        while let Some(result) = results.next().await {
            done += 1;
            observer.completed(&result, done, total);
            summary.push(result);

            if done % checkpoint_every == 0 {
                match sink.persist(summary) {
                    Ok(()) => {
                        checkpoints += 1;
                        tracing::info!(done, total, "checkpoint saved");
                        observer.checkpointed(done, total);
                    }
                    Err(e) => {
                        tracing::warn!(done, total, error = %e, "checkpoint failed, continuing");
                    }
                }
            }
        }

        sink.persist(summary).map_err(RunError::FinalSummary)?;
        observer.finished();

        let stats = RunStats::from_results(summary.rows());
        let advisory = self.config.advisory.advise(&stats, self.config.workers);

        tracing::info!(
            attempted = total,
            succeeded = stats.succeeded,
            total = stats.total,
            "run complete"
        );

        Ok(RunReport {
            attempted: total,
            checkpoints,
            stats,
            advisory,
        })
    }
}
