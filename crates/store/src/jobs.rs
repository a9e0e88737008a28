//! Background jobs keyed to a document generation
//!
//! Every job captures the generation that was current when it was
//! submitted. When the job finishes, its result is only delivered as
//! [`JobOutcome::Completed`] if that generation is still current; otherwise
//! it comes back as [`JobOutcome::Stale`] and the caller drops it.

use crate::{Result, StoreError};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use tokio::task::JoinHandle;

/// Monotonic counter bumped whenever the live document is replaced or closed
#[derive(Debug, Clone)]
pub struct GenerationCounter {
    current: Arc<AtomicU64>,
}

impl GenerationCounter {
    /// Start at generation 1
    pub fn new() -> Self {
        Self { current: Arc::new(AtomicU64::new(1)) }
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    /// Move to the next generation and return it
    pub fn advance(&self) -> u64 {
        self.current.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

impl Default for GenerationCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellation token for cooperative job cancellation.
///
/// Workers check [`is_cancelled`](Self::is_cancelled) between pages and stop
/// early. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel this token and every clone of it
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Return `Err(Cancelled)` once cancelled, for use with `?` inside workers
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(StoreError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// How a background job ended
#[derive(Debug)]
pub enum JobOutcome<T> {
    /// Finished for the document that is still current
    Completed(T),
    /// The worker reported an error
    Failed(StoreError),
    /// Finished, but the document it was computed from has been replaced
    Stale { submitted: u64, current: u64 },
    /// Stopped through its cancellation token
    Cancelled,
}

impl<T> JobOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, JobOutcome::Completed(_))
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, JobOutcome::Stale { .. })
    }

    /// Collapse into a `Result`, mapping discarded results to errors
    pub fn into_result(self) -> Result<T> {
        match self {
            JobOutcome::Completed(value) => Ok(value),
            JobOutcome::Failed(e) => Err(e),
            JobOutcome::Stale { submitted, current } => Err(StoreError::Stale { submitted, current }),
            JobOutcome::Cancelled => Err(StoreError::Cancelled),
        }
    }
}

/// A running job. Awaiting [`join`](Self::join) delivers its outcome once.
#[derive(Debug)]
pub struct JobHandle<T> {
    generation: u64,
    counter: GenerationCounter,
    cancel: CancellationToken,
    task: JoinHandle<Result<T>>,
}

impl<T: Send + 'static> JobHandle<T> {
    /// Run `work` on the blocking pool, tagged with the current generation.
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(counter: &GenerationCounter, work: F) -> Self
    where
        F: FnOnce(&CancellationToken) -> Result<T> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let worker_token = cancel.clone();
        let task = tokio::task::spawn_blocking(move || work(&worker_token));
        Self { generation: counter.current(), counter: counter.clone(), cancel, task }
    }

    /// Generation the job was submitted under
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the job and classify its result
    pub async fn join(self) -> JobOutcome<T> {
        let result = match self.task.await {
            Ok(result) => result,
            Err(e) => return JobOutcome::Failed(StoreError::Join(e.to_string())),
        };

        let current = self.counter.current();
        if current != self.generation {
            tracing::warn!(
                "Discarding result computed for generation {} (current {})",
                self.generation,
                current
            );
            return JobOutcome::Stale { submitted: self.generation, current };
        }
        if self.cancel.is_cancelled() {
            return JobOutcome::Cancelled;
        }

        match result {
            Ok(value) => JobOutcome::Completed(value),
            Err(StoreError::Cancelled) => JobOutcome::Cancelled,
            Err(e) => JobOutcome::Failed(e),
        }
    }
}
