//! Single-worker request queue
//!
//! Every provider call runs through here: tasks execute one at a time in
//! submission order, each under its own timeout.

use aiadapter_common::{AiAdapterError, Result};
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Per-task timeout
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(600);

struct Job {
    id: u64,
    generation: u64,
    run: BoxFuture<'static, ()>,
}

/// FIFO queue with a single worker
pub struct RequestQueue {
    tx: mpsc::UnboundedSender<Job>,
    generation: Arc<AtomicU64>,
    pending: Arc<AtomicUsize>,
    next_id: AtomicU64,
    timeout: Duration,
    worker: JoinHandle<()>,
}

impl RequestQueue {
    /// Create queue with the default timeout
    ///
    /// Must be called inside a tokio runtime.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TASK_TIMEOUT)
    }

    /// Create queue with a custom per-task timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let generation = Arc::new(AtomicU64::new(0));
        let pending = Arc::new(AtomicUsize::new(0));

        let worker = tokio::spawn(run_worker(rx, generation.clone(), pending.clone()));

        Self {
            tx,
            generation,
            pending,
            next_id: AtomicU64::new(0),
            timeout,
            worker,
        }
    }

    /// Enqueue `task` and wait for its result
    ///
    /// The timeout starts when the task begins running. A task dropped by
    /// [`clear`](Self::clear) resolves with [`AiAdapterError::QueueCleared`].
    pub async fn add<F, T>(&self, task: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();
        let timeout = self.timeout;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let run = Box::pin(async move {
            let result = match tokio::time::timeout(timeout, task).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("Queued task {} timed out after {:?}", id, timeout);
                    Err(AiAdapterError::Timeout(timeout))
                }
            };
            // Submitter may have stopped waiting
            let _ = result_tx.send(result);
        });

        self.pending.fetch_add(1, Ordering::SeqCst);
        let job = Job {
            id,
            generation: self.generation.load(Ordering::SeqCst),
            run,
        };

        if self.tx.send(job).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(AiAdapterError::QueueCleared);
        }

        result_rx.await.map_err(|_| AiAdapterError::QueueCleared)?
    }

    /// Drop every task that has not started yet
    ///
    /// The running task, if any, is left to finish.
    pub fn clear(&self) {
        let dropped = self.pending.load(Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
        debug!("Request queue cleared ({} pending)", dropped);
    }

    /// Tasks queued but not started
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Per-task timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RequestQueue {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<Job>,
    generation: Arc<AtomicU64>,
    pending: Arc<AtomicUsize>,
) {
    while let Some(job) = rx.recv().await {
        pending.fetch_sub(1, Ordering::SeqCst);

        if job.generation < generation.load(Ordering::SeqCst) {
            debug!("Skipping cleared task {}", job.id);
            continue;
        }

        debug!("Running queued task {}", job.id);
        job.run.await;
    }
}
