use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::convert::Converter;
use crate::errors::MbcError;
use crate::models::JobStatus;
use crate::store::JobStatusStore;

/// Bounded-concurrency conversion pool: a fixed set of worker tasks drains
/// a shared FIFO queue and records every outcome in the status store.
///
/// Enqueuing is fire-and-forget; nothing about a job's fate is reported to
/// the submitter except through the store. Workers only exit when the queue
/// closes (the pool handle is dropped), never because a job failed.
pub struct WorkerPool {
    tx: mpsc::UnboundedSender<String>,
}

impl WorkerPool {
    /// Spawn `workers` tasks pulling from a shared queue. A `timeout` of
    /// zero disables the per-job limit.
    pub fn start(
        workers: usize,
        store: Arc<JobStatusStore>,
        converter: Arc<dyn Converter>,
        timeout: Duration,
    ) -> Self {
        let timeout = if timeout.is_zero() {
            // Effectively infinite (136 years).
            Duration::from_secs(u64::MAX / 2)
        } else {
            timeout
        };

        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        for worker_id in 0..workers.max(1) {
            let rx = Arc::clone(&rx);
            let store = Arc::clone(&store);
            let converter = Arc::clone(&converter);

            tokio::spawn(async move {
                loop {
                    // Hold the queue lock only to dequeue, never while a
                    // conversion runs.
                    let job = { rx.lock().await.recv().await };
                    match job {
                        Some(path) => {
                            run_job(worker_id, path, &store, &converter, timeout).await
                        }
                        None => break,
                    }
                }
                tracing::debug!("Worker {} exiting, queue closed", worker_id);
            });
        }

        Self { tx }
    }

    /// Enqueue one registered path. Returns promptly; fails only when the
    /// pool has shut down.
    pub fn submit(&self, path: String) -> Result<(), MbcError> {
        self.tx
            .send(path)
            .map_err(|_| MbcError::Internal("worker pool queue is closed".to_string()))
    }
}

/// Execute one job: flip to Processing, run the collaborator in its own task
/// under the wall-clock limit, record the terminal state. All writes after
/// Processing are guarded so a late or stray result can never clobber a
/// terminal state already recorded.
async fn run_job(
    worker_id: usize,
    path: String,
    store: &JobStatusStore,
    converter: &Arc<dyn Converter>,
    timeout: Duration,
) {
    if let Err(e) = store.transition(&path, JobStatus::Processing, None) {
        // The record vanished between enqueue and dequeue (store cleared).
        tracing::error!("Cannot start conversion for '{}': {}", path, e);
        return;
    }
    tracing::info!("Worker {} converting {}", worker_id, path);

    let task_converter = Arc::clone(converter);
    let input = PathBuf::from(&path);
    let mut task = tokio::spawn(async move { task_converter.convert(&input).await });

    match tokio::time::timeout(timeout, &mut task).await {
        Ok(Ok(Ok(output))) => {
            let message = format!("Converted to {}", output.display());
            if store.transition_if_processing(&path, JobStatus::Completed, Some(message)) {
                tracing::info!("Completed {}", path);
            } else {
                tracing::warn!("Discarding late completion for {}", path);
            }
        }
        Ok(Ok(Err(e))) => {
            tracing::warn!("Conversion failed for {}: {}", path, e);
            store.transition_if_processing(&path, JobStatus::Error, Some(e.to_string()));
        }
        Ok(Err(join_err)) => {
            // The conversion task panicked; contain it to this job.
            tracing::error!("Conversion task for {} failed: {}", path, join_err);
            store.transition_if_processing(
                &path,
                JobStatus::Error,
                Some(format!("Conversion task failed: {}", join_err)),
            );
        }
        Err(_) => {
            task.abort();
            let message = format!("Conversion timed out after {}s", timeout.as_secs());
            tracing::warn!("{}: {}", message, path);
            store.transition_if_processing(&path, JobStatus::Error, Some(message));
        }
    }
}
