use std::sync::Arc;

use crate::errors::MbcError;
use crate::models::{BatchSummary, JobStatus};
use crate::patterns::PatternExpander;
use crate::pool::WorkerPool;
use crate::store::JobStatusStore;

/// Orchestrates one submission: expand patterns, register fresh jobs as
/// Queued, hand them to the pool. Returns promptly; progress is observable
/// only through the status store.
pub struct BatchCoordinator {
    expander: PatternExpander,
    store: Arc<JobStatusStore>,
    pool: WorkerPool,
}

impl BatchCoordinator {
    pub fn new(expander: PatternExpander, store: Arc<JobStatusStore>, pool: WorkerPool) -> Self {
        Self {
            expander,
            store,
            pool,
        }
    }

    /// Expand `patterns` and queue every resolved file that is not already
    /// in flight. Paths whose registration lost to an existing
    /// Queued/Processing record are skipped, so a file never has two
    /// concurrent conversions.
    pub fn submit(&self, patterns: &[String]) -> Result<BatchSummary, MbcError> {
        let expansion = self.expander.expand(patterns);

        let mut files = Vec::new();
        for path in expansion.files {
            if !self.store.register(&path) {
                tracing::debug!("Skipping {}, already queued or processing", path);
                continue;
            }
            if let Err(e) = self.pool.submit(path.clone()) {
                // Only reachable during shutdown; leave an Error record
                // rather than a Queued job that will never run.
                tracing::error!("Failed to enqueue {}: {}", path, e);
                let _ = self.store.transition(
                    &path,
                    JobStatus::Error,
                    Some("Worker pool unavailable".to_string()),
                );
                continue;
            }
            files.push(path);
        }

        tracing::info!(
            "Batch queued {} file(s), {} pattern(s) unmatched",
            files.len(),
            expansion.unmatched.len()
        );

        Ok(BatchSummary {
            queued: files.len(),
            files,
            unmatched_patterns: expansion.unmatched,
        })
    }
}
