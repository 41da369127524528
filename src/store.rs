use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::errors::MbcError;
use crate::models::{JobRecord, JobStatus};

/// Single owner of all job records, keyed by source file path.
///
/// Every operation takes the lock for its own duration only and never calls
/// out while holding it, so readers can never observe a half-applied
/// transition. Uses std::sync::Mutex (not tokio) so it can be called from
/// both sync and async contexts without awaiting.
#[derive(Debug, Default)]
pub struct JobStatusStore {
    jobs: Mutex<HashMap<String, JobRecord>>,
}

impl JobStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, JobRecord>> {
        // Every critical section is a plain map edit, so the map stays
        // consistent even if a holder panicked.
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a path as Queued. Returns true if a fresh record was
    /// created (path absent or in a terminal state), false if the path is
    /// already Queued or Processing — in which case nothing changes and the
    /// caller must not dispatch a second conversion for it.
    pub fn register(&self, path: &str) -> bool {
        let mut jobs = self.lock();
        match jobs.get(path) {
            Some(record) if !record.status.is_terminal() => false,
            _ => {
                jobs.insert(path.to_string(), JobRecord::queued());
                true
            }
        }
    }

    /// Overwrite status, message and timestamp for an existing record.
    /// Transitioning a path that was never registered is a logic fault in
    /// the caller and reported as `MbcError::UnknownJob`.
    pub fn transition(
        &self,
        path: &str,
        status: JobStatus,
        message: Option<String>,
    ) -> Result<(), MbcError> {
        let mut jobs = self.lock();
        match jobs.get_mut(path) {
            Some(record) => {
                record.status = status;
                record.message = message;
                record.timestamp = Utc::now();
                Ok(())
            }
            None => Err(MbcError::UnknownJob(path.to_string())),
        }
    }

    /// Guarded transition: applies only while the record is still
    /// Processing. Returns false (no-op) otherwise, which makes a late
    /// result from an abandoned conversion — or a result landing after a
    /// clear — harmless.
    pub fn transition_if_processing(
        &self,
        path: &str,
        status: JobStatus,
        message: Option<String>,
    ) -> bool {
        let mut jobs = self.lock();
        match jobs.get_mut(path) {
            Some(record) if record.status == JobStatus::Processing => {
                record.status = status;
                record.message = message;
                record.timestamp = Utc::now();
                true
            }
            _ => false,
        }
    }

    /// Consistent point-in-time copy of all records.
    pub fn snapshot(&self) -> HashMap<String, JobRecord> {
        self.lock().clone()
    }

    /// Atomically remove all records.
    pub fn clear(&self) {
        self.lock().clear();
    }
}
