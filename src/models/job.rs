use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of one conversion job: Queued -> Processing -> Completed | Error.
/// Terminal states are only left via a full store clear or a re-registration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

/// The per-job record held by the status store. `timestamp` is the time of
/// the last transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRecord {
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl JobRecord {
    pub fn queued() -> Self {
        Self {
            status: JobStatus::Queued,
            message: None,
            timestamp: Utc::now(),
        }
    }
}
