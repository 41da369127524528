use serde::{Deserialize, Serialize};

/// Outcome of one batch submission: which files were newly queued (in
/// expansion order) and which patterns expanded to nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchSummary {
    pub queued: usize,
    pub files: Vec<String>,
    pub unmatched_patterns: Vec<String>,
}
