pub mod batch;
pub mod config;
pub mod job;

pub use batch::BatchSummary;
pub use config::ConverterConfig;
pub use job::{JobRecord, JobStatus};
