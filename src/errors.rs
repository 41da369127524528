use thiserror::Error;

#[derive(Debug, Error)]
pub enum MbcError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown job: {0}")]
    UnknownJob(String),

    #[error("Pattern error: {0}")]
    Pattern(String),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for MbcError {
    fn from(err: std::io::Error) -> Self {
        MbcError::Internal(err.to_string())
    }
}

impl From<glob::PatternError> for MbcError {
    fn from(err: glob::PatternError) -> Self {
        MbcError::Pattern(err.to_string())
    }
}
