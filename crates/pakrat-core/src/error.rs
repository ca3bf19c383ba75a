//! Error types for pakrat.

use thiserror::Error;

use crate::models::JobStatus;

/// Result type alias using pakrat's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for pakrat operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Submission or request arguments were rejected
    #[error("Validation error: {0}")]
    Validation(String),

    /// Client exceeded the submission window limit
    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Job (or its archive) not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Cooperative cancellation observed at a checkpoint
    #[error("Job cancelled")]
    Cancelled,

    /// Attempted an illegal job status transition
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    /// Artifact could not be loaded or parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// A single object failed to materialize
    #[error("Object read error: {0}")]
    ObjectRead(String),

    /// A single exporter failed to write its asset
    #[error("Export error: {0}")]
    Export(String),

    /// Packaging the result archive failed
    #[error("Archive error: {0}")]
    Archive(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the error terminates a job as `Cancelled` rather than `Error`.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Message safe to hand to clients when verbose errors are disabled.
    ///
    /// Validation, rate-limit, and not-found errors are always shown as-is;
    /// processing errors collapse to a generic line unless `verbose` is set.
    pub fn client_message(&self, verbose: bool) -> String {
        match self {
            Error::Validation(_)
            | Error::RateLimited { .. }
            | Error::NotFound(_)
            | Error::Cancelled
            | Error::InvalidTransition { .. } => self.to_string(),
            _ if verbose => self.to_string(),
            _ => "Processing failed".to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
