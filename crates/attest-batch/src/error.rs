use attest_core::JobId;
use attest_schema::SchemaError;
use thiserror::Error;

use crate::job::JobStatus;

/// Job persistence failure.
#[derive(Error, Debug)]
pub enum JobStoreError {
    #[error("job store I/O error at {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("job record {path} is corrupt: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("job {0} already exists")]
    Duplicate(JobId),

    /// A blocking store operation panicked or was cancelled.
    #[error("job store worker failed: {0}")]
    Worker(String),
}

#[derive(Error, Debug)]
pub enum BatchError {
    /// The submission as a whole is malformed (item count out of bounds).
    #[error("invalid batch submission: {0}")]
    Validation(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Unknown or already evicted.
    #[error("batch job not found: {0}")]
    JobNotFound(JobId),

    #[error("batch job {job_id} is {status} and cannot be cancelled")]
    InvalidState { job_id: JobId, status: JobStatus },

    #[error(transparent)]
    Store(#[from] JobStoreError),
}
