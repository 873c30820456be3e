//! # attest-batch: Batch Credential Issuance
//!
//! A submission of up to [`MAX_BATCH_ITEMS`] issuance requests becomes a
//! [`BatchJob`] that moves `pending → processing → completed`. One task
//! owns each job and issues its items strictly in order. A failing item is
//! recorded in `errors` and never stops the batch, so a job whose every
//! item failed still ends `completed`; inspect `failed`.
//!
//! Jobs live in a [`JobStore`]: [`MemoryJobStore`] for tests and
//! single-process deployments, [`FileJobStore`] when job state should
//! outlive the process.

pub mod engine;
pub mod error;
pub mod job;
pub mod store;

pub use engine::{BatchConfig, BatchIssuanceEngine, MAX_JOB_RETENTION};
pub use error::{BatchError, JobStoreError};
pub use job::{
    BatchItem, BatchJob, BatchSubmission, ItemError, ItemOutcome, ItemResult, JobStatus,
    SubmissionReceipt, MAX_BATCH_ITEMS,
};
pub use store::{FileJobStore, JobRemoval, JobStore, MemoryJobStore};
