use attest_core::{RequestId, SubmissionId};
use thiserror::Error;

use crate::request::SubmissionStatus;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("verification policy {0} already exists")]
    PolicyExists(String),

    #[error("presentation request {0} is not active")]
    RequestInactive(RequestId),

    #[error("presentation request {0} has expired")]
    RequestExpired(RequestId),

    /// One submission per submitter per request.
    #[error("{submitter} has already submitted to request {request_id}")]
    DuplicateSubmission {
        request_id: RequestId,
        submitter: String,
    },

    #[error("{0}")]
    MissingRequiredCredential(String),

    #[error("submission {submission_id} was already {status}")]
    AlreadyProcessed {
        submission_id: SubmissionId,
        status: SubmissionStatus,
    },

    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl WorkflowError {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
