//! Batch job records and the submission wire contract.

use std::fmt;

use attest_core::{Did, JobId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Upper bound on items per submission.
pub const MAX_BATCH_ITEMS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    /// Terminal, whether or not any item failed.
    Completed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One issuance request inside a submission.
///
/// Fields are optional on the wire so that a malformed item fails on its
/// own during processing instead of rejecting the whole submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    #[serde(rename = "recipientDID", default, skip_serializing_if = "Option::is_none")]
    pub recipient_did: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_subject: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
}

impl BatchItem {
    pub fn new(recipient: &Did, subject: Value) -> Self {
        Self {
            recipient_did: Some(recipient.to_string()),
            credential_subject: Some(subject),
            expiration_date: None,
        }
    }
}

/// `{schemaId, issuer, credentials: [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSubmission {
    pub schema_id: String,
    pub issuer: Did,
    pub credentials: Vec<BatchItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemOutcome {
    Issued,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult {
    pub index: usize,
    pub credential_id: String,
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemError {
    pub index: usize,
    pub message: String,
}

/// A batch job. `processed == results.len() + errors.len()` and
/// `failed == errors.len()` hold at every observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchJob {
    #[serde(rename = "jobId")]
    pub id: JobId,
    pub status: JobStatus,
    pub schema_id: String,
    pub issuer: Did,
    pub total: usize,
    pub processed: usize,
    pub failed: usize,
    pub results: Vec<ItemResult>,
    pub errors: Vec<ItemError>,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
}

impl BatchJob {
    pub fn pending(schema_id: String, issuer: Did, total: usize) -> Self {
        Self {
            id: JobId::new(),
            status: JobStatus::Pending,
            schema_id,
            issuer,
            total,
            processed: 0,
            failed: 0,
            results: Vec::new(),
            errors: Vec::new(),
            created_at: Timestamp::now(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == JobStatus::Completed
    }

    /// Completed, or still running, with at least one failed item.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub(crate) fn record_success(&mut self, index: usize, credential_id: String) {
        self.results.push(ItemResult {
            index,
            credential_id,
            outcome: ItemOutcome::Issued,
        });
        self.processed += 1;
    }

    pub(crate) fn record_failure(&mut self, index: usize, message: String) {
        self.errors.push(ItemError { index, message });
        self.failed += 1;
        self.processed += 1;
    }
}

/// Response to a submission: `{jobId, status: "pending", total}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub job_id: JobId,
    pub status: JobStatus,
    pub total: usize,
}

impl From<&BatchJob> for SubmissionReceipt {
    fn from(job: &BatchJob) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            total: job.total,
        }
    }
}
