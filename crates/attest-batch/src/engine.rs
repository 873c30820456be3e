//! # Batch Issuance Engine
//!
//! `submit` validates the submission, stores a pending job and spawns one
//! task for it. The task issues items in submission order, recording each
//! outcome and sleeping `item_delay` between items. Before every item it
//! checks that the job still exists; a cancelled job is removed from the
//! store, so the task stops without writing again. An item already being
//! issued when the cancel lands still completes, but its outcome is
//! dropped along with the job.

use std::sync::Arc;
use std::time::Duration;

use attest_core::{CanonicalizationError, Did, JobId, Timestamp};
use attest_schema::{CredentialSchema, SchemaSource};
use attest_vc::{CredentialRecord, CredentialRepository, CredentialSigner, IssueRequest};
use serde_json::Value;

use crate::error::{BatchError, JobStoreError};
use crate::job::{BatchItem, BatchJob, BatchSubmission, JobStatus, MAX_BATCH_ITEMS};
use crate::store::{JobRemoval, JobStore};

/// Longest accepted retention window (one hundred years).
pub const MAX_JOB_RETENTION: Duration = Duration::from_secs(36_500 * 86_400);

#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Pause between items. Caps load on signing and storage.
    pub item_delay: Duration,
    /// Completed jobs older than this are evicted on the next submit.
    pub retention: Duration,
    pub max_items: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            item_delay: Duration::from_millis(100),
            retention: Duration::from_secs(3600),
            max_items: MAX_BATCH_ITEMS,
        }
    }
}

#[derive(Clone)]
pub struct BatchIssuanceEngine {
    signer: CredentialSigner,
    schemas: Arc<dyn SchemaSource>,
    credentials: Arc<dyn CredentialRepository>,
    jobs: Arc<dyn JobStore>,
    config: BatchConfig,
}

impl std::fmt::Debug for BatchIssuanceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchIssuanceEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BatchIssuanceEngine {
    pub fn new(
        signer: CredentialSigner,
        schemas: Arc<dyn SchemaSource>,
        credentials: Arc<dyn CredentialRepository>,
        jobs: Arc<dyn JobStore>,
        config: BatchConfig,
    ) -> Self {
        Self {
            signer,
            schemas,
            credentials,
            jobs,
            config,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Accept a submission and start processing it in the background.
    ///
    /// Returns the pending job. Must be called within a Tokio runtime.
    pub async fn submit(&self, submission: BatchSubmission) -> Result<BatchJob, BatchError> {
        self.evict_expired()?;

        let total = submission.credentials.len();
        if total == 0 {
            return Err(BatchError::Validation(
                "a batch must contain at least one credential".into(),
            ));
        }
        if total > self.config.max_items {
            return Err(BatchError::Validation(format!(
                "a batch may contain at most {} credentials, got {total}",
                self.config.max_items
            )));
        }
        let schema = self.schemas.schema(&submission.schema_id)?;

        let job = BatchJob::pending(schema.id.clone(), submission.issuer.clone(), total);
        self.jobs.insert(job.clone())?;
        tracing::info!(job_id = %job.id, schema_id = %schema.id, issuer = %job.issuer, total, "batch job submitted");

        let worker = self.clone();
        let job_id = job.id;
        let issuer = submission.issuer;
        let items = submission.credentials;
        tokio::spawn(async move {
            worker.process(job_id, issuer, schema, items).await;
        });
        Ok(job)
    }

    pub fn status(&self, job_id: &JobId) -> Result<BatchJob, BatchError> {
        self.jobs
            .get(job_id)?
            .ok_or(BatchError::JobNotFound(*job_id))
    }

    /// Remove a pending or processing job. Completed jobs cannot be
    /// cancelled.
    pub fn cancel(&self, job_id: &JobId) -> Result<BatchJob, BatchError> {
        match self.jobs.remove_unless_completed(job_id)? {
            JobRemoval::Removed(job) => {
                tracing::info!(job_id = %job_id, processed = job.processed, total = job.total, "batch job cancelled");
                Ok(job)
            }
            JobRemoval::Completed(job) => Err(BatchError::InvalidState {
                job_id: *job_id,
                status: job.status,
            }),
            JobRemoval::Missing => Err(BatchError::JobNotFound(*job_id)),
        }
    }

    /// Evict completed jobs past the retention window. A window reaching
    /// before the earliest representable time evicts nothing.
    pub fn evict_expired(&self) -> Result<usize, BatchError> {
        let cutoff = i64::try_from(self.config.retention.as_secs())
            .ok()
            .and_then(|secs| Timestamp::now().checked_plus_seconds(-secs));
        let Some(cutoff) = cutoff else {
            return Ok(0);
        };
        let evicted = self.jobs.evict_completed_before(cutoff)?;
        if evicted > 0 {
            tracing::debug!(evicted, "evicted expired batch jobs");
        }
        Ok(evicted)
    }

    async fn process(self, job_id: JobId, issuer: Did, schema: CredentialSchema, items: Vec<BatchItem>) {
        let started = self
            .update_job(job_id, |job| {
                job.status = JobStatus::Processing;
                job.started_at = Some(Timestamp::now());
            })
            .await;
        match started {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::info!(job_id = %job_id, "batch job cancelled before start");
                return;
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "cannot start batch job");
                return;
            }
        }

        let last = items.len().saturating_sub(1);
        for (index, item) in items.into_iter().enumerate() {
            match self.jobs.get(&job_id) {
                Ok(Some(_)) => {}
                Ok(None) => {
                    tracing::info!(job_id = %job_id, index, "batch job cancelled; stopping");
                    return;
                }
                Err(e) => {
                    tracing::error!(job_id = %job_id, error = %e, "job store unavailable; stopping");
                    return;
                }
            }

            let outcome = self.issue_item(&issuer, &schema, item);
            if let Err(message) = &outcome {
                tracing::warn!(job_id = %job_id, index, error = %message, "batch item failed");
            }
            let mut outcome = Some(outcome);
            let recorded = self
                .update_job(job_id, move |job| match outcome.take() {
                    Some(Ok(credential_id)) => job.record_success(index, credential_id),
                    Some(Err(message)) => job.record_failure(index, message),
                    None => {}
                })
                .await;
            match recorded {
                Ok(Some(_)) => {}
                Ok(None) => {
                    tracing::info!(job_id = %job_id, index, "batch job cancelled; stopping");
                    return;
                }
                Err(e) => {
                    tracing::error!(job_id = %job_id, error = %e, "job store unavailable; stopping");
                    return;
                }
            }

            if index < last && !self.config.item_delay.is_zero() {
                tokio::time::sleep(self.config.item_delay).await;
            }
        }

        let finished = self
            .update_job(job_id, |job| {
                job.status = JobStatus::Completed;
                job.completed_at = Some(Timestamp::now());
            })
            .await;
        match finished {
            Ok(Some(job)) => tracing::info!(
                job_id = %job_id,
                processed = job.processed,
                failed = job.failed,
                "batch job completed"
            ),
            Ok(None) => tracing::info!(job_id = %job_id, "batch job cancelled after last item"),
            Err(e) => tracing::error!(job_id = %job_id, error = %e, "cannot complete batch job"),
        }
    }

    /// Apply `f` through the job store on the blocking pool; file-backed
    /// stores write to disk inside `update`.
    async fn update_job(
        &self,
        job_id: JobId,
        mut f: impl FnMut(&mut BatchJob) + Send + 'static,
    ) -> Result<Option<BatchJob>, JobStoreError> {
        let jobs = Arc::clone(&self.jobs);
        tokio::task::spawn_blocking(move || jobs.update(&job_id, &mut f))
            .await
            .map_err(|e| JobStoreError::Worker(e.to_string()))?
    }

    /// Validate, issue and persist one item. The error string becomes the
    /// item's entry in `errors`.
    fn issue_item(&self, issuer: &Did, schema: &CredentialSchema, item: BatchItem) -> Result<String, String> {
        let recipient = item
            .recipient_did
            .ok_or_else(|| "recipientDID is required".to_string())?;
        let recipient = Did::new(recipient).map_err(|e| e.to_string())?;
        let mut subject = match item.credential_subject {
            Some(Value::Object(map)) => map,
            Some(_) => return Err("credentialSubject must be a JSON object".into()),
            None => return Err("credentialSubject is required".into()),
        };
        let expiration = item
            .expiration_date
            .as_deref()
            .map(Timestamp::parse)
            .transpose()
            .map_err(|e| e.to_string())?;

        let claims = Value::Object(subject.clone());
        self.schemas
            .validate_claims(&schema.id, &claims)
            .map_err(|e| e.to_string())?;

        match subject.get("id") {
            Some(Value::String(id)) if id != recipient.as_str() => {
                return Err(format!(
                    "credentialSubject.id {id} does not match recipientDID {recipient}"
                ));
            }
            Some(Value::String(_)) => {}
            Some(_) => return Err("credentialSubject.id must be a string".into()),
            None => {
                subject.insert("id".into(), Value::String(recipient.to_string()));
            }
        }

        let mut request = IssueRequest::new(issuer.clone(), Value::Object(subject))
            .with_type(schema.credential_type.clone())
            .with_id(format!("urn:uuid:{}", uuid::Uuid::new_v4()));
        if let Some(at) = expiration {
            request = request.expires(at);
        }
        let credential = self.signer.issue(request).map_err(|e| e.to_string())?;
        let credential_id = credential.id.clone();

        let record = CredentialRecord::new(credential, Some(schema.id.clone()))
            .map_err(|e: CanonicalizationError| format!("failed to persist credential: {e}"))?;
        self.credentials
            .create(record)
            .map_err(|e| format!("failed to persist credential: {e}"))?;
        Ok(credential_id)
    }
}
