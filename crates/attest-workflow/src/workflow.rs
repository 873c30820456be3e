//! # Verification Request Workflow
//!
//! Owns policies, presentation requests and submissions. Every state change
//! goes through a single store operation so that the one-submission-per-
//! holder rule and the single terminal transition hold under concurrent
//! callers.

use attest_core::{RequestId, Store, SubmissionId, Timestamp};
use attest_vc::{match_required_credentials, RequiredCredential, VerificationOutcome};

use crate::error::WorkflowError;
use crate::policy::{PolicyUpdate, VerificationPolicy};
use crate::request::{
    NewPresentationRequest, PresentationRequest, RequestStatus, Submission, SubmissionStatus,
    SubmittedArtifact,
};
use crate::verifier::SubmissionVerifier;

/// Reviewer recorded on auto-approved submissions.
pub const SYSTEM_REVIEWER: &str = "system";

#[derive(Debug, Clone)]
pub struct VerificationWorkflow {
    policies: Store<String, VerificationPolicy>,
    requests: Store<RequestId, PresentationRequest>,
    submissions: Store<SubmissionId, Submission>,
    /// (request, submitter) → submission.
    submitted: Store<(RequestId, String), SubmissionId>,
    verifier: SubmissionVerifier,
}

impl VerificationWorkflow {
    pub fn new(verifier: SubmissionVerifier) -> Self {
        Self {
            policies: Store::new(),
            requests: Store::new(),
            submissions: Store::new(),
            submitted: Store::new(),
            verifier,
        }
    }

    // ─── Policies ────────────────────────────────────────────────────

    /// Register `policy` on behalf of `owner`, who alone may update it.
    pub fn create_policy(
        &self,
        owner: &str,
        mut policy: VerificationPolicy,
    ) -> Result<VerificationPolicy, WorkflowError> {
        if owner.trim().is_empty() {
            return Err(WorkflowError::Validation("policy owner must not be empty".into()));
        }
        policy.validate()?;
        policy.owner = owner.to_string();
        if !self.policies.insert_new(policy.name.clone(), policy.clone()) {
            return Err(WorkflowError::PolicyExists(policy.name));
        }
        tracing::info!(policy = %policy.name, auto_approve = policy.auto_approve, "verification policy created");
        Ok(policy)
    }

    pub fn get_policy(&self, name: &str) -> Result<VerificationPolicy, WorkflowError> {
        self.policies
            .get(&name.to_string())
            .ok_or_else(|| WorkflowError::not_found("verification policy", name))
    }

    pub fn update_policy(
        &self,
        name: &str,
        principal: &str,
        update: PolicyUpdate,
    ) -> Result<VerificationPolicy, WorkflowError> {
        update.validate()?;
        let updated = self
            .policies
            .try_update(&name.to_string(), |p| {
                if p.owner != principal {
                    return Err(WorkflowError::Forbidden(
                        "only the policy owner may update a policy".into(),
                    ));
                }
                p.apply(update);
                Ok(p.clone())
            })
            .ok_or_else(|| WorkflowError::not_found("verification policy", name))??;
        tracing::info!(policy = %name, "verification policy updated");
        Ok(updated)
    }

    /// Every policy, sorted by name.
    pub fn list_policies(&self) -> Vec<VerificationPolicy> {
        let mut policies = self.policies.list();
        policies.sort_by(|a, b| a.name.cmp(&b.name));
        policies
    }

    // ─── Requests ────────────────────────────────────────────────────

    /// Publish a request. Without explicit required credentials, the
    /// policy's credential types become required entries.
    pub fn create_request(
        &self,
        requester: &str,
        new: NewPresentationRequest,
    ) -> Result<PresentationRequest, WorkflowError> {
        if requester.trim().is_empty() {
            return Err(WorkflowError::Validation("requester must not be empty".into()));
        }
        if new.name.trim().is_empty() {
            return Err(WorkflowError::Validation("request name must not be empty".into()));
        }
        let now = Timestamp::now();
        if new.expires_at.is_some_and(|exp| exp <= now) {
            return Err(WorkflowError::Validation("expiresAt must be in the future".into()));
        }

        let mut required = new.required_credentials;
        if let Some(name) = &new.policy {
            let policy = self.get_policy(name)?;
            if !policy.is_active() {
                return Err(WorkflowError::Validation(format!(
                    "verification policy {name} is inactive"
                )));
            }
            if required.is_empty() {
                required = policy
                    .credential_types
                    .iter()
                    .map(RequiredCredential::of_type)
                    .collect();
            }
        }
        if required.is_empty() {
            return Err(WorkflowError::Validation(
                "a request must require at least one credential".into(),
            ));
        }
        if required.iter().any(|r| r.credential_type.trim().is_empty()) {
            return Err(WorkflowError::Validation(
                "required credential type must not be empty".into(),
            ));
        }

        let request = PresentationRequest {
            id: RequestId::new(),
            requester: requester.to_string(),
            name: new.name,
            required_credentials: required,
            policy: new.policy,
            challenge: uuid::Uuid::new_v4().simple().to_string(),
            domain: new.domain,
            status: RequestStatus::Active,
            expires_at: new.expires_at,
            created_at: now,
        };
        self.requests.insert(request.id, request.clone());
        tracing::info!(request_id = %request.id, requester, "presentation request created");
        Ok(request)
    }

    pub fn get_request(&self, id: &RequestId) -> Result<PresentationRequest, WorkflowError> {
        self.requests
            .get(id)
            .ok_or_else(|| WorkflowError::not_found("presentation request", id))
    }

    /// Stop accepting submissions. Only the requester may deactivate.
    pub fn deactivate_request(&self, id: &RequestId, principal: &str) -> Result<PresentationRequest, WorkflowError> {
        let result = self
            .requests
            .try_update(id, |r| {
                if r.requester != principal {
                    return Err(WorkflowError::Forbidden(
                        "only the requester may deactivate a request".into(),
                    ));
                }
                r.status = RequestStatus::Inactive;
                Ok(r.clone())
            })
            .ok_or_else(|| WorkflowError::not_found("presentation request", id))??;
        tracing::info!(request_id = %id, "presentation request deactivated");
        Ok(result)
    }

    // ─── Submissions ─────────────────────────────────────────────────

    /// Accept a submission against an active, unexpired request.
    ///
    /// Rejects a second submission from the same submitter and any
    /// artifact that does not satisfy the required credentials. Under an
    /// auto-approving policy whose required attributes are present, the
    /// system decides immediately when verification passes; otherwise the
    /// submission stays pending.
    pub fn submit(
        &self,
        request_id: &RequestId,
        submitter: &str,
        artifact: SubmittedArtifact,
    ) -> Result<Submission, WorkflowError> {
        let request = self.get_request(request_id)?;
        let now = Timestamp::now();
        if request.status != RequestStatus::Active {
            return Err(WorkflowError::RequestInactive(request.id));
        }
        if request.is_expired(now) {
            return Err(WorkflowError::RequestExpired(request.id));
        }
        match_required_credentials(&request.required_credentials, artifact.credentials())
            .map_err(|e| WorkflowError::MissingRequiredCredential(e.to_string()))?;

        let submission = Submission {
            id: SubmissionId::new(),
            request_id: request.id,
            submitter: submitter.to_string(),
            artifact,
            status: SubmissionStatus::Pending,
            submitted_at: now,
            reviewed_at: None,
            reviewed_by: None,
            review_notes: None,
            verification_result: None,
        };
        if !self
            .submitted
            .insert_new((request.id, submitter.to_string()), submission.id)
        {
            return Err(WorkflowError::DuplicateSubmission {
                request_id: request.id,
                submitter: submitter.to_string(),
            });
        }
        self.submissions.insert(submission.id, submission.clone());
        tracing::info!(submission_id = %submission.id, request_id = %request.id, submitter, "submission received");

        let Some(policy) = self.auto_approving_policy(&request) else {
            return Ok(submission);
        };
        let credentials: Vec<_> = submission.artifact.credentials().iter().collect();
        let missing = policy.missing_attributes(&credentials);
        if !missing.is_empty() {
            tracing::info!(submission_id = %submission.id, missing = ?missing, "auto-approval skipped; attributes missing");
            return Ok(submission);
        }

        let outcome = self
            .verifier
            .verify(&request, Some(&policy), &submission.artifact, now);
        if !outcome.verified {
            tracing::info!(
                submission_id = %submission.id,
                reason = outcome.reason.as_deref().unwrap_or(""),
                "auto-approval verification failed; left for manual review"
            );
            return Ok(submission);
        }
        self.record_decision(&submission.id, SYSTEM_REVIEWER, outcome, Some("auto-approved by policy".into()))
    }

    /// Fetch a submission. Visible to its submitter and to the requester.
    pub fn get_submission(&self, id: &SubmissionId, principal: &str) -> Result<Submission, WorkflowError> {
        let submission = self
            .submissions
            .get(id)
            .ok_or_else(|| WorkflowError::not_found("submission", id))?;
        if submission.submitter == principal {
            return Ok(submission);
        }
        let request = self.get_request(&submission.request_id)?;
        if request.requester != principal {
            return Err(WorkflowError::Forbidden(
                "submission is visible to its submitter and the requester only".into(),
            ));
        }
        Ok(submission)
    }

    /// Verify a pending submission and record the derived decision.
    pub fn decide(
        &self,
        id: &SubmissionId,
        reviewer: &str,
        notes: Option<String>,
    ) -> Result<Submission, WorkflowError> {
        let (submission, request) = self.reviewable(id, reviewer)?;
        let policy = request
            .policy
            .as_deref()
            .and_then(|name| self.policies.get(&name.to_string()));
        let outcome = self.verifier.verify(
            &request,
            policy.as_ref(),
            &submission.artifact,
            Timestamp::now(),
        );
        self.record_decision(id, reviewer, outcome, notes)
    }

    /// Record a decision derived from an externally computed outcome.
    pub fn decide_with_outcome(
        &self,
        id: &SubmissionId,
        reviewer: &str,
        outcome: VerificationOutcome,
        notes: Option<String>,
    ) -> Result<Submission, WorkflowError> {
        self.reviewable(id, reviewer)?;
        self.record_decision(id, reviewer, outcome, notes)
    }

    /// The submission and its request, if `reviewer` may decide it now.
    fn reviewable(
        &self,
        id: &SubmissionId,
        reviewer: &str,
    ) -> Result<(Submission, PresentationRequest), WorkflowError> {
        let submission = self
            .submissions
            .get(id)
            .ok_or_else(|| WorkflowError::not_found("submission", id))?;
        let request = self.get_request(&submission.request_id)?;
        if request.requester != reviewer {
            return Err(WorkflowError::Forbidden(
                "only the requester may decide a submission".into(),
            ));
        }
        if submission.is_decided() {
            return Err(WorkflowError::AlreadyProcessed {
                submission_id: *id,
                status: submission.status,
            });
        }
        Ok((submission, request))
    }

    /// Apply the single terminal transition. The pending check runs under
    /// the store lock, so two racing deciders cannot both succeed.
    fn record_decision(
        &self,
        id: &SubmissionId,
        reviewer: &str,
        outcome: VerificationOutcome,
        notes: Option<String>,
    ) -> Result<Submission, WorkflowError> {
        let decided = self
            .submissions
            .try_update(id, |s| {
                if s.is_decided() {
                    return Err(WorkflowError::AlreadyProcessed {
                        submission_id: *id,
                        status: s.status,
                    });
                }
                s.status = if outcome.verified {
                    SubmissionStatus::Verified
                } else {
                    SubmissionStatus::Rejected
                };
                s.reviewed_at = Some(Timestamp::now());
                s.reviewed_by = Some(reviewer.to_string());
                s.review_notes = notes;
                s.verification_result = Some(outcome);
                Ok(s.clone())
            })
            .ok_or_else(|| WorkflowError::not_found("submission", id))??;
        tracing::info!(
            submission_id = %id,
            status = %decided.status,
            reviewer,
            "submission decided"
        );
        Ok(decided)
    }

    fn auto_approving_policy(&self, request: &PresentationRequest) -> Option<VerificationPolicy> {
        let name = request.policy.as_ref()?;
        self.policies
            .get(name)
            .filter(VerificationPolicy::allows_auto_approval)
    }
}
