//! # Submission Verification
//!
//! Produces the [`VerificationOutcome`] a decision is derived from:
//!
//! 1. For a presentation, the holder proof bound to the request's
//!    challenge and domain.
//! 2. Every embedded credential's signature, expiry and revocation status.
//! 3. Required-credential matching against the request.
//! 4. With a policy, at least one covered credential and every covered
//!    credential inside the validity period.
//!
//! The first failing step supplies the reason.

use attest_core::Timestamp;
use attest_vc::{match_required_credentials, CredentialChecks, PresentationEngine, VerificationOutcome};

use crate::policy::VerificationPolicy;
use crate::request::{PresentationRequest, SubmittedArtifact};

#[derive(Debug, Clone)]
pub struct SubmissionVerifier {
    presentations: PresentationEngine,
    checks: CredentialChecks,
}

impl SubmissionVerifier {
    pub fn new(presentations: PresentationEngine, checks: CredentialChecks) -> Self {
        Self {
            presentations,
            checks,
        }
    }

    pub fn verify(
        &self,
        request: &PresentationRequest,
        policy: Option<&VerificationPolicy>,
        artifact: &SubmittedArtifact,
        now: Timestamp,
    ) -> VerificationOutcome {
        if let SubmittedArtifact::Presentation(vp) = artifact {
            let outcome = self.presentations.verify(
                vp,
                Some(request.challenge.as_str()),
                request.domain.as_deref(),
            );
            if !outcome.verified {
                return outcome;
            }
        }

        let credentials = artifact.credentials();
        for credential in credentials {
            let outcome = self.checks.check(credential, now);
            if !outcome.verified {
                let reason = outcome.reason.unwrap_or_default();
                return VerificationOutcome::failed(format!("credential {}: {reason}", credential.id));
            }
        }

        if let Err(e) = match_required_credentials(&request.required_credentials, credentials) {
            return VerificationOutcome::failed(e.to_string());
        }

        if let Some(policy) = policy {
            let covered: Vec<_> = credentials.iter().filter(|c| policy.covers(c)).collect();
            if covered.is_empty() {
                return VerificationOutcome::failed(format!(
                    "no credential of a type governed by policy {}",
                    policy.name
                ));
            }
            if let Some(stale) = covered
                .iter()
                .find(|c| !policy.within_validity_period(c, now))
            {
                return VerificationOutcome::failed(format!(
                    "credential {} was issued more than {} days ago",
                    stale.id, policy.validity_period_days
                ));
            }
        }

        VerificationOutcome::ok()
    }
}
