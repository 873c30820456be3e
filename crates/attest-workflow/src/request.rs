//! Presentation requests and holder submissions.

use std::fmt;

use attest_core::{RequestId, SubmissionId, Timestamp};
use attest_vc::{RequiredCredential, VerifiableCredential, VerifiablePresentation, VerificationOutcome};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Active,
    Inactive,
}

/// A requester's published demand for credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationRequest {
    pub id: RequestId,
    /// Principal that created the request. Only it may decide submissions.
    pub requester: String,
    pub name: String,
    pub required_credentials: Vec<RequiredCredential>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    /// Nonce holders must embed in their presentation proof.
    pub challenge: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl PresentationRequest {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }
}

/// Caller-supplied fields of a new request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPresentationRequest {
    pub name: String,
    #[serde(default)]
    pub required_credentials: Vec<RequiredCredential>,
    #[serde(default)]
    pub policy: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Verified,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a holder submitted: `{"presentation": {...}}` or
/// `{"credential": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmittedArtifact {
    Presentation(VerifiablePresentation),
    Credential(VerifiableCredential),
}

impl SubmittedArtifact {
    pub fn credentials(&self) -> &[VerifiableCredential] {
        match self {
            Self::Presentation(vp) => &vp.verifiable_credential,
            Self::Credential(vc) => std::slice::from_ref(vc),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub request_id: RequestId,
    pub submitter: String,
    pub artifact: SubmittedArtifact,
    pub status: SubmissionStatus,
    pub submitted_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_notes: Option<String>,
    /// The outcome the decision was derived from, kept for audit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_result: Option<VerificationOutcome>,
}

impl Submission {
    pub fn is_decided(&self) -> bool {
        self.status != SubmissionStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn artifact_is_externally_tagged() {
        let vc = json!({
            "@context": [attest_vc::VC_CONTEXT],
            "id": "urn:example:1",
            "type": ["VerifiableCredential"],
            "issuer": "did:example:uni",
            "issuanceDate": "2025-01-01T00:00:00Z",
            "credentialSubject": {}
        });
        let a: SubmittedArtifact = serde_json::from_value(json!({"credential": vc})).unwrap();
        assert_eq!(a.credentials().len(), 1);
        assert_eq!(serde_json::to_value(&a).unwrap()["credential"]["id"], json!("urn:example:1"));
    }

    #[test]
    fn request_expiry() {
        let now = Timestamp::now();
        let r = PresentationRequest {
            id: RequestId::new(),
            requester: "verifier".into(),
            name: "Degree check".into(),
            required_credentials: vec![],
            policy: None,
            challenge: "c".into(),
            domain: None,
            status: RequestStatus::Active,
            expires_at: Some(now.plus_seconds(60)),
            created_at: now,
        };
        assert!(!r.is_expired(now));
        assert!(r.is_expired(now.plus_seconds(60)));
    }

    #[test]
    fn status_strings() {
        assert_eq!(serde_json::to_value(SubmissionStatus::Verified).unwrap(), json!("verified"));
        assert_eq!(SubmissionStatus::Rejected.to_string(), "rejected");
    }
}
