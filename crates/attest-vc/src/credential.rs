//! # Verifiable Credential Envelope
//!
//! W3C VC Data Model 1.1 shape. `credentialSubject` is an open JSON object
//! validated against a credential schema before issuance; the envelope
//! does not constrain it.

use attest_core::{sha256_digest, CanonicalBytes, CanonicalizationError, ContentDigest, Did, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::proof::Proof;

pub const VC_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const ED25519_2020_CONTEXT: &str = "https://w3id.org/security/suites/ed25519-2020/v1";
pub const VERIFIABLE_CREDENTIAL_TYPE: &str = "VerifiableCredential";

/// A signed (or not yet signed) verifiable credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: String,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub issuer: Did,
    pub issuance_date: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<Timestamp>,
    pub credential_subject: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

impl VerifiableCredential {
    pub fn contains_type(&self, credential_type: &str) -> bool {
        self.types.iter().any(|t| t == credential_type)
    }

    /// True once `now` is at or past `expirationDate`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expiration_date.is_some_and(|exp| now >= exp)
    }

    /// `credentialSubject.id`, when the subject names itself.
    pub fn subject_id(&self) -> Option<&str> {
        self.credential_subject.get("id").and_then(Value::as_str)
    }

    /// The credential body with the proof removed. This is the document
    /// a proof signs.
    pub fn unsigned(&self) -> Self {
        Self {
            proof: None,
            ..self.clone()
        }
    }

    /// SHA-256 over the canonical form of the full credential, proof
    /// included.
    pub fn digest(&self) -> Result<ContentDigest, CanonicalizationError> {
        Ok(sha256_digest(&CanonicalBytes::new(self)?))
    }
}

/// Contexts for a new credential: the base VC context first, then the
/// proof suite context, then any caller extras not already present.
pub(crate) fn merge_contexts(extra: &[String]) -> Vec<String> {
    let mut contexts = vec![VC_CONTEXT.to_string(), ED25519_2020_CONTEXT.to_string()];
    for c in extra {
        if !contexts.contains(c) {
            contexts.push(c.clone());
        }
    }
    contexts
}

/// Types for a new credential: `VerifiableCredential` first, duplicates
/// dropped, caller order otherwise kept.
pub(crate) fn merge_types(base: &str, extra: &[String]) -> Vec<String> {
    let mut types = vec![base.to_string()];
    for t in extra {
        if !types.contains(t) {
            types.push(t.clone());
        }
    }
    types
}
