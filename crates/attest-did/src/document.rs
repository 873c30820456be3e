//! # DID Documents
//!
//! W3C-shaped DID documents with an Attest-specific lifecycle `status` and
//! optional `owner` back-reference. The owner is an opaque identifier string
//! supplied by the upstream identity provider; the document does not own it.

use attest_core::{Did, Timestamp};
use attest_crypto::{Ed25519PublicKey, KeyPurpose};
use serde::{Deserialize, Serialize};

/// JSON-LD contexts stamped on every document.
pub const DID_CONTEXTS: [&str; 2] = [
    "https://www.w3.org/ns/did/v1",
    "https://w3id.org/security/suites/ed25519-2020/v1",
];

/// Lifecycle status of a DID.
///
/// `Revoked` and `Deactivated` are terminal with respect to issuance: such
/// a DID can no longer sign credentials or presentations. Documents remain
/// resolvable so previously issued credentials can still be verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DidStatus {
    Active,
    Revoked,
    Deactivated,
}

impl DidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Revoked => "REVOKED",
            Self::Deactivated => "DEACTIVATED",
        }
    }
}

impl std::fmt::Display for DidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verification method suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationMethodType {
    Ed25519VerificationKey2020,
}

/// A public key entry in a DID document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// DID URL, `<did>#<fragment>`.
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: VerificationMethodType,
    pub controller: Did,
    pub public_key_multibase: Ed25519PublicKey,
}

/// A DID document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: Did,
    pub controller: Did,
    /// Ordered key list. Relationship arrays below refer to these by id.
    pub verification_method: Vec<VerificationMethod>,
    #[serde(default)]
    pub authentication: Vec<String>,
    #[serde(default)]
    pub assertion_method: Vec<String>,
    #[serde(default)]
    pub key_agreement: Vec<String>,
    #[serde(default)]
    pub capability_invocation: Vec<String>,
    #[serde(default)]
    pub capability_delegation: Vec<String>,
    pub status: DidStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub created: Timestamp,
    pub updated: Timestamp,
}

impl DidDocument {
    /// A document whose single key backs all five verification relationships.
    pub fn with_single_key(
        did: Did,
        public_key: Ed25519PublicKey,
        owner: Option<String>,
    ) -> Self {
        let vm_id = did.with_fragment(&public_key.to_multibase());
        let now = Timestamp::now();
        let vm = VerificationMethod {
            id: vm_id.clone(),
            method_type: VerificationMethodType::Ed25519VerificationKey2020,
            controller: did.clone(),
            public_key_multibase: public_key,
        };
        Self {
            context: DID_CONTEXTS.iter().map(|s| s.to_string()).collect(),
            controller: did.clone(),
            id: did,
            verification_method: vec![vm],
            authentication: vec![vm_id.clone()],
            assertion_method: vec![vm_id.clone()],
            key_agreement: vec![vm_id.clone()],
            capability_invocation: vec![vm_id.clone()],
            capability_delegation: vec![vm_id],
            status: DidStatus::Active,
            owner,
            created: now,
            updated: now,
        }
    }

    /// DID method, e.g. `key`.
    pub fn method(&self) -> &str {
        self.id.method()
    }

    pub fn is_active(&self) -> bool {
        self.status == DidStatus::Active
    }

    /// Method ids listed under `purpose`.
    pub fn relationship(&self, purpose: KeyPurpose) -> &[String] {
        match purpose {
            KeyPurpose::Authentication => &self.authentication,
            KeyPurpose::AssertionMethod => &self.assertion_method,
            KeyPurpose::KeyAgreement => &self.key_agreement,
            KeyPurpose::CapabilityInvocation => &self.capability_invocation,
            KeyPurpose::CapabilityDelegation => &self.capability_delegation,
        }
    }

    /// Look up a verification method by its full DID URL.
    pub fn verification_method(&self, id: &str) -> Option<&VerificationMethod> {
        self.verification_method.iter().find(|vm| vm.id == id)
    }

    /// The method `id` if it exists and is listed under `purpose`.
    pub fn authorized_method(&self, id: &str, purpose: KeyPurpose) -> Option<&VerificationMethod> {
        if !self.relationship(purpose).iter().any(|r| r == id) {
            return None;
        }
        self.verification_method(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_crypto::Ed25519KeyPair;
    use serde_json::json;

    fn sample() -> DidDocument {
        let pk = Ed25519KeyPair::from_seed(&[1u8; 32]).public_key();
        let did = Did::new(format!("did:key:{}", pk.to_multibase())).unwrap();
        DidDocument::with_single_key(did, pk, Some("user-1".into()))
    }

    #[test]
    fn single_key_backs_all_relationships() {
        let doc = sample();
        let vm_id = &doc.verification_method[0].id;
        for purpose in KeyPurpose::ALL {
            assert_eq!(doc.relationship(purpose), std::slice::from_ref(vm_id));
        }
        assert!(doc.is_active());
        assert_eq!(doc.method(), "key");
    }

    #[test]
    fn authorized_method_requires_relationship() {
        let mut doc = sample();
        let vm_id = doc.verification_method[0].id.clone();
        assert!(doc.authorized_method(&vm_id, KeyPurpose::AssertionMethod).is_some());
        doc.assertion_method.clear();
        assert!(doc.authorized_method(&vm_id, KeyPurpose::AssertionMethod).is_none());
        assert!(doc.authorized_method(&vm_id, KeyPurpose::Authentication).is_some());
        assert!(doc.authorized_method("did:key:zother#x", KeyPurpose::Authentication).is_none());
    }

    #[test]
    fn serializes_w3c_shape() {
        let doc = sample();
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["@context"][0], json!("https://www.w3.org/ns/did/v1"));
        assert_eq!(v["status"], json!("ACTIVE"));
        assert_eq!(v["verificationMethod"][0]["type"], json!("Ed25519VerificationKey2020"));
        assert!(v["verificationMethod"][0]["publicKeyMultibase"]
            .as_str()
            .unwrap()
            .starts_with("z6Mk"));
        assert!(v["assertionMethod"].is_array());
        assert_eq!(v["owner"], json!("user-1"));

        let back: DidDocument = serde_json::from_value(v).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn status_serde() {
        assert_eq!(serde_json::to_string(&DidStatus::Deactivated).unwrap(), r#""DEACTIVATED""#);
        let s: DidStatus = serde_json::from_str(r#""REVOKED""#).unwrap();
        assert_eq!(s, DidStatus::Revoked);
    }
}
