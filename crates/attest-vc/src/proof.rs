//! # Ed25519Signature2020 Proofs
//!
//! The signing input is the canonical (JCS) JSON of
//!
//! ```json
//! { "document": <body without proof>, "proof": <proof without proofValue> }
//! ```
//!
//! so the proof metadata (`created`, `verificationMethod`, `proofPurpose`,
//! `challenge`, `domain`) is covered by the signature along with the body.
//! Credentials and presentations share this module; only the expected
//! proof purpose differs.

use std::fmt;

use attest_core::{CanonicalBytes, CanonicalizationError, Did, Timestamp};
use attest_crypto::{Ed25519Signature, KeyPurpose, SigningKeyHandle};
use attest_did::{DidError, DidResolver};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProofType {
    Ed25519Signature2020,
}

/// Verification relationship a proof claims to exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProofPurpose {
    /// Credential issuance.
    AssertionMethod,
    /// Presentation by a holder.
    Authentication,
}

impl ProofPurpose {
    pub fn key_purpose(self) -> KeyPurpose {
        match self {
            Self::AssertionMethod => KeyPurpose::AssertionMethod,
            Self::Authentication => KeyPurpose::Authentication,
        }
    }
}

/// Everything in a proof except the signature value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofOptions {
    #[serde(rename = "type")]
    pub proof_type: ProofType,
    pub created: Timestamp,
    /// DID URL of the signing key.
    pub verification_method: String,
    pub proof_purpose: ProofPurpose,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// An embedded proof block.
///
/// `proof_value` is kept as the raw multibase string so a malformed value
/// surfaces as a failed verification rather than a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(flatten)]
    pub options: ProofOptions,
    pub proof_value: String,
}

#[derive(Serialize)]
struct SigningInput<'a, T: Serialize> {
    document: &'a T,
    proof: &'a ProofOptions,
}

fn signing_input<T: Serialize>(
    document: &T,
    options: &ProofOptions,
) -> Result<CanonicalBytes, CanonicalizationError> {
    CanonicalBytes::new(&SigningInput {
        document,
        proof: options,
    })
}

/// Sign `document` (which must not contain a proof) with `key`.
pub(crate) fn create_proof<T: Serialize>(
    document: &T,
    key: &SigningKeyHandle,
    purpose: ProofPurpose,
    challenge: Option<String>,
    domain: Option<String>,
) -> Result<Proof, CanonicalizationError> {
    let options = ProofOptions {
        proof_type: ProofType::Ed25519Signature2020,
        created: Timestamp::now(),
        verification_method: key.key_id().to_string(),
        proof_purpose: purpose,
        challenge,
        domain,
    };
    let input = signing_input(document, &options)?;
    let signature = key.sign(&input);
    Ok(Proof {
        options,
        proof_value: signature.to_multibase(),
    })
}

/// Why a proof did not verify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ProofFailure {
    WrongPurpose {
        expected: ProofPurpose,
        found: ProofPurpose,
    },
    MalformedVerificationMethod(String),
    ControllerMismatch {
        expected: Did,
        found: Did,
    },
    Unresolvable(DidError),
    MethodNotAuthorized {
        method: String,
        purpose: KeyPurpose,
    },
    MalformedProofValue(String),
    Canonicalization(String),
    SignatureMismatch,
}

impl fmt::Display for ProofFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongPurpose { expected, found } => {
                write!(f, "proof purpose {found:?} where {expected:?} was expected")
            }
            Self::MalformedVerificationMethod(vm) => {
                write!(f, "malformed proof: verificationMethod {vm} is not a DID URL")
            }
            Self::ControllerMismatch { expected, found } => {
                write!(f, "proof was made by {found}, not {expected}")
            }
            Self::Unresolvable(e) => write!(f, "{e}"),
            Self::MethodNotAuthorized { method, purpose } => {
                write!(f, "verification method {method} is not authorized for {purpose}")
            }
            Self::MalformedProofValue(e) => write!(f, "malformed proof: {e}"),
            Self::Canonicalization(e) => write!(f, "cannot canonicalize document: {e}"),
            Self::SignatureMismatch => f.write_str("signature mismatch"),
        }
    }
}

/// Verify `proof` over `document` (without its proof) on behalf of
/// `expected_signer`.
///
/// The verification method must belong to `expected_signer`, resolve
/// through `resolver`, and be listed under the relationship matching
/// `purpose` in the resolved document.
pub(crate) fn verify_proof<T: Serialize>(
    document: &T,
    proof: &Proof,
    expected_signer: &Did,
    purpose: ProofPurpose,
    resolver: &dyn DidResolver,
) -> Result<(), ProofFailure> {
    let opts = &proof.options;
    if opts.proof_purpose != purpose {
        return Err(ProofFailure::WrongPurpose {
            expected: purpose,
            found: opts.proof_purpose,
        });
    }

    let (controller, _) = Did::split_url(&opts.verification_method)
        .map_err(|_| ProofFailure::MalformedVerificationMethod(opts.verification_method.clone()))?;
    if &controller != expected_signer {
        return Err(ProofFailure::ControllerMismatch {
            expected: expected_signer.clone(),
            found: controller,
        });
    }

    let document_of_signer = resolver
        .resolve(&controller)
        .map_err(ProofFailure::Unresolvable)?;
    let method = document_of_signer
        .authorized_method(&opts.verification_method, purpose.key_purpose())
        .ok_or_else(|| ProofFailure::MethodNotAuthorized {
            method: opts.verification_method.clone(),
            purpose: purpose.key_purpose(),
        })?;
    if method.controller != controller {
        return Err(ProofFailure::ControllerMismatch {
            expected: controller,
            found: method.controller.clone(),
        });
    }

    let signature = Ed25519Signature::from_multibase(&proof.proof_value)
        .map_err(|e| ProofFailure::MalformedProofValue(e.to_string()))?;
    let input = signing_input(document, opts)
        .map_err(|e| ProofFailure::Canonicalization(e.to_string()))?;
    method
        .public_key_multibase
        .verify(&input, &signature)
        .map_err(|_| ProofFailure::SignatureMismatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_crypto::{KeyStore, MemoryKeyStore};
    use attest_did::DidRegistry;
    use serde_json::json;
    use std::sync::Arc;

    fn setup() -> (DidRegistry, Did, SigningKeyHandle) {
        let registry = DidRegistry::new(Arc::new(MemoryKeyStore::new()));
        let doc = registry.create_did(None).unwrap();
        let key = registry
            .key_store()
            .fetch_signing_key(&doc.id, KeyPurpose::AssertionMethod)
            .unwrap();
        (registry, doc.id, key)
    }

    #[test]
    fn proof_verifies_over_same_document() {
        let (registry, did, key) = setup();
        let doc = json!({"hello": "world"});
        let proof = create_proof(&doc, &key, ProofPurpose::AssertionMethod, None, None).unwrap();
        verify_proof(&doc, &proof, &did, ProofPurpose::AssertionMethod, &registry).unwrap();
    }

    #[test]
    fn proof_options_are_signed() {
        let (registry, did, key) = setup();
        let doc = json!({"n": 1});
        let mut proof =
            create_proof(&doc, &key, ProofPurpose::AssertionMethod, Some("abc".into()), None)
                .unwrap();
        proof.options.challenge = Some("abd".into());
        assert_eq!(
            verify_proof(&doc, &proof, &did, ProofPurpose::AssertionMethod, &registry),
            Err(ProofFailure::SignatureMismatch)
        );
    }

    #[test]
    fn purpose_must_match() {
        let (registry, did, key) = setup();
        let doc = json!({});
        let proof = create_proof(&doc, &key, ProofPurpose::AssertionMethod, None, None).unwrap();
        assert!(matches!(
            verify_proof(&doc, &proof, &did, ProofPurpose::Authentication, &registry),
            Err(ProofFailure::WrongPurpose { .. })
        ));
    }

    #[test]
    fn signer_must_be_expected_did() {
        let (registry, _, key) = setup();
        let other = registry.create_did(None).unwrap().id;
        let doc = json!({});
        let proof = create_proof(&doc, &key, ProofPurpose::AssertionMethod, None, None).unwrap();
        assert!(matches!(
            verify_proof(&doc, &proof, &other, ProofPurpose::AssertionMethod, &registry),
            Err(ProofFailure::ControllerMismatch { .. })
        ));
    }

    #[test]
    fn relationship_is_enforced() {
        let (registry, did, key) = setup();
        let doc = json!({});
        let proof = create_proof(&doc, &key, ProofPurpose::AssertionMethod, None, None).unwrap();
        let mut stripped = registry.get_local(&did).unwrap();
        stripped.assertion_method.clear();
        let resolver = move |_: &Did| -> Result<attest_did::DidDocument, DidError> {
            Ok(stripped.clone())
        };
        assert!(matches!(
            verify_proof(&doc, &proof, &did, ProofPurpose::AssertionMethod, &resolver),
            Err(ProofFailure::MethodNotAuthorized { .. })
        ));
    }

    #[test]
    fn garbage_proof_value_is_malformed() {
        let (registry, did, key) = setup();
        let doc = json!({});
        let mut proof =
            create_proof(&doc, &key, ProofPurpose::AssertionMethod, None, None).unwrap();
        proof.proof_value = "not-multibase".into();
        assert!(matches!(
            verify_proof(&doc, &proof, &did, ProofPurpose::AssertionMethod, &registry),
            Err(ProofFailure::MalformedProofValue(_))
        ));
    }

    #[test]
    fn proof_serializes_flat() {
        let (_, _, key) = setup();
        let proof = create_proof(
            &json!({}),
            &key,
            ProofPurpose::Authentication,
            Some("nonce".into()),
            Some("verifier.example".into()),
        )
        .unwrap();
        let v = serde_json::to_value(&proof).unwrap();
        assert_eq!(v["type"], json!("Ed25519Signature2020"));
        assert_eq!(v["proofPurpose"], json!("authentication"));
        assert_eq!(v["challenge"], json!("nonce"));
        assert_eq!(v["domain"], json!("verifier.example"));
        assert!(v["proofValue"].as_str().unwrap().starts_with('z'));
        let back: Proof = serde_json::from_value(v).unwrap();
        assert_eq!(back, proof);
    }
}
