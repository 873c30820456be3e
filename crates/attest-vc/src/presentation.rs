//! # Verifiable Presentations
//!
//! A holder bundles credentials and signs the bundle with its
//! `authentication` key. A verifier-supplied challenge and domain are
//! embedded in the proof and therefore covered by the signature.
//!
//! Verifying a presentation checks the holder proof only. Embedded
//! credentials are verified separately by the caller.

use std::sync::Arc;

use attest_core::Did;
use attest_crypto::{KeyPurpose, KeyStore};
use attest_did::DidResolver;
use serde::{Deserialize, Serialize};

use crate::credential::{VerifiableCredential, VC_CONTEXT};
use crate::error::PresentationError;
use crate::outcome::VerificationOutcome;
use crate::proof::{create_proof, verify_proof, Proof, ProofPurpose};

pub const VERIFIABLE_PRESENTATION_TYPE: &str = "VerifiablePresentation";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiablePresentation {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: String,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub holder: Did,
    #[serde(default)]
    pub verifiable_credential: Vec<VerifiableCredential>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

impl VerifiablePresentation {
    pub fn unsigned(&self) -> Self {
        Self {
            proof: None,
            ..self.clone()
        }
    }
}

/// One entry of a verifier's required-credential list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredCredential {
    #[serde(rename = "type")]
    pub credential_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl RequiredCredential {
    pub fn of_type(credential_type: impl Into<String>) -> Self {
        Self {
            credential_type: credential_type.into(),
            issuer: None,
            required: true,
        }
    }

    pub fn from_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    fn is_satisfied_by(&self, credential: &VerifiableCredential) -> bool {
        credential.contains_type(&self.credential_type)
            && self
                .issuer
                .as_deref()
                .map_or(true, |issuer| credential.issuer.as_str() == issuer)
    }
}

/// Check that every `required` entry is satisfied by at least one
/// credential: the type is present and, when an issuer is named, the
/// credential's issuer equals it. Entries with `required == false` are
/// ignored. Fails on the first unsatisfied entry, naming it.
pub fn match_required_credentials(
    required: &[RequiredCredential],
    credentials: &[VerifiableCredential],
) -> Result<(), PresentationError> {
    for entry in required.iter().filter(|r| r.required) {
        if !credentials.iter().any(|c| entry.is_satisfied_by(c)) {
            return Err(PresentationError::MissingRequiredCredential {
                credential_type: entry.credential_type.clone(),
                issuer: entry.issuer.clone(),
            });
        }
    }
    Ok(())
}

/// Builds and verifies presentations.
#[derive(Clone)]
pub struct PresentationEngine {
    keys: Arc<dyn KeyStore>,
    resolver: Arc<dyn DidResolver>,
}

impl std::fmt::Debug for PresentationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresentationEngine").finish_non_exhaustive()
    }
}

impl PresentationEngine {
    pub fn new(keys: Arc<dyn KeyStore>, resolver: Arc<dyn DidResolver>) -> Self {
        Self { keys, resolver }
    }

    /// Wrap `credentials` and sign as `holder`, binding the optional
    /// challenge and domain into the proof.
    pub fn present(
        &self,
        holder: &Did,
        credentials: Vec<VerifiableCredential>,
        challenge: Option<String>,
        domain: Option<String>,
    ) -> Result<VerifiablePresentation, PresentationError> {
        let holder_doc = self.resolver.resolve(holder)?;
        if !holder_doc.is_active() {
            return Err(PresentationError::HolderInactive {
                did: holder.clone(),
                status: holder_doc.status,
            });
        }
        let key = self
            .keys
            .fetch_signing_key(holder, KeyPurpose::Authentication)?;

        let mut presentation = VerifiablePresentation {
            context: vec![VC_CONTEXT.to_string()],
            id: format!("urn:uuid:{}", uuid::Uuid::new_v4()),
            types: vec![VERIFIABLE_PRESENTATION_TYPE.to_string()],
            holder: holder.clone(),
            verifiable_credential: credentials,
            proof: None,
        };
        let proof = create_proof(
            &presentation,
            &key,
            ProofPurpose::Authentication,
            challenge,
            domain,
        )
        .map_err(|e| PresentationError::Signing(e.to_string()))?;
        presentation.proof = Some(proof);

        tracing::info!(
            presentation_id = %presentation.id,
            holder = %holder,
            credentials = presentation.verifiable_credential.len(),
            "created presentation"
        );
        Ok(presentation)
    }

    /// Verify the holder proof and, when expected values are given, that
    /// the proof carries exactly that challenge and domain.
    pub fn verify(
        &self,
        presentation: &VerifiablePresentation,
        expected_challenge: Option<&str>,
        expected_domain: Option<&str>,
    ) -> VerificationOutcome {
        let Some(proof) = &presentation.proof else {
            return VerificationOutcome::failed("malformed proof: presentation has no proof");
        };
        if !presentation
            .types
            .iter()
            .any(|t| t == VERIFIABLE_PRESENTATION_TYPE)
        {
            return VerificationOutcome::failed(
                "presentation type must include VerifiablePresentation",
            );
        }
        if let Some(expected) = expected_challenge {
            if proof.options.challenge.as_deref() != Some(expected) {
                return VerificationOutcome::failed("challenge mismatch");
            }
        }
        if let Some(expected) = expected_domain {
            if proof.options.domain.as_deref() != Some(expected) {
                return VerificationOutcome::failed("domain mismatch");
            }
        }

        match verify_proof(
            &presentation.unsigned(),
            proof,
            &presentation.holder,
            ProofPurpose::Authentication,
            self.resolver.as_ref(),
        ) {
            Ok(()) => VerificationOutcome::ok(),
            Err(failure) => {
                tracing::debug!(presentation_id = %presentation.id, reason = %failure, "presentation verification failed");
                VerificationOutcome::failed(failure.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::{CredentialSigner, IssueRequest};
    use attest_crypto::MemoryKeyStore;
    use attest_did::{DidRegistry, DidStatus};
    use serde_json::json;

    struct Fixture {
        registry: DidRegistry,
        signer: CredentialSigner,
        engine: PresentationEngine,
        issuer: Did,
        holder: Did,
    }

    fn fixture() -> Fixture {
        let registry = DidRegistry::new(Arc::new(MemoryKeyStore::new()));
        let resolver: Arc<dyn DidResolver> = Arc::new(registry.clone());
        let signer = CredentialSigner::new(registry.key_store(), Arc::clone(&resolver));
        let engine = PresentationEngine::new(registry.key_store(), resolver);
        let issuer = registry.create_did(Some("uni")).unwrap().id;
        let holder = registry.create_did(Some("alice")).unwrap().id;
        Fixture {
            registry,
            signer,
            engine,
            issuer,
            holder,
        }
    }

    fn education(f: &Fixture) -> VerifiableCredential {
        f.signer
            .issue(
                IssueRequest::new(f.issuer.clone(), json!({"id": f.holder.as_str(), "degree": "BSc"}))
                    .with_type("EducationCredential"),
            )
            .unwrap()
    }

    fn cred(credential_type: &str, issuer: &str) -> VerifiableCredential {
        serde_json::from_value(json!({
            "@context": [VC_CONTEXT],
            "id": "urn:example:c",
            "type": ["VerifiableCredential", credential_type],
            "issuer": issuer,
            "issuanceDate": "2025-01-01T00:00:00Z",
            "credentialSubject": {}
        }))
        .unwrap()
    }

    #[test]
    fn present_then_verify() {
        let f = fixture();
        let vp = f
            .engine
            .present(&f.holder, vec![education(&f)], Some("n-1".into()), Some("verifier.example".into()))
            .unwrap();
        assert_eq!(vp.types, vec![VERIFIABLE_PRESENTATION_TYPE]);
        assert_eq!(vp.verifiable_credential.len(), 1);
        assert!(f.engine.verify(&vp, Some("n-1"), Some("verifier.example")).verified);
        assert!(f.engine.verify(&vp, None, None).verified);
    }

    #[test]
    fn challenge_and_domain_must_match() {
        let f = fixture();
        let vp = f
            .engine
            .present(&f.holder, vec![education(&f)], Some("n-1".into()), Some("a.example".into()))
            .unwrap();
        assert_eq!(
            f.engine.verify(&vp, Some("n-2"), None).reason.as_deref(),
            Some("challenge mismatch")
        );
        assert_eq!(
            f.engine.verify(&vp, Some("n-1"), Some("b.example")).reason.as_deref(),
            Some("domain mismatch")
        );
    }

    #[test]
    fn missing_challenge_fails_closed() {
        let f = fixture();
        let vp = f.engine.present(&f.holder, vec![], None, None).unwrap();
        assert!(!f.engine.verify(&vp, Some("anything"), None).verified);
    }

    #[test]
    fn rewritten_challenge_breaks_signature() {
        let f = fixture();
        let mut vp = f
            .engine
            .present(&f.holder, vec![], Some("old".into()), None)
            .unwrap();
        if let Some(p) = vp.proof.as_mut() {
            p.options.challenge = Some("new".into());
        }
        let outcome = f.engine.verify(&vp, Some("new"), None);
        assert_eq!(outcome.reason.as_deref(), Some("signature mismatch"));
    }

    #[test]
    fn swapping_credentials_breaks_signature() {
        let f = fixture();
        let mut vp = f.engine.present(&f.holder, vec![education(&f)], None, None).unwrap();
        vp.verifiable_credential.push(education(&f));
        assert!(!f.engine.verify(&vp, None, None).verified);
    }

    #[test]
    fn embedded_credentials_are_not_reverified() {
        let f = fixture();
        let mut tampered = education(&f);
        tampered.credential_subject["degree"] = json!("PhD");
        let vp = f
            .engine
            .present(&f.holder, vec![tampered.clone()], None, None)
            .unwrap();
        assert!(f.engine.verify(&vp, None, None).verified);
        assert!(!f.signer.verify(&tampered).verified);
    }

    #[test]
    fn credential_proof_is_not_a_presentation_proof() {
        let f = fixture();
        let vc = education(&f);
        let mut vp = f.engine.present(&f.holder, vec![], None, None).unwrap();
        vp.holder = f.issuer.clone();
        vp.proof = vc.proof.clone();
        assert!(!f.engine.verify(&vp, None, None).verified);
    }

    #[test]
    fn inactive_holder_cannot_present() {
        let f = fixture();
        f.registry.set_status(&f.holder, DidStatus::Deactivated).unwrap();
        assert!(matches!(
            f.engine.present(&f.holder, vec![], None, None),
            Err(PresentationError::HolderInactive { .. })
        ));
    }

    #[test]
    fn required_type_from_wrong_issuer_is_rejected() {
        let required = vec![RequiredCredential::of_type("EducationCredential").from_issuer("did:example:uni")];
        let err = match_required_credentials(
            &required,
            &[cred("EducationCredential", "did:example:college")],
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing required credential of type EducationCredential from issuer did:example:uni"
        );
        match_required_credentials(&required, &[cred("EducationCredential", "did:example:uni")])
            .unwrap();
    }

    #[test]
    fn optional_entries_are_ignored() {
        let required = vec![
            RequiredCredential::of_type("EducationCredential"),
            RequiredCredential {
                required: false,
                ..RequiredCredential::of_type("EmploymentCredential")
            },
        ];
        match_required_credentials(&required, &[cred("EducationCredential", "did:example:x")])
            .unwrap();
    }

    #[test]
    fn first_missing_entry_is_named() {
        let required = vec![
            RequiredCredential::of_type("A"),
            RequiredCredential::of_type("B"),
            RequiredCredential::of_type("C"),
        ];
        let err = match_required_credentials(&required, &[cred("A", "did:example:x")]).unwrap_err();
        assert!(matches!(
            err,
            PresentationError::MissingRequiredCredential { ref credential_type, .. } if credential_type == "B"
        ));
    }

    #[test]
    fn required_defaults_to_true_on_the_wire() {
        let r: RequiredCredential =
            serde_json::from_value(json!({"type": "EducationCredential"})).unwrap();
        assert!(r.required);
        assert!(r.issuer.is_none());
    }
}
