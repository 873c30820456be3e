//! # Credential Signer
//!
//! Issue: resolve the issuer, refuse inactive issuers, fetch the
//! `assertionMethod` key, stamp `issuanceDate`, sign. Verify: check the
//! proof against the issuer's resolved document.
//!
//! Claims are assumed to have passed schema validation already.

use std::sync::Arc;

use attest_core::{Did, Timestamp};
use attest_crypto::{CryptoError, KeyPurpose, KeyStore};
use attest_did::DidResolver;
use serde_json::Value;

use crate::credential::{merge_contexts, merge_types, VerifiableCredential, VERIFIABLE_CREDENTIAL_TYPE};
use crate::error::SignerError;
use crate::outcome::VerificationOutcome;
use crate::proof::{create_proof, verify_proof, ProofPurpose};

/// Inputs to [`CredentialSigner::issue`].
#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub issuer: Did,
    pub subject: Value,
    /// Extra types beyond `VerifiableCredential`.
    pub types: Vec<String>,
    /// Extra contexts beyond the VC and Ed25519-2020 contexts.
    pub contexts: Vec<String>,
    pub expiration_date: Option<Timestamp>,
    /// Credential id. A `urn:uuid:` id is generated when absent.
    pub id: Option<String>,
}

impl IssueRequest {
    pub fn new(issuer: Did, subject: Value) -> Self {
        Self {
            issuer,
            subject,
            types: Vec::new(),
            contexts: Vec::new(),
            expiration_date: None,
            id: None,
        }
    }

    pub fn with_type(mut self, credential_type: impl Into<String>) -> Self {
        self.types.push(credential_type.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.contexts.push(context.into());
        self
    }

    pub fn expires(mut self, at: Timestamp) -> Self {
        self.expiration_date = Some(at);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Issues and verifies credentials.
#[derive(Clone)]
pub struct CredentialSigner {
    keys: Arc<dyn KeyStore>,
    resolver: Arc<dyn DidResolver>,
}

impl std::fmt::Debug for CredentialSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSigner").finish_non_exhaustive()
    }
}

impl CredentialSigner {
    pub fn new(keys: Arc<dyn KeyStore>, resolver: Arc<dyn DidResolver>) -> Self {
        Self { keys, resolver }
    }

    pub fn resolver(&self) -> Arc<dyn DidResolver> {
        Arc::clone(&self.resolver)
    }

    /// Build and sign a credential.
    pub fn issue(&self, request: IssueRequest) -> Result<VerifiableCredential, SignerError> {
        if !request.subject.is_object() {
            return Err(SignerError::Validation(
                "credentialSubject must be a JSON object".into(),
            ));
        }
        let now = Timestamp::now();
        if let Some(exp) = request.expiration_date {
            if exp <= now {
                return Err(SignerError::Validation(format!(
                    "expirationDate {exp} is not in the future"
                )));
            }
        }
        if request.id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err(SignerError::Validation("credential id must not be empty".into()));
        }

        let issuer_doc = self.resolver.resolve(&request.issuer)?;
        if !issuer_doc.is_active() {
            return Err(SignerError::IssuerInactive {
                did: request.issuer,
                status: issuer_doc.status,
            });
        }
        let key = self
            .keys
            .fetch_signing_key(&request.issuer, KeyPurpose::AssertionMethod)?;
        if issuer_doc
            .authorized_method(key.key_id(), KeyPurpose::AssertionMethod)
            .is_none()
        {
            return Err(CryptoError::KeyNotFound {
                did: request.issuer.to_string(),
                purpose: KeyPurpose::AssertionMethod,
            }
            .into());
        }

        let mut credential = VerifiableCredential {
            context: merge_contexts(&request.contexts),
            id: request
                .id
                .unwrap_or_else(|| format!("urn:uuid:{}", uuid::Uuid::new_v4())),
            types: merge_types(VERIFIABLE_CREDENTIAL_TYPE, &request.types),
            issuer: request.issuer,
            issuance_date: now,
            expiration_date: request.expiration_date,
            credential_subject: request.subject,
            proof: None,
        };
        let proof = create_proof(&credential, &key, ProofPurpose::AssertionMethod, None, None)
            .map_err(|e| SignerError::Signing(e.to_string()))?;
        credential.proof = Some(proof);

        tracing::info!(
            credential_id = %credential.id,
            issuer = %credential.issuer,
            types = ?credential.types,
            "issued credential"
        );
        Ok(credential)
    }

    /// Check the credential's proof. Expiry and revocation are not
    /// consulted. Never fails; every problem becomes `verified: false`.
    pub fn verify(&self, credential: &VerifiableCredential) -> VerificationOutcome {
        let Some(proof) = &credential.proof else {
            return VerificationOutcome::failed("malformed proof: credential has no proof");
        };
        if !credential.contains_type(VERIFIABLE_CREDENTIAL_TYPE) {
            return VerificationOutcome::failed("credential type must include VerifiableCredential");
        }
        match verify_proof(
            &credential.unsigned(),
            proof,
            &credential.issuer,
            ProofPurpose::AssertionMethod,
            self.resolver.as_ref(),
        ) {
            Ok(()) => VerificationOutcome::ok(),
            Err(failure) => {
                tracing::debug!(credential_id = %credential.id, reason = %failure, "credential verification failed");
                VerificationOutcome::failed(failure.to_string())
            }
        }
    }
}
