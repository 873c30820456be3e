//! Issuance, presentation and record errors.
//!
//! Verification failures are not errors; see
//! [`VerificationOutcome`](crate::VerificationOutcome).

use attest_core::Did;
use attest_crypto::CryptoError;
use attest_did::{DidError, DidStatus};
use thiserror::Error;

/// Credential issuance failure.
#[derive(Error, Debug)]
pub enum SignerError {
    /// The request was malformed. Raised before any key is touched.
    #[error("invalid issuance request: {0}")]
    Validation(String),

    /// The issuer DID is revoked or deactivated.
    #[error("issuer {did} is {status} and cannot issue")]
    IssuerInactive { did: Did, status: DidStatus },

    #[error(transparent)]
    Did(#[from] DidError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The signing input could not be produced.
    #[error("signing failed: {0}")]
    Signing(String),
}

/// Presentation assembly or matching failure.
#[derive(Error, Debug)]
pub enum PresentationError {
    #[error("holder {did} is {status} and cannot present")]
    HolderInactive { did: Did, status: DidStatus },

    /// A required credential entry had no matching credential.
    #[error("missing required credential of type {credential_type}{}", issuer_suffix(.issuer))]
    MissingRequiredCredential {
        credential_type: String,
        issuer: Option<String>,
    },

    #[error(transparent)]
    Did(#[from] DidError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("signing failed: {0}")]
    Signing(String),
}

fn issuer_suffix(issuer: &Option<String>) -> String {
    issuer
        .as_deref()
        .map(|i| format!(" from issuer {i}"))
        .unwrap_or_default()
}

/// Credential record or status ledger failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("credential {0} already exists")]
    DuplicateId(String),

    #[error("credential {0} not found")]
    NotFound(String),

    #[error("credential {0} is already revoked")]
    AlreadyRevoked(String),

    /// The backing store rejected the write.
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}
