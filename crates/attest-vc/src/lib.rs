//! # attest-vc: Verifiable Credentials and Presentations
//!
//! - [`CredentialSigner`] issues credentials with an issuer's
//!   `assertionMethod` key and verifies them against the issuer's DID
//!   document.
//! - [`PresentationEngine`] wraps credentials in a holder-signed
//!   presentation, optionally bound to a verifier challenge and domain.
//! - [`StatusLedger`] and [`CredentialStore`] hold revocation state and
//!   issued credential records. Credentials themselves are never mutated.
//!
//! Verification never raises for cryptographic failures. It returns a
//! [`VerificationOutcome`] with `verified: false` and a reason.
//!
//! Expiry and revocation are orthogonal to signature verification;
//! [`CredentialChecks`] layers them on for callers that want all three.

pub mod checks;
pub mod credential;
pub mod error;
pub mod outcome;
pub mod presentation;
pub mod proof;
pub mod signer;
pub mod status;
pub mod store;

pub use checks::CredentialChecks;
pub use credential::{VerifiableCredential, VC_CONTEXT, VERIFIABLE_CREDENTIAL_TYPE};
pub use error::{PresentationError, RecordError, SignerError};
pub use outcome::VerificationOutcome;
pub use presentation::{
    match_required_credentials, PresentationEngine, RequiredCredential, VerifiablePresentation,
    VERIFIABLE_PRESENTATION_TYPE,
};
pub use proof::{Proof, ProofOptions, ProofPurpose, ProofType};
pub use signer::{CredentialSigner, IssueRequest};
pub use status::{CredentialStatus, StatusLedger};
pub use store::{CredentialRecord, CredentialRepository, CredentialStore};
