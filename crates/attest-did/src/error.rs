//! Errors raised by DID creation, resolution and lifecycle changes.

use attest_core::ValidationError;
use attest_crypto::CryptoError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DidError {
    /// The DID is not held locally and its method is not self-certifying.
    #[error("unresolvable DID: {0}")]
    Unresolvable(String),

    /// The DID is not held in the local registry.
    #[error("DID not found: {0}")]
    NotFound(String),

    /// A `did:key` identifier does not decode to an Ed25519 public key.
    #[error("malformed did:key {did}: {reason}")]
    MalformedDidKey {
        /// Offending DID.
        did: String,
        /// Decoder message.
        reason: String,
    },

    /// A freshly derived DID collided with a stored one.
    #[error("DID already registered: {0}")]
    AlreadyExists(String),

    /// Input failed syntactic validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Key generation or persistence failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
