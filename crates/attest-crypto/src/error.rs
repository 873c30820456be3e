//! Errors raised by key handling, signing and verification.

use thiserror::Error;

use crate::keystore::KeyPurpose;

/// Error in cryptographic operations or key management.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The RNG or key-generation primitive failed.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Public key bytes or encoding are malformed.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Signature bytes or encoding are malformed.
    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),

    /// Signature did not verify.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// No key with the requested purpose exists for the DID.
    #[error("no {purpose} key found for {did}")]
    KeyNotFound {
        /// Controller DID that was looked up.
        did: String,
        /// Requested verification relationship.
        purpose: KeyPurpose,
    },

    /// A key record exists but its private half was not retained.
    #[error("key {key_id} of {did} has no private material")]
    PrivateMaterialMissing {
        /// Controller DID.
        did: String,
        /// Key identifier (DID URL).
        key_id: String,
    },

    /// A key with the same id is already stored for the DID.
    #[error("key {0} is already stored")]
    DuplicateKey(String),

    /// A key was persisted under a DID that does not control it.
    #[error("key controller {controller} does not match {did}")]
    ControllerMismatch {
        /// DID the key was persisted under.
        did: String,
        /// Controller recorded on the key.
        controller: String,
    },
}
