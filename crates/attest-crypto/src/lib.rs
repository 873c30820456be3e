//! # attest-crypto: Keys and Signatures
//!
//! - [`ed25519`]: Ed25519 key pairs, public keys and signatures. Signing and
//!   verification accept only [`CanonicalBytes`](attest_core::CanonicalBytes).
//! - [`multibase`]: `z`-prefixed base58btc encoding with the Ed25519
//!   multicodec header, the building block of `did:key`.
//! - [`keystore`]: the [`KeyStore`] capability that generates, persists and
//!   hands out signing keys bound to a DID. Private key material never
//!   leaves the store except through [`SigningKeyHandle::sign`].

pub mod ed25519;
pub mod error;
pub mod keystore;
pub mod multibase;

pub use ed25519::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use error::CryptoError;
pub use keystore::{
    KeyDescriptor, KeyPurpose, KeyStore, KeyType, MemoryKeyStore, SigningKeyHandle, StoredKey,
};
