//! # Ed25519 Signing and Verification
//!
//! ## Security Invariant
//!
//! - Signing input MUST be `&CanonicalBytes`. Raw bytes cannot be signed,
//!   so every signature in the system covers a canonicalized document.
//! - [`Ed25519KeyPair`] does not implement `Serialize` and its `Debug`
//!   output is redacted. The seed is reachable only through
//!   [`Ed25519KeyPair::export_seed`], which returns a zeroizing buffer.
//!
//! ## Serde
//!
//! Public keys serialize as multicodec multibase (`z6Mk...`), signatures as
//! `z`-prefixed base58btc.

use attest_core::CanonicalBytes;
use ed25519_dalek::{Signer, Verifier};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::multibase;

/// An Ed25519 public key (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey([u8; 32]);

/// An Ed25519 signature (64 bytes).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ed25519Signature([u8; 64]);

/// An Ed25519 key pair. The private half is zeroized on drop by
/// `ed25519_dalek`.
pub struct Ed25519KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

// ---------------------------------------------------------------------------
// Ed25519PublicKey
// ---------------------------------------------------------------------------

impl Ed25519PublicKey {
    /// Wrap raw bytes, rejecting points that are not valid curve points.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        ed25519_dalek::VerifyingKey::from_bytes(&bytes)
            .map_err(|e| CryptoError::InvalidKey(format!("invalid Ed25519 public key: {e}")))?;
        Ok(Self(bytes))
    }

    /// Raw 32-byte public key.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `z6Mk...` multibase form, as used in `publicKeyMultibase` and `did:key`.
    pub fn to_multibase(&self) -> String {
        multibase::encode_ed25519_public_key(&self.0)
    }

    /// Parse the `z6Mk...` multibase form.
    pub fn from_multibase(s: &str) -> Result<Self, CryptoError> {
        Self::from_bytes(multibase::decode_ed25519_public_key(s)?)
    }

    /// Verify `signature` over `data`.
    pub fn verify(
        &self,
        data: &CanonicalBytes,
        signature: &Ed25519Signature,
    ) -> Result<(), CryptoError> {
        let vk = ed25519_dalek::VerifyingKey::from_bytes(&self.0)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        vk.verify(data.as_bytes(), &sig)
            .map_err(|e| CryptoError::VerificationFailed(e.to_string()))
    }
}

impl Serialize for Ed25519PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_multibase())
    }
}

impl<'de> Deserialize<'de> for Ed25519PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_multibase(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519PublicKey({})", self.to_multibase())
    }
}

impl std::fmt::Display for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_multibase())
    }
}

// ---------------------------------------------------------------------------
// Ed25519Signature
// ---------------------------------------------------------------------------

impl Ed25519Signature {
    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Raw 64-byte signature.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// `z<base58btc>` form used in `proofValue`.
    pub fn to_multibase(&self) -> String {
        multibase::encode_base58btc(&self.0)
    }

    /// Parse the `z<base58btc>` form.
    pub fn from_multibase(s: &str) -> Result<Self, CryptoError> {
        let bytes = multibase::decode_base58btc(s).map_err(CryptoError::InvalidSignature)?;
        let arr: [u8; 64] = bytes.as_slice().try_into().map_err(|_| {
            CryptoError::InvalidSignature(format!("expected 64 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_multibase())
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_multibase(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.to_multibase();
        write!(f, "Ed25519Signature({}...)", &s[..s.len().min(12)])
    }
}

// ---------------------------------------------------------------------------
// Ed25519KeyPair
// ---------------------------------------------------------------------------

impl Ed25519KeyPair {
    /// Generate a fresh key pair from the operating system CSPRNG.
    ///
    /// Fails with [`CryptoError::KeyGeneration`] if the RNG is unavailable.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut seed = Zeroizing::new([0u8; 32]);
        OsRng
            .try_fill_bytes(seed.as_mut())
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        Ok(Self::from_seed(&seed))
    }

    /// Deterministic key pair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// Parse a 64-character hex seed.
    pub fn from_seed_hex(hex: &str) -> Result<Self, CryptoError> {
        let hex = hex.trim();
        if hex.len() != 64 || !hex.is_ascii() {
            return Err(CryptoError::InvalidKey(format!(
                "seed hex must be 64 chars, got {}",
                hex.len()
            )));
        }
        let mut seed = Zeroizing::new([0u8; 32]);
        for (i, slot) in seed.iter_mut().enumerate() {
            *slot = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|e| CryptoError::InvalidKey(format!("invalid seed hex: {e}")))?;
        }
        Ok(Self::from_seed(&seed))
    }

    /// The public half.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign canonical bytes.
    pub fn sign(&self, data: &CanonicalBytes) -> Ed25519Signature {
        Ed25519Signature(self.signing_key.sign(data.as_bytes()).to_bytes())
    }

    /// Explicit seed export, hex-encoded in a zeroizing buffer.
    pub fn export_seed(&self) -> Zeroizing<String> {
        Zeroizing::new(
            self.signing_key
                .to_bytes()
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect(),
        )
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519KeyPair(<private>)")
    }
}
