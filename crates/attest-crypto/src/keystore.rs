//! # Key Store
//!
//! The [`KeyStore`] owns every private key in the system. Callers get a
//! [`SigningKeyHandle`] that can sign canonical bytes but cannot reveal the
//! seed, and a serializable [`KeyDescriptor`] for anything that leaves the
//! process.
//!
//! Keys are append-only per DID: a later key with the same purpose shadows
//! an earlier one for signing, but nothing is ever overwritten or removed.

use std::collections::BTreeSet;
use std::sync::Arc;

use attest_core::{CanonicalBytes, Did, Store, Timestamp};
use serde::{Deserialize, Serialize};

use crate::ed25519::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use crate::error::CryptoError;

// ── Purposes ────────────────────────────────────────────────────────────────

/// DID verification relationship a key may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyPurpose {
    Authentication,
    AssertionMethod,
    KeyAgreement,
    CapabilityInvocation,
    CapabilityDelegation,
}

impl KeyPurpose {
    /// All five relationships, in DID document order.
    pub const ALL: [KeyPurpose; 5] = [
        KeyPurpose::Authentication,
        KeyPurpose::AssertionMethod,
        KeyPurpose::KeyAgreement,
        KeyPurpose::CapabilityInvocation,
        KeyPurpose::CapabilityDelegation,
    ];

    /// The DID document property name for this relationship.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::AssertionMethod => "assertionMethod",
            Self::KeyAgreement => "keyAgreement",
            Self::CapabilityInvocation => "capabilityInvocation",
            Self::CapabilityDelegation => "capabilityDelegation",
        }
    }
}

impl std::fmt::Display for KeyPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key algorithm. Only Ed25519 is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    Ed25519,
}

// ── Stored key ──────────────────────────────────────────────────────────────

/// A signing key bound to a controller DID, as held by the store.
///
/// Does not implement `Serialize`. Use [`StoredKey::descriptor`] for the
/// public projection.
#[derive(Clone)]
pub struct StoredKey {
    key_id: String,
    controller: Did,
    key_type: KeyType,
    public_key: Ed25519PublicKey,
    private: Option<Arc<Ed25519KeyPair>>,
    purposes: BTreeSet<KeyPurpose>,
    created_at: Timestamp,
}

impl StoredKey {
    /// A key whose private half is retained.
    pub fn from_key_pair(
        key_id: impl Into<String>,
        controller: Did,
        pair: Ed25519KeyPair,
        purposes: impl IntoIterator<Item = KeyPurpose>,
    ) -> Self {
        Self {
            key_id: key_id.into(),
            controller,
            key_type: KeyType::Ed25519,
            public_key: pair.public_key(),
            private: Some(Arc::new(pair)),
            purposes: purposes.into_iter().collect(),
            created_at: Timestamp::now(),
        }
    }

    /// An imported key with no private material. It can be resolved for
    /// verification but never used to sign.
    pub fn public_only(
        key_id: impl Into<String>,
        controller: Did,
        public_key: Ed25519PublicKey,
        purposes: impl IntoIterator<Item = KeyPurpose>,
    ) -> Self {
        Self {
            key_id: key_id.into(),
            controller,
            key_type: KeyType::Ed25519,
            public_key,
            private: None,
            purposes: purposes.into_iter().collect(),
            created_at: Timestamp::now(),
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn controller(&self) -> &Did {
        &self.controller
    }

    pub fn public_key(&self) -> &Ed25519PublicKey {
        &self.public_key
    }

    pub fn purposes(&self) -> &BTreeSet<KeyPurpose> {
        &self.purposes
    }

    /// Whether the private half was retained.
    pub fn has_private_material(&self) -> bool {
        self.private.is_some()
    }

    /// Public projection safe to serialize.
    pub fn descriptor(&self) -> KeyDescriptor {
        KeyDescriptor {
            key_id: self.key_id.clone(),
            controller: self.controller.clone(),
            key_type: self.key_type,
            public_key_multibase: self.public_key,
            purposes: self.purposes.clone(),
            has_private_material: self.private.is_some(),
            created_at: self.created_at,
        }
    }
}

impl std::fmt::Debug for StoredKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredKey")
            .field("key_id", &self.key_id)
            .field("controller", &self.controller)
            .field("public_key", &self.public_key)
            .field("private", &self.private.as_ref().map(|_| "[REDACTED]"))
            .field("purposes", &self.purposes)
            .finish()
    }
}

/// Serializable public view of a stored key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDescriptor {
    pub key_id: String,
    pub controller: Did,
    pub key_type: KeyType,
    pub public_key_multibase: Ed25519PublicKey,
    pub purposes: BTreeSet<KeyPurpose>,
    pub has_private_material: bool,
    pub created_at: Timestamp,
}

// ── Signing handle ──────────────────────────────────────────────────────────

/// A key fetched for signing. Signs canonical bytes; never exposes the seed.
#[derive(Clone)]
pub struct SigningKeyHandle {
    key_id: String,
    controller: Did,
    pair: Arc<Ed25519KeyPair>,
}

impl SigningKeyHandle {
    /// DID URL of the key, used as a proof's `verificationMethod`.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn controller(&self) -> &Did {
        &self.controller
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        self.pair.public_key()
    }

    pub fn sign(&self, data: &CanonicalBytes) -> Ed25519Signature {
        self.pair.sign(data)
    }
}

impl std::fmt::Debug for SigningKeyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyHandle")
            .field("key_id", &self.key_id)
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

// ── KeyStore trait ──────────────────────────────────────────────────────────

/// Generates, persists and retrieves signing keys bound to DIDs.
pub trait KeyStore: Send + Sync {
    /// Produce a fresh Ed25519 key pair from a CSPRNG.
    fn generate_key_pair(&self) -> Result<Ed25519KeyPair, CryptoError> {
        Ed25519KeyPair::generate()
    }

    /// Store `key` under `did`. The key's controller must be `did` and its
    /// id must not already be stored.
    fn persist(&self, did: &Did, key: StoredKey) -> Result<(), CryptoError>;

    /// Most recently persisted key of `did` carrying `purpose`.
    ///
    /// Fails with [`CryptoError::KeyNotFound`] if none exists and
    /// [`CryptoError::PrivateMaterialMissing`] if that key is public-only.
    fn fetch_signing_key(
        &self,
        did: &Did,
        purpose: KeyPurpose,
    ) -> Result<SigningKeyHandle, CryptoError>;

    /// Public descriptors of every key stored for `did`, oldest first.
    fn list_keys(&self, did: &Did) -> Vec<KeyDescriptor>;
}

/// In-memory [`KeyStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyStore {
    keys: Store<Did, Vec<StoredKey>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn persist(&self, did: &Did, key: StoredKey) -> Result<(), CryptoError> {
        if key.controller != *did {
            return Err(CryptoError::ControllerMismatch {
                did: did.to_string(),
                controller: key.controller.to_string(),
            });
        }
        let key_id = key.key_id.clone();
        self.keys.upsert_with(did.clone(), Vec::new, |keys| {
            if keys.iter().any(|k| k.key_id == key.key_id) {
                return Err(CryptoError::DuplicateKey(key.key_id.clone()));
            }
            keys.push(key);
            Ok(())
        })?;
        tracing::debug!(did = %did, key_id = %key_id, "persisted signing key");
        Ok(())
    }

    fn fetch_signing_key(
        &self,
        did: &Did,
        purpose: KeyPurpose,
    ) -> Result<SigningKeyHandle, CryptoError> {
        let keys = self.keys.get(did).unwrap_or_default();
        let key = keys
            .iter()
            .rev()
            .find(|k| k.purposes.contains(&purpose))
            .ok_or_else(|| CryptoError::KeyNotFound {
                did: did.to_string(),
                purpose,
            })?;
        let pair = key
            .private
            .clone()
            .ok_or_else(|| CryptoError::PrivateMaterialMissing {
                did: did.to_string(),
                key_id: key.key_id.clone(),
            })?;
        Ok(SigningKeyHandle {
            key_id: key.key_id.clone(),
            controller: key.controller.clone(),
            pair,
        })
    }

    fn list_keys(&self, did: &Did) -> Vec<KeyDescriptor> {
        self.keys
            .get(did)
            .unwrap_or_default()
            .iter()
            .map(StoredKey::descriptor)
            .collect()
    }
}
