//! # DID Registry
//!
//! Mints `did:key` DIDs backed by keys in the injected [`KeyStore`], resolves
//! DIDs local-first with a self-certifying fallback, and records lifecycle
//! status.
//!
//! `create_did` is not idempotent: every call mints a new DID. Enforcing
//! one DID per owner is the caller's job.

use std::sync::Arc;

use attest_core::{Did, Store, Timestamp};
use attest_crypto::{KeyPurpose, KeyStore, StoredKey};

use crate::did_key;
use crate::document::{DidDocument, DidStatus};
use crate::error::DidError;
use crate::resolver::DidResolver;

/// Local DID document store plus the key store that backs it.
#[derive(Clone)]
pub struct DidRegistry {
    documents: Store<Did, DidDocument>,
    keys: Arc<dyn KeyStore>,
}

impl std::fmt::Debug for DidRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DidRegistry")
            .field("documents", &self.documents.len())
            .finish_non_exhaustive()
    }
}

impl DidRegistry {
    pub fn new(keys: Arc<dyn KeyStore>) -> Self {
        Self {
            documents: Store::new(),
            keys,
        }
    }

    /// The key store backing this registry.
    pub fn key_store(&self) -> Arc<dyn KeyStore> {
        Arc::clone(&self.keys)
    }

    /// Mint a new DID for `owner`.
    ///
    /// Generates a key pair, derives the `did:key` from its public half,
    /// persists the key with all five purposes, and stores a document whose
    /// five relationships all point at that key.
    pub fn create_did(&self, owner: Option<&str>) -> Result<DidDocument, DidError> {
        let pair = self.keys.generate_key_pair()?;
        let public_key = pair.public_key();
        let did = did_key::did_from_public_key(&public_key)?;
        let document = DidDocument::with_single_key(did.clone(), public_key, owner.map(str::to_string));
        let key_id = document.verification_method[0].id.clone();

        self.keys.persist(
            &did,
            StoredKey::from_key_pair(key_id, did.clone(), pair, KeyPurpose::ALL),
        )?;
        if !self.documents.insert_new(did.clone(), document.clone()) {
            return Err(DidError::AlreadyExists(did.to_string()));
        }

        tracing::info!(did = %did, owner = owner.unwrap_or("-"), "created DID");
        Ok(document)
    }

    /// Locally stored document, if any. No fallback.
    pub fn get_local(&self, did: &Did) -> Option<DidDocument> {
        self.documents.get(did)
    }

    /// Local documents belonging to `owner`.
    pub fn list_by_owner(&self, owner: &str) -> Vec<DidDocument> {
        let mut docs: Vec<_> = self
            .documents
            .list()
            .into_iter()
            .filter(|d| d.owner.as_deref() == Some(owner))
            .collect();
        docs.sort_by_key(|d| d.created);
        docs
    }

    /// Change a DID's lifecycle status.
    ///
    /// Only existence is checked; any status may follow any other.
    pub fn set_status(&self, did: &Did, status: DidStatus) -> Result<DidDocument, DidError> {
        let updated = self
            .documents
            .update(did, |doc| {
                doc.status = status;
                doc.updated = Timestamp::now();
            })
            .ok_or_else(|| DidError::NotFound(did.to_string()))?;
        tracing::info!(did = %did, status = %status, "DID status changed");
        Ok(updated)
    }
}

impl DidResolver for DidRegistry {
    /// Local store first, then `did:key` synthesis.
    fn resolve(&self, did: &Did) -> Result<DidDocument, DidError> {
        if let Some(doc) = self.documents.get(did) {
            return Ok(doc);
        }
        match did.method() {
            did_key::DID_KEY_METHOD => did_key::synthesize_document(did),
            _ => Err(DidError::Unresolvable(did.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_crypto::{CryptoError, Ed25519KeyPair, MemoryKeyStore};

    fn registry() -> DidRegistry {
        DidRegistry::new(Arc::new(MemoryKeyStore::new()))
    }

    #[test]
    fn create_did_persists_document_and_key() {
        let reg = registry();
        let doc = reg.create_did(Some("org-42")).unwrap();
        assert!(doc.id.as_str().starts_with("did:key:z6Mk"));
        assert_eq!(doc.status, DidStatus::Active);
        assert_eq!(doc.owner.as_deref(), Some("org-42"));
        assert_eq!(reg.get_local(&doc.id), Some(doc.clone()));

        let handle = reg
            .key_store()
            .fetch_signing_key(&doc.id, KeyPurpose::AssertionMethod)
            .unwrap();
        assert_eq!(handle.key_id(), doc.assertion_method[0]);
        assert_eq!(handle.public_key(), doc.verification_method[0].public_key_multibase);
    }

    #[test]
    fn did_is_derived_from_public_key() {
        let reg = registry();
        let doc = reg.create_did(None).unwrap();
        let pk = doc.verification_method[0].public_key_multibase;
        assert_eq!(did_key::did_from_public_key(&pk).unwrap(), doc.id);
    }

    #[test]
    fn create_did_is_not_idempotent() {
        let reg = registry();
        let a = reg.create_did(Some("same")).unwrap();
        let b = reg.create_did(Some("same")).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(reg.list_by_owner("same").len(), 2);
        assert!(reg.list_by_owner("other").is_empty());
    }

    #[test]
    fn resolve_prefers_local_document() {
        let reg = registry();
        let doc = reg.create_did(Some("u")).unwrap();
        reg.set_status(&doc.id, DidStatus::Revoked).unwrap();
        let resolved = reg.resolve(&doc.id).unwrap();
        assert_eq!(resolved.status, DidStatus::Revoked);
        assert_eq!(resolved.owner.as_deref(), Some("u"));
    }

    #[test]
    fn resolve_falls_back_to_did_key() {
        let reg = registry();
        let pk = Ed25519KeyPair::generate().unwrap().public_key();
        let did = did_key::did_from_public_key(&pk).unwrap();
        let doc = reg.resolve(&did).unwrap();
        assert_eq!(doc.verification_method[0].public_key_multibase, pk);
        assert!(doc.owner.is_none());
        assert!(reg.get_local(&did).is_none());
    }

    #[test]
    fn resolve_unknown_method_is_unresolvable() {
        let reg = registry();
        let err = reg.resolve(&Did::new("did:web:example.com").unwrap()).unwrap_err();
        assert_eq!(err, DidError::Unresolvable("did:web:example.com".into()));
    }

    #[test]
    fn set_status_unknown_is_not_found() {
        let reg = registry();
        let pk = Ed25519KeyPair::generate().unwrap().public_key();
        let did = did_key::did_from_public_key(&pk).unwrap();
        assert!(matches!(
            reg.set_status(&did, DidStatus::Deactivated),
            Err(DidError::NotFound(_))
        ));
    }

    #[test]
    fn set_status_touches_updated() {
        let reg = registry();
        let doc = reg.create_did(None).unwrap();
        let after = reg.set_status(&doc.id, DidStatus::Deactivated).unwrap();
        assert_eq!(after.status, DidStatus::Deactivated);
        assert!(after.updated >= doc.updated);
        assert_eq!(after.created, doc.created);
    }

    #[test]
    fn key_generation_failure_propagates() {
        struct BrokenRng;
        impl KeyStore for BrokenRng {
            fn generate_key_pair(&self) -> Result<Ed25519KeyPair, CryptoError> {
                Err(CryptoError::KeyGeneration("entropy source unavailable".into()))
            }
            fn persist(&self, _: &Did, _: StoredKey) -> Result<(), CryptoError> {
                Ok(())
            }
            fn fetch_signing_key(
                &self,
                did: &Did,
                purpose: KeyPurpose,
            ) -> Result<attest_crypto::SigningKeyHandle, CryptoError> {
                Err(CryptoError::KeyNotFound {
                    did: did.to_string(),
                    purpose,
                })
            }
            fn list_keys(&self, _: &Did) -> Vec<attest_crypto::KeyDescriptor> {
                Vec::new()
            }
        }

        let reg = DidRegistry::new(Arc::new(BrokenRng));
        assert!(matches!(
            reg.create_did(None),
            Err(DidError::Crypto(CryptoError::KeyGeneration(_)))
        ));
    }
}
