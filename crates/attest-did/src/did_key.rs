//! # `did:key` (Ed25519)
//!
//! `did:key:z<base58btc(0xed 0x01 ‖ public key)>`. The identifier is the
//! public key, so any well-formed `did:key` can be resolved without a
//! registry lookup.

use attest_core::Did;
use attest_crypto::Ed25519PublicKey;

use crate::document::DidDocument;
use crate::error::DidError;

pub const DID_KEY_METHOD: &str = "key";

/// Derive the `did:key` for a public key. Deterministic.
pub fn did_from_public_key(public_key: &Ed25519PublicKey) -> Result<Did, DidError> {
    Ok(Did::new(format!("did:key:{}", public_key.to_multibase()))?)
}

/// Recover the public key encoded in a `did:key`.
pub fn public_key_from_did_key(did: &Did) -> Result<Ed25519PublicKey, DidError> {
    if did.method() != DID_KEY_METHOD {
        return Err(DidError::Unresolvable(did.to_string()));
    }
    Ed25519PublicKey::from_multibase(did.method_specific_id()).map_err(|e| {
        DidError::MalformedDidKey {
            did: did.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Build the minimal document implied by a `did:key` identifier.
///
/// The document is `ACTIVE`, has no owner, and its single key backs every
/// verification relationship.
pub fn synthesize_document(did: &Did) -> Result<DidDocument, DidError> {
    let public_key = public_key_from_did_key(did)?;
    Ok(DidDocument::with_single_key(did.clone(), public_key, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_crypto::Ed25519KeyPair;

    #[test]
    fn derivation_is_deterministic() {
        let pk = Ed25519KeyPair::from_seed(&[5u8; 32]).public_key();
        let a = did_from_public_key(&pk).unwrap();
        let b = did_from_public_key(&pk).unwrap();
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("did:key:z6Mk"));
    }

    #[test]
    fn distinct_keys_give_distinct_dids() {
        let a = did_from_public_key(&Ed25519KeyPair::from_seed(&[1u8; 32]).public_key()).unwrap();
        let b = did_from_public_key(&Ed25519KeyPair::from_seed(&[2u8; 32]).public_key()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn public_key_roundtrip() {
        let pk = Ed25519KeyPair::generate().unwrap().public_key();
        let did = did_from_public_key(&pk).unwrap();
        assert_eq!(public_key_from_did_key(&did).unwrap(), pk);
    }

    #[test]
    fn other_methods_are_unresolvable() {
        let did = Did::new("did:example:uni").unwrap();
        assert_eq!(
            public_key_from_did_key(&did).unwrap_err(),
            DidError::Unresolvable("did:example:uni".into())
        );
    }

    #[test]
    fn garbage_did_key_is_malformed() {
        let did = Did::new("did:key:z111").unwrap();
        assert!(matches!(
            public_key_from_did_key(&did),
            Err(DidError::MalformedDidKey { .. })
        ));
    }

    #[test]
    fn synthesized_document_shape() {
        let pk = Ed25519KeyPair::from_seed(&[8u8; 32]).public_key();
        let did = did_from_public_key(&pk).unwrap();
        let doc = synthesize_document(&did).unwrap();
        assert_eq!(doc.id, did);
        assert_eq!(doc.controller, did);
        assert!(doc.owner.is_none());
        assert_eq!(doc.verification_method.len(), 1);
        assert_eq!(
            doc.verification_method[0].id,
            format!("{}#{}", did, pk.to_multibase())
        );
    }
}
