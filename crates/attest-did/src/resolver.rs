//! # DID Resolution Capability
//!
//! Signers and verifiers never reach for a global resolver. They are handed
//! a [`DidResolver`], which may be the full [`DidRegistry`](crate::DidRegistry),
//! the registry-free [`DidKeyResolver`], or a closure in tests.

use attest_core::Did;

use crate::did_key;
use crate::document::DidDocument;
use crate::error::DidError;

/// Maps a DID to its document.
pub trait DidResolver: Send + Sync {
    /// Resolve `did`. Fails with [`DidError::Unresolvable`] when no document
    /// can be produced.
    fn resolve(&self, did: &Did) -> Result<DidDocument, DidError>;
}

impl<F> DidResolver for F
where
    F: Fn(&Did) -> Result<DidDocument, DidError> + Send + Sync,
{
    fn resolve(&self, did: &Did) -> Result<DidDocument, DidError> {
        self(did)
    }
}

/// Resolves `did:key` identifiers only, with no local state.
#[derive(Debug, Clone, Copy, Default)]
pub struct DidKeyResolver;

impl DidResolver for DidKeyResolver {
    fn resolve(&self, did: &Did) -> Result<DidDocument, DidError> {
        did_key::synthesize_document(did)
    }
}
