//! # Canonical Serialization: RFC 8785 (JCS)
//!
//! This module defines [`CanonicalBytes`], the sole construction path for
//! bytes that are signed or digested anywhere in the Attest Stack.
//!
//! ## Security Invariant
//!
//! The inner `Vec<u8>` is private. The only way to construct `CanonicalBytes`
//! is through [`CanonicalBytes::new()`], which serializes through `serde_jcs`.
//! Two semantically equal JSON documents therefore always produce the same
//! bytes, regardless of key insertion order or whitespace in the source.
//!
//! ## Rules
//!
//! 1. Object keys sorted by UTF-16 code units.
//! 2. No insignificant whitespace.
//! 3. Numbers in their shortest round-trip form (ECMAScript `Number.toString`).
//! 4. Strings escaped minimally.

use serde::Serialize;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JSON canonicalization.
///
/// Downstream code cannot construct `CanonicalBytes` except through
/// [`CanonicalBytes::new()`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// The value is first lowered to a `serde_json::Value` so that structs,
    /// maps and raw JSON all take the same path.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        let bytes = serde_jcs::to_vec(&value)?;
        Ok(Self(bytes))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume and return the inner byte vector.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Number of canonical bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the canonical form is empty. Never true for a valid JSON value.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
