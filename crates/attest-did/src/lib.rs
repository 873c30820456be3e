//! # attest-did: Decentralized Identifiers
//!
//! - [`document`]: the DID document model and lifecycle status.
//! - [`did_key`]: the self-certifying `did:key` method (Ed25519 only).
//! - [`resolver`]: the [`DidResolver`] capability injected into signers and
//!   verifiers.
//! - [`registry`]: [`DidRegistry`], which mints DIDs, resolves them
//!   local-first and tracks their status.

pub mod did_key;
pub mod document;
pub mod error;
pub mod registry;
pub mod resolver;

pub use did_key::{did_from_public_key, public_key_from_did_key};
pub use document::{DidDocument, DidStatus, VerificationMethod, VerificationMethodType};
pub use error::DidError;
pub use registry::DidRegistry;
pub use resolver::{DidKeyResolver, DidResolver};
