//! # attest-schema: Credential Schemas
//!
//! A [`CredentialSchema`] pairs a credential type with a JSON Schema for its
//! `credentialSubject`. [`SchemaRegistry`] compiles schemas once at
//! registration and validates claim payloads before any signing work.
//!
//! Other crates consume schemas through the [`SchemaSource`] capability so
//! tests and alternative catalogs can stand in for the registry.

pub mod error;
pub mod registry;

pub use error::{SchemaError, Violation};
pub use registry::{CredentialSchema, SchemaRegistry, SchemaSource};
