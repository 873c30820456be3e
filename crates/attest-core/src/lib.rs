//! # attest-core: Foundational Types for the Attest Stack
//!
//! Every other crate in the workspace depends on `attest-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** Everything that is signed or digested goes
//!    through [`CanonicalBytes::new()`] (RFC 8785 JSON canonicalization).
//!    Signing APIs downstream accept only `&CanonicalBytes`.
//!
//! 2. **Validated identifiers.** [`Did`] is checked at construction and on
//!    deserialization. Job, request and submission ids are distinct newtypes.
//!
//! 3. **UTC-only timestamps.** [`Timestamp`] is UTC, truncated to seconds.
//!
//! 4. **One in-memory repository shape.** [`Store`] is the concurrency-safe
//!    map used by every registry in the workspace.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `attest-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod store;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, ValidationError};
pub use identity::{Did, JobId, RequestId, SubmissionId};
pub use store::Store;
pub use temporal::Timestamp;
