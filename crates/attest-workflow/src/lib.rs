//! # attest-workflow: Presentation Verification Workflow
//!
//! A requester publishes a [`PresentationRequest`] naming the credentials
//! it needs, optionally governed by a [`VerificationPolicy`]. Holders
//! submit a presentation (or a bare credential) once per request. Each
//! [`Submission`] starts `pending` and makes exactly one transition to
//! `verified` or `rejected`.
//!
//! ```text
//!             decide (verified=true)
//! pending ──────────────────────────▶ verified
//!    │
//!    └────────────────────────────▶ rejected
//!             decide (otherwise)
//! ```
//!
//! The decision is derived from a [`VerificationOutcome`](attest_vc::VerificationOutcome),
//! never chosen freely. A policy with `autoApprove` (and without
//! `requireManualReview`) lets the system take that decision at submit
//! time.

pub mod error;
pub mod policy;
pub mod request;
pub mod verifier;
pub mod workflow;

pub use error::WorkflowError;
pub use policy::{PolicyStatus, PolicyUpdate, VerificationPolicy, MAX_VALIDITY_PERIOD_DAYS};
pub use request::{
    NewPresentationRequest, PresentationRequest, RequestStatus, Submission, SubmissionStatus,
    SubmittedArtifact,
};
pub use verifier::SubmissionVerifier;
pub use workflow::{VerificationWorkflow, SYSTEM_REVIEWER};
