//! # Route Modules
//!
//! Each module defines an Axum Router for one API surface area.
//! Routers are assembled in [`crate::app`].

pub mod batches;
pub mod credentials;
pub mod dids;
pub mod policies;
pub mod presentations;
pub mod requests;
pub mod schemas;

use attest_core::Did;
use attest_did::DidDocument;

use crate::auth::Principal;
use crate::error::AppError;
use crate::state::AppState;

/// The locally held document of `did`, if `principal` owns it.
///
/// Issuing, presenting, revoking and status changes all act with a DID's
/// keys, so only its owner may trigger them.
pub(crate) fn require_owned_did(
    state: &AppState,
    did: &Did,
    principal: &Principal,
) -> Result<DidDocument, AppError> {
    let document = state
        .dids
        .get_local(did)
        .ok_or_else(|| AppError::NotFound(format!("DID {did} is not held by this service")))?;
    if document.owner.as_deref() != Some(principal.as_str()) {
        return Err(AppError::Forbidden(format!(
            "DID {did} is not owned by the caller"
        )));
    }
    Ok(document)
}
