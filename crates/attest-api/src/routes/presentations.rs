//! # Verifiable Presentations
//!
//! - `POST /v1/presentations`: Sign a presentation as one of the caller's DIDs.
//! - `POST /v1/presentations/verify`: Holder proof, then every embedded credential.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use attest_core::{Did, Timestamp};
use attest_vc::{VerifiableCredential, VerifiablePresentation, VerificationOutcome};

use crate::auth::Principal;
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::routes::require_owned_did;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentRequest {
    pub holder: Did,
    pub credentials: Vec<VerifiableCredential>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPresentationRequest {
    pub presentation: VerifiablePresentation,
    /// When set, the proof must carry exactly this challenge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/presentations", post(create_presentation))
        .route("/v1/presentations/verify", post(verify_presentation))
}

async fn create_presentation(
    State(state): State<AppState>,
    principal: Principal,
    body: Result<Json<PresentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<VerifiablePresentation>), AppError> {
    let req = extract_json(body)?;
    require_owned_did(&state, &req.holder, &principal)?;
    let presentation =
        state
            .presentations
            .present(&req.holder, req.credentials, req.challenge, req.domain)?;
    Ok((StatusCode::CREATED, Json(presentation)))
}

async fn verify_presentation(
    State(state): State<AppState>,
    body: Result<Json<VerifyPresentationRequest>, JsonRejection>,
) -> Result<Json<VerificationOutcome>, AppError> {
    let req = extract_json(body)?;
    let outcome = state.presentations.verify(
        &req.presentation,
        req.challenge.as_deref(),
        req.domain.as_deref(),
    );
    if !outcome.verified {
        return Ok(Json(outcome));
    }
    let now = Timestamp::now();
    for credential in &req.presentation.verifiable_credential {
        let outcome = state.checks.check(credential, now);
        if !outcome.verified {
            let reason = outcome.reason.unwrap_or_default();
            return Ok(Json(VerificationOutcome::failed(format!(
                "credential {}: {reason}",
                credential.id
            ))));
        }
    }
    Ok(Json(VerificationOutcome::ok()))
}
