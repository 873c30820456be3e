//! # Verification Policies
//!
//! - `POST /v1/policies`: Create a policy owned by the caller. Names are unique.
//! - `GET  /v1/policies`: All policies, sorted by name.
//! - `GET  /v1/policies/{name}`: One policy.
//! - `PUT  /v1/policies/{name}`: Replace a policy's mutable fields (owner only).

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use attest_workflow::{PolicyUpdate, VerificationPolicy};

use crate::auth::Principal;
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/policies", post(create_policy).get(list_policies))
        .route("/v1/policies/{name}", get(get_policy).put(update_policy))
}

async fn create_policy(
    State(state): State<AppState>,
    principal: Principal,
    body: Result<Json<VerificationPolicy>, JsonRejection>,
) -> Result<(StatusCode, Json<VerificationPolicy>), AppError> {
    let policy = state
        .workflow
        .create_policy(principal.as_str(), extract_json(body)?)?;
    tracing::debug!(policy = %policy.name, principal = principal.as_str(), "policy created via API");
    Ok((StatusCode::CREATED, Json(policy)))
}

async fn list_policies(State(state): State<AppState>) -> Json<Vec<VerificationPolicy>> {
    Json(state.workflow.list_policies())
}

async fn get_policy(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<VerificationPolicy>, AppError> {
    Ok(Json(state.workflow.get_policy(&name)?))
}

async fn update_policy(
    State(state): State<AppState>,
    principal: Principal,
    Path(name): Path<String>,
    body: Result<Json<PolicyUpdate>, JsonRejection>,
) -> Result<Json<VerificationPolicy>, AppError> {
    let policy = state
        .workflow
        .update_policy(&name, principal.as_str(), extract_json(body)?)?;
    tracing::debug!(policy = %name, principal = principal.as_str(), "policy updated via API");
    Ok(Json(policy))
}
