//! # Presentation Requests and Submissions
//!
//! - `POST /v1/requests`: Publish a request; the caller becomes its requester.
//! - `GET  /v1/requests/{id}`: Request, including the challenge holders must sign.
//! - `POST /v1/requests/{id}/deactivate`: Stop accepting submissions (requester only).
//! - `POST /v1/requests/{id}/submissions`: Submit `{"presentation": ...}` or `{"credential": ...}`.
//! - `GET  /v1/submissions/{id}`: Visible to the submitter and the requester.
//! - `POST /v1/submissions/{id}/decision`: Verify and decide (requester only).

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use attest_core::{RequestId, SubmissionId};
use attest_workflow::{NewPresentationRequest, PresentationRequest, Submission, SubmittedArtifact};

use crate::auth::Principal;
use crate::error::AppError;
use crate::extractors::{extract_json, parse_path};
use crate::state::AppState;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DecisionRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/requests", post(create_request))
        .route("/v1/requests/{id}", get(get_request))
        .route("/v1/requests/{id}/deactivate", post(deactivate_request))
        .route("/v1/requests/{id}/submissions", post(submit))
        .route("/v1/submissions/{id}", get(get_submission))
        .route("/v1/submissions/{id}/decision", post(decide))
}

async fn create_request(
    State(state): State<AppState>,
    principal: Principal,
    body: Result<Json<NewPresentationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PresentationRequest>), AppError> {
    let request = state
        .workflow
        .create_request(principal.as_str(), extract_json(body)?)?;
    Ok((StatusCode::CREATED, Json(request)))
}

async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PresentationRequest>, AppError> {
    let id: RequestId = parse_path(&id)?;
    Ok(Json(state.workflow.get_request(&id)?))
}

async fn deactivate_request(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<PresentationRequest>, AppError> {
    let id: RequestId = parse_path(&id)?;
    Ok(Json(state.workflow.deactivate_request(&id, principal.as_str())?))
}

async fn submit(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    body: Result<Json<SubmittedArtifact>, JsonRejection>,
) -> Result<(StatusCode, Json<Submission>), AppError> {
    let id: RequestId = parse_path(&id)?;
    let submission = state
        .workflow
        .submit(&id, principal.as_str(), extract_json(body)?)?;
    Ok((StatusCode::CREATED, Json(submission)))
}

async fn get_submission(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Submission>, AppError> {
    let id: SubmissionId = parse_path(&id)?;
    Ok(Json(state.workflow.get_submission(&id, principal.as_str())?))
}

async fn decide(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Submission>, AppError> {
    let id: SubmissionId = parse_path(&id)?;
    let req: DecisionRequest = if body.is_empty() {
        DecisionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("invalid request body: {e}")))?
    };
    Ok(Json(state.workflow.decide(&id, principal.as_str(), req.notes)?))
}
