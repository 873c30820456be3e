//! # Batch Issuance
//!
//! - `POST   /v1/batches`: `{schemaId, issuer, credentials: [...]}` →
//!   `202 {jobId, status: "pending", total}`.
//! - `GET    /v1/batches/{id}`: Full job projection.
//! - `DELETE /v1/batches/{id}`: Cancel a pending or processing job.
//!
//! Only the owner of the job's issuer DID may submit, read or cancel it.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use attest_batch::{BatchJob, BatchSubmission, SubmissionReceipt};
use attest_core::JobId;

use crate::auth::Principal;
use crate::error::AppError;
use crate::extractors::{extract_json, parse_path};
use crate::routes::require_owned_did;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/batches", post(submit_batch))
        .route("/v1/batches/{id}", get(batch_status).delete(cancel_batch))
}

async fn submit_batch(
    State(state): State<AppState>,
    principal: Principal,
    body: Result<Json<BatchSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmissionReceipt>), AppError> {
    let submission = extract_json(body)?;
    require_owned_did(&state, &submission.issuer, &principal)?;
    let job = state.batches.submit(submission).await?;
    Ok((StatusCode::ACCEPTED, Json(SubmissionReceipt::from(&job))))
}

async fn batch_status(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<BatchJob>, AppError> {
    let job_id: JobId = parse_path(&id)?;
    let job = state.batches.status(&job_id)?;
    require_owned_did(&state, &job.issuer, &principal)?;
    Ok(Json(job))
}

async fn cancel_batch(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<BatchJob>, AppError> {
    let job_id: JobId = parse_path(&id)?;
    let job = state.batches.status(&job_id)?;
    require_owned_did(&state, &job.issuer, &principal)?;
    Ok(Json(state.batches.cancel(&job_id)?))
}
