//! # Credential Issuance, Verification and Revocation
//!
//! ## Endpoints
//!
//! - `POST /v1/credentials`: Issue a credential as one of the caller's DIDs.
//! - `GET  /v1/credentials/{id}`: Stored credential record.
//! - `POST /v1/credentials/verify`: Signature, expiry and revocation check.
//! - `POST /v1/credentials/{id}/revoke`: Revoke (issuer owner only).
//! - `GET  /v1/credentials/{id}/status`: Revocation status.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use attest_core::{Did, Timestamp};
use attest_schema::SchemaSource;
use attest_vc::{
    CredentialRecord, CredentialRepository, CredentialStatus, IssueRequest, VerifiableCredential,
    VerificationOutcome,
};

use crate::auth::Principal;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::routes::require_owned_did;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCredentialRequest {
    pub issuer: Did,
    pub credential_subject: Value,
    /// When set, claims are validated against the schema and the schema's
    /// credential type is added.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,
    #[serde(default, rename = "type")]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Validate for IssueCredentialRequest {
    fn validate(&self) -> Result<(), String> {
        if self.types.iter().any(|t| t.trim().is_empty()) {
            return Err("credential types must not be empty strings".into());
        }
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RevokeRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/credentials", post(issue_credential))
        .route("/v1/credentials/verify", post(verify_credential))
        .route("/v1/credentials/{id}", get(get_credential))
        .route("/v1/credentials/{id}/revoke", post(revoke_credential))
        .route("/v1/credentials/{id}/status", get(credential_status))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn issue_credential(
    State(state): State<AppState>,
    principal: Principal,
    body: Result<Json<IssueCredentialRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<VerifiableCredential>), AppError> {
    let req = extract_validated_json(body)?;
    require_owned_did(&state, &req.issuer, &principal)?;

    let mut issue = IssueRequest::new(req.issuer, req.credential_subject);
    if let Some(schema_id) = &req.schema_id {
        let schema = state.schemas.schema(schema_id)?;
        state.schemas.validate_claims(schema_id, &issue.subject)?;
        issue = issue.with_type(schema.credential_type);
    }
    for t in req.types {
        issue = issue.with_type(t);
    }
    if let Some(exp) = req.expiration_date {
        issue = issue.expires(exp);
    }
    if let Some(id) = req.id {
        issue = issue.with_id(id);
    }

    let credential = state.signer.issue(issue)?;
    let record = CredentialRecord::new(credential.clone(), req.schema_id)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    state.credentials.create(record)?;
    Ok((StatusCode::CREATED, Json(credential)))
}

async fn get_credential(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CredentialRecord>, AppError> {
    state
        .credentials
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("credential {id}")))
}

async fn verify_credential(
    State(state): State<AppState>,
    body: Result<Json<VerifiableCredential>, JsonRejection>,
) -> Result<Json<VerificationOutcome>, AppError> {
    let credential = extract_json(body)?;
    Ok(Json(state.checks.check(&credential, Timestamp::now())))
}

async fn revoke_credential(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<CredentialStatus>, AppError> {
    let req: RevokeRequest = if body.is_empty() {
        RevokeRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("invalid request body: {e}")))?
    };
    let record = state
        .credentials
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("credential {id}")))?;
    require_owned_did(&state, &record.issuer, &principal)?;
    Ok(Json(state.ledger.revoke(&id, req.reason)?))
}

async fn credential_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CredentialStatus>, AppError> {
    if state.credentials.get(&id).is_none() {
        return Err(AppError::NotFound(format!("credential {id}")));
    }
    Ok(Json(state.ledger.status(&id)))
}
