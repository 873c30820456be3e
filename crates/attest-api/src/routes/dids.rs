//! # DID Registry
//!
//! - `POST /v1/dids`: Mint a `did:key` owned by the caller.
//! - `GET  /v1/dids`: The caller's DIDs.
//! - `GET  /v1/dids/{did}`: Resolve any DID (local or `did:key`).
//! - `PUT  /v1/dids/{did}/status`: Change lifecycle status (owner only).

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use attest_core::Did;
use attest_did::{DidDocument, DidError, DidResolver, DidStatus};

use crate::auth::Principal;
use crate::error::AppError;
use crate::extractors::{extract_json, parse_path};
use crate::routes::require_owned_did;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: DidStatus,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/dids", post(create_did).get(list_dids))
        .route("/v1/dids/{did}", get(resolve_did))
        .route("/v1/dids/{did}/status", put(set_status))
}

async fn create_did(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<(StatusCode, Json<DidDocument>), AppError> {
    let document = state.dids.create_did(Some(principal.as_str()))?;
    Ok((StatusCode::CREATED, Json(document)))
}

async fn list_dids(
    State(state): State<AppState>,
    principal: Principal,
) -> Json<Vec<DidDocument>> {
    Json(state.dids.list_by_owner(principal.as_str()))
}

async fn resolve_did(
    State(state): State<AppState>,
    Path(did): Path<String>,
) -> Result<Json<DidDocument>, AppError> {
    let did: Did = parse_path(&did)?;
    let document = state.dids.resolve(&did).map_err(|e| match e {
        DidError::Unresolvable(_) => AppError::NotFound(e.to_string()),
        other => other.into(),
    })?;
    Ok(Json(document))
}

async fn set_status(
    State(state): State<AppState>,
    principal: Principal,
    Path(did): Path<String>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<DidDocument>, AppError> {
    let did: Did = parse_path(&did)?;
    let update = extract_json(body)?;
    require_owned_did(&state, &did, &principal)?;
    Ok(Json(state.dids.set_status(&did, update.status)?))
}
