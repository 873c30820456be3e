//! # Credential Schemas
//!
//! - `POST /v1/schemas`: Register a schema.
//! - `GET  /v1/schemas`: All registered schemas, sorted by id.
//! - `GET  /v1/schemas/{id}`: One schema.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use attest_schema::CredentialSchema;

use crate::auth::Principal;
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/schemas", post(register_schema).get(list_schemas))
        .route("/v1/schemas/{id}", get(get_schema))
}

async fn register_schema(
    State(state): State<AppState>,
    principal: Principal,
    body: Result<Json<CredentialSchema>, JsonRejection>,
) -> Result<(StatusCode, Json<CredentialSchema>), AppError> {
    let schema = state.schemas.register(extract_json(body)?)?;
    tracing::info!(schema_id = %schema.id, principal = principal.as_str(), "schema registered via API");
    Ok((StatusCode::CREATED, Json(schema)))
}

async fn list_schemas(State(state): State<AppState>) -> Json<Vec<CredentialSchema>> {
    Json(state.schemas.list())
}

async fn get_schema(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CredentialSchema>, AppError> {
    state
        .schemas
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("schema {id}")))
}
