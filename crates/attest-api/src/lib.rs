//! # attest-api: Axum API Services
//!
//! The HTTP surface of the Attest Stack. Assembles the registry, issuance,
//! presentation, batch and workflow routers into one application with
//! shared middleware for authentication and tracing.
//!
//! ## Routes
//!
//! - `/v1/dids/*`: DID registry (create, list, resolve, status)
//! - `/v1/schemas/*`: Credential schema registry
//! - `/v1/credentials/*`: Issue, fetch, verify, revoke, status
//! - `/v1/presentations/*`: Create and verify presentations
//! - `/v1/batches/*`: Asynchronous batch issuance jobs
//! - `/v1/policies/*`: Verification policies
//! - `/v1/requests/*`, `/v1/submissions/*`: Presentation request workflow
//! - `/health/*`: Health probes (unauthenticated)
//!
//! ## Middleware Stack (Tower)
//!
//! TraceLayer → AuthLayer → body limit
//!
//! Callers identify themselves with `X-Principal-Id`; DIDs, requests and
//! jobs are owned by the principal that created them.
//!
//! ## Crate Policy
//!
//! - Sits at the top of the dependency DAG.
//! - No business logic in route handlers. They delegate to domain crates.
//! - All errors map to structured HTTP responses via `AppError`.

pub mod auth;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use state::{AppConfig, AppState};

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;

/// Upper bound on request bodies. Batch submissions are the largest.
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the auth middleware
/// so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let api = Router::new()
        .merge(routes::dids::router())
        .merge(routes::schemas::router())
        .merge(routes::credentials::router())
        .merge(routes::presentations::router())
        .merge(routes::batches::router())
        .merge(routes::policies::router())
        .merge(routes::requests::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(from_fn(auth::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe. Always 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

async fn readiness() -> &'static str {
    "ready"
}
