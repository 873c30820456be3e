//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from every attest crate to HTTP status codes and
//! returns JSON bodies of the form `{"error": {"code", "message"}}`.
//! Internal error details are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use attest_batch::BatchError;
use attest_core::ValidationError;
use attest_crypto::CryptoError;
use attest_did::DidError;
use attest_schema::{SchemaError, Violation};
use attest_vc::{PresentationError, RecordError, SignerError};
use attest_workflow::WorkflowError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Per-field violations, present only for claims validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Claims did not conform to their credential schema (422).
    #[error("validation error: {message}")]
    InvalidClaims {
        message: String,
        violations: Vec<Violation>,
    },

    /// Request body or path could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Authentication failure: missing or invalid token or principal (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The principal may not act on this resource (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with current resource state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) | Self::InvalidClaims { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
            }
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => {
                tracing::error!(error = %self, "internal server error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };
        let details = match &self {
            Self::InvalidClaims { violations, .. } => {
                Some(serde_json::json!({ "violations": violations }))
            }
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

// -- Domain error conversions -------------------------------------------------

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<CryptoError> for AppError {
    fn from(err: CryptoError) -> Self {
        match &err {
            CryptoError::KeyNotFound { .. }
            | CryptoError::PrivateMaterialMissing { .. }
            | CryptoError::InvalidKey(_)
            | CryptoError::InvalidSignature(_)
            | CryptoError::VerificationFailed(_) => Self::Validation(err.to_string()),
            CryptoError::DuplicateKey(_) => Self::Conflict(err.to_string()),
            CryptoError::KeyGeneration(_) | CryptoError::ControllerMismatch { .. } => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<DidError> for AppError {
    fn from(err: DidError) -> Self {
        match err {
            DidError::NotFound(_) => Self::NotFound(err.to_string()),
            DidError::Unresolvable(_) | DidError::MalformedDidKey { .. } | DidError::Validation(_) => {
                Self::Validation(err.to_string())
            }
            DidError::AlreadyExists(_) => Self::Conflict(err.to_string()),
            DidError::Crypto(e) => e.into(),
        }
    }
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::NotFound(_) => Self::NotFound(err.to_string()),
            SchemaError::AlreadyExists(_) => Self::Conflict(err.to_string()),
            SchemaError::InvalidDescriptor(_) | SchemaError::Compile { .. } => {
                Self::Validation(err.to_string())
            }
            SchemaError::ValidationFailed { ref violations, .. } => Self::InvalidClaims {
                message: err.to_string(),
                violations: violations.clone(),
            },
            SchemaError::Load { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl From<SignerError> for AppError {
    fn from(err: SignerError) -> Self {
        match err {
            SignerError::Validation(_) => Self::Validation(err.to_string()),
            SignerError::IssuerInactive { .. } => Self::Conflict(err.to_string()),
            SignerError::Did(e) => e.into(),
            SignerError::Crypto(e) => e.into(),
            SignerError::Signing(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<PresentationError> for AppError {
    fn from(err: PresentationError) -> Self {
        match err {
            PresentationError::HolderInactive { .. } => Self::Conflict(err.to_string()),
            PresentationError::MissingRequiredCredential { .. } => {
                Self::Validation(err.to_string())
            }
            PresentationError::Did(e) => e.into(),
            PresentationError::Crypto(e) => e.into(),
            PresentationError::Signing(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::NotFound(_) => Self::NotFound(err.to_string()),
            RecordError::DuplicateId(_) | RecordError::AlreadyRevoked(_) => {
                Self::Conflict(err.to_string())
            }
            RecordError::Unavailable(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<BatchError> for AppError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::Validation(_) => Self::Validation(err.to_string()),
            BatchError::Schema(e) => e.into(),
            BatchError::JobNotFound(_) => Self::NotFound(err.to_string()),
            BatchError::InvalidState { .. } => Self::Conflict(err.to_string()),
            BatchError::Store(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Validation(_) | WorkflowError::MissingRequiredCredential(_) => {
                Self::Validation(err.to_string())
            }
            WorkflowError::NotFound { .. } => Self::NotFound(err.to_string()),
            WorkflowError::PolicyExists(_)
            | WorkflowError::RequestInactive(_)
            | WorkflowError::RequestExpired(_)
            | WorkflowError::DuplicateSubmission { .. }
            | WorkflowError::AlreadyProcessed { .. } => Self::Conflict(err.to_string()),
            WorkflowError::Forbidden(msg) => Self::Forbidden(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_core::{JobId, SubmissionId};
    use attest_workflow::SubmissionStatus;
    use http_body_util::BodyExt;

    /// Helper to extract status and body from a Response.
    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[test]
    fn status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (AppError::Validation("x".into()), StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT, "CONFLICT"),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code), "{err}");
        }
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let (status, body) = response_parts(AppError::Internal("disk on fire".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.message, "An internal error occurred");
        assert!(body.error.details.is_none());
    }

    #[tokio::test]
    async fn claims_violations_are_detailed() {
        let err = SchemaError::ValidationFailed {
            schema_id: "degree".into(),
            violations: vec![Violation {
                instance_path: "/degree".into(),
                schema_path: "/properties/degree/type".into(),
                message: "42 is not of type \"string\"".into(),
            }],
        };
        let (status, body) = response_parts(err.into()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error.code, "VALIDATION_ERROR");
        let details = body.error.details.unwrap();
        assert_eq!(details["violations"][0]["instancePath"], "/degree");
    }

    #[test]
    fn batch_errors_map() {
        let id = JobId::new();
        assert!(matches!(AppError::from(BatchError::JobNotFound(id)), AppError::NotFound(_)));
        assert!(matches!(
            AppError::from(BatchError::InvalidState {
                job_id: id,
                status: attest_batch::JobStatus::Completed
            }),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(BatchError::Schema(SchemaError::NotFound("s".into()))),
            AppError::NotFound(_)
        ));
    }

    #[test]
    fn workflow_errors_map() {
        assert!(matches!(
            AppError::from(WorkflowError::AlreadyProcessed {
                submission_id: SubmissionId::new(),
                status: SubmissionStatus::Verified
            }),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(WorkflowError::Forbidden("no".into())),
            AppError::Forbidden(m) if m == "no"
        ));
    }

    #[test]
    fn signer_errors_unwrap_nested_causes() {
        let err = SignerError::Crypto(CryptoError::KeyGeneration("rng".into()));
        assert!(matches!(AppError::from(err), AppError::Internal(_)));
        let err = SignerError::Did(DidError::NotFound("did:key:z".into()));
        assert!(matches!(AppError::from(err), AppError::NotFound(_)));
    }
}
