//! Schema registration and validation errors.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single validation violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// JSON Pointer to the violating value in the claims.
    pub instance_path: String,
    /// JSON Pointer to the schema keyword that failed.
    pub schema_path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("schema not found: {0}")]
    NotFound(String),

    #[error("schema already registered: {0}")]
    AlreadyExists(String),

    /// The descriptor is incomplete (empty id or credential type).
    #[error("invalid schema descriptor: {0}")]
    InvalidDescriptor(String),

    /// The JSON Schema itself does not compile.
    #[error("schema '{schema_id}' does not compile: {reason}")]
    Compile { schema_id: String, reason: String },

    /// Claims did not conform.
    #[error("claims do not match schema '{schema_id}': {}", render(.violations))]
    ValidationFailed {
        schema_id: String,
        violations: Vec<Violation>,
    },

    /// A schema file could not be read or parsed.
    #[error("cannot load schema file {path}: {reason}")]
    Load { path: String, reason: String },
}

fn render(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
