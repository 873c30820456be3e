//! # Error Types
//!
//! Errors raised by the foundational types. Higher layers wrap these in
//! their own `thiserror` enums.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Validation failure for a domain primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The string is not a syntactically valid DID.
    #[error("invalid DID format: \"{0}\" (expected did:<method>:<identifier>)")]
    InvalidDid(String),

    /// A timestamp string could not be parsed.
    #[error("invalid timestamp \"{value}\": {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// A UUID-backed identifier could not be parsed.
    #[error("invalid {kind} identifier: \"{value}\"")]
    InvalidIdentifier {
        /// Which identifier namespace was being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}
