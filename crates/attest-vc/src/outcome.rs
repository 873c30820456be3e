//! The result of a verification predicate.

use serde::{Deserialize, Serialize};

/// Definitive verification result. `reason` is set whenever `verified` is
/// false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl VerificationOutcome {
    pub fn ok() -> Self {
        Self {
            verified: true,
            reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            verified: false,
            reason: Some(reason.into()),
        }
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }
}
