//! # Revocation Status Ledger
//!
//! Revocation is a record keyed by credential id. The credential body is
//! never touched, so signatures over revoked credentials still verify and
//! callers consult the ledger separately.

use attest_core::{Store, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// Status of one credential id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatus {
    pub credential_id: String,
    pub revoked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Default)]
pub struct StatusLedger {
    revoked: Store<String, CredentialStatus>,
}

impl StatusLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke `credential_id`. A credential can be revoked once; the first
    /// reason is kept.
    pub fn revoke(
        &self,
        credential_id: &str,
        reason: Option<String>,
    ) -> Result<CredentialStatus, RecordError> {
        let status = CredentialStatus {
            credential_id: credential_id.to_string(),
            revoked: true,
            reason,
            revoked_at: Some(Timestamp::now()),
        };
        if !self.revoked.insert_new(credential_id.to_string(), status.clone()) {
            return Err(RecordError::AlreadyRevoked(credential_id.to_string()));
        }
        tracing::info!(credential_id, "credential revoked");
        Ok(status)
    }

    /// Current status. Unknown ids are reported as not revoked.
    pub fn status(&self, credential_id: &str) -> CredentialStatus {
        self.revoked
            .get(&credential_id.to_string())
            .unwrap_or_else(|| CredentialStatus {
                credential_id: credential_id.to_string(),
                revoked: false,
                reason: None,
                revoked_at: None,
            })
    }

    pub fn is_revoked(&self, credential_id: &str) -> bool {
        self.revoked.contains(&credential_id.to_string())
    }
}
