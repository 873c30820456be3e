//! # Credential Records
//!
//! Issued credentials are persisted with their issuer, subject, schema and
//! a content digest. [`CredentialRepository`] is the persistence seam;
//! [`CredentialStore`] is the in-memory implementation.

use attest_core::{CanonicalizationError, ContentDigest, Did, Store, Timestamp};
use serde::{Deserialize, Serialize};

use crate::credential::VerifiableCredential;
use crate::error::RecordError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub id: String,
    pub credential: VerifiableCredential,
    pub issuer: Did,
    /// `credentialSubject.id`, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,
    /// SHA-256 of the canonical credential.
    pub digest: ContentDigest,
    pub created_at: Timestamp,
}

impl CredentialRecord {
    pub fn new(
        credential: VerifiableCredential,
        schema_id: Option<String>,
    ) -> Result<Self, CanonicalizationError> {
        Ok(Self {
            id: credential.id.clone(),
            issuer: credential.issuer.clone(),
            subject: credential.subject_id().map(str::to_string),
            digest: credential.digest()?,
            schema_id,
            credential,
            created_at: Timestamp::now(),
        })
    }
}

/// Create/get persistence for issued credentials.
pub trait CredentialRepository: Send + Sync {
    /// Store a new record. Ids are unique.
    fn create(&self, record: CredentialRecord) -> Result<(), RecordError>;

    fn get(&self, id: &str) -> Option<CredentialRecord>;
}

#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    records: Store<String, CredentialRecord>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records issued by `issuer`, oldest first.
    pub fn list_by_issuer(&self, issuer: &Did) -> Vec<CredentialRecord> {
        let mut records: Vec<_> = self
            .records
            .list()
            .into_iter()
            .filter(|r| &r.issuer == issuer)
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl CredentialRepository for CredentialStore {
    fn create(&self, record: CredentialRecord) -> Result<(), RecordError> {
        let id = record.id.clone();
        if !self.records.insert_new(id.clone(), record) {
            return Err(RecordError::DuplicateId(id));
        }
        Ok(())
    }

    fn get(&self, id: &str) -> Option<CredentialRecord> {
        self.records.get(&id.to_string())
    }
}
