//! # Verification Policies
//!
//! Pure configuration read by the workflow. `autoApprove` and
//! `requireManualReview` are independent flags; manual review wins when
//! both are set.

use std::collections::BTreeSet;

use attest_core::Timestamp;
use attest_vc::VerifiableCredential;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WorkflowError;

/// Upper bound on `validityPeriodDays` (one hundred years).
pub const MAX_VALIDITY_PERIOD_DAYS: u32 = 36_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationPolicy {
    /// Unique key.
    pub name: String,
    /// Principal that created the policy. Set by the workflow on create;
    /// only this principal may update it.
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub description: String,
    /// Credential types the policy governs. Empty means every type.
    #[serde(default)]
    pub credential_types: BTreeSet<String>,
    /// Subject attributes that must be present for auto-approval. Dotted
    /// names (`address.city`) address nested objects.
    #[serde(default)]
    pub required_attributes: BTreeSet<String>,
    /// Credentials must have been issued within this many days.
    pub validity_period_days: u32,
    #[serde(default)]
    pub auto_approve: bool,
    #[serde(default)]
    pub require_manual_review: bool,
    #[serde(default = "default_status")]
    pub status: PolicyStatus,
    #[serde(default = "Timestamp::now")]
    pub created_at: Timestamp,
    #[serde(default = "Timestamp::now")]
    pub updated_at: Timestamp,
}

fn default_status() -> PolicyStatus {
    PolicyStatus::Active
}

fn validate_validity_period(days: u32) -> Result<(), WorkflowError> {
    if days == 0 || days > MAX_VALIDITY_PERIOD_DAYS {
        return Err(WorkflowError::Validation(format!(
            "validityPeriodDays must be between 1 and {MAX_VALIDITY_PERIOD_DAYS}"
        )));
    }
    Ok(())
}

/// Replacement values for a policy's mutable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyUpdate {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub credential_types: BTreeSet<String>,
    #[serde(default)]
    pub required_attributes: BTreeSet<String>,
    pub validity_period_days: u32,
    #[serde(default)]
    pub auto_approve: bool,
    #[serde(default)]
    pub require_manual_review: bool,
    #[serde(default = "default_status")]
    pub status: PolicyStatus,
}

impl PolicyUpdate {
    pub fn validate(&self) -> Result<(), WorkflowError> {
        validate_validity_period(self.validity_period_days)
    }
}

impl VerificationPolicy {
    pub fn new(name: impl Into<String>, validity_period_days: u32) -> Self {
        let now = Timestamp::now();
        Self {
            name: name.into(),
            owner: String::new(),
            description: String::new(),
            credential_types: BTreeSet::new(),
            required_attributes: BTreeSet::new(),
            validity_period_days,
            auto_approve: false,
            require_manual_review: false,
            status: PolicyStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.name.trim().is_empty() {
            return Err(WorkflowError::Validation("policy name must not be empty".into()));
        }
        validate_validity_period(self.validity_period_days)
    }

    pub fn is_active(&self) -> bool {
        self.status == PolicyStatus::Active
    }

    /// Whether the system may decide without a human.
    pub fn allows_auto_approval(&self) -> bool {
        self.is_active() && self.auto_approve && !self.require_manual_review
    }

    pub(crate) fn apply(&mut self, update: PolicyUpdate) {
        self.description = update.description;
        self.credential_types = update.credential_types;
        self.required_attributes = update.required_attributes;
        self.validity_period_days = update.validity_period_days;
        self.auto_approve = update.auto_approve;
        self.require_manual_review = update.require_manual_review;
        self.status = update.status;
        self.updated_at = Timestamp::now();
    }

    /// Whether the policy governs `credential`.
    pub fn covers(&self, credential: &VerifiableCredential) -> bool {
        self.credential_types.is_empty()
            || credential.types.iter().any(|t| self.credential_types.contains(t))
    }

    /// Whether `credential` was issued within the validity period.
    pub fn within_validity_period(&self, credential: &VerifiableCredential, now: Timestamp) -> bool {
        credential
            .issuance_date
            .checked_plus_days(i64::from(self.validity_period_days))
            .map_or(true, |end| end > now)
    }

    /// Required attributes not present in any covered credential's subject.
    pub fn missing_attributes<'a>(
        &'a self,
        credentials: &[&VerifiableCredential],
    ) -> Vec<&'a str> {
        self.required_attributes
            .iter()
            .filter(|attr| {
                !credentials
                    .iter()
                    .any(|c| self.covers(c) && has_attribute(&c.credential_subject, attr))
            })
            .map(String::as_str)
            .collect()
    }
}

fn has_attribute(subject: &Value, path: &str) -> bool {
    let mut cursor = subject;
    for segment in path.split('.') {
        match cursor.get(segment) {
            Some(next) => cursor = next,
            None => return false,
        }
    }
    !cursor.is_null()
}
