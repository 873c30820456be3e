//! Signature, expiry and revocation checks composed.

use attest_core::Timestamp;

use crate::credential::VerifiableCredential;
use crate::outcome::VerificationOutcome;
use crate::signer::CredentialSigner;
use crate::status::StatusLedger;

/// Deep credential verification: the signature via [`CredentialSigner`],
/// then expiry against `now`, then the revocation ledger. The first
/// failing check supplies the reason.
#[derive(Debug, Clone)]
pub struct CredentialChecks {
    signer: CredentialSigner,
    ledger: StatusLedger,
}

impl CredentialChecks {
    pub fn new(signer: CredentialSigner, ledger: StatusLedger) -> Self {
        Self { signer, ledger }
    }

    pub fn check(&self, credential: &VerifiableCredential, now: Timestamp) -> VerificationOutcome {
        let outcome = self.signer.verify(credential);
        if !outcome.verified {
            return outcome;
        }
        if credential.is_expired(now) {
            return VerificationOutcome::failed(format!("credential {} has expired", credential.id));
        }
        if self.ledger.is_revoked(&credential.id) {
            return VerificationOutcome::failed(format!("credential {} has been revoked", credential.id));
        }
        VerificationOutcome::ok()
    }
}
