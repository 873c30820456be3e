//! # Verify Subcommand
//!
//! Verifies a credential or presentation file against `did:key`
//! resolution. The document kind is detected from its `type` array.
//! Exit code 0 means verified, 1 means verification failed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use attest_core::Timestamp;
use attest_vc::{VerifiableCredential, VerifiablePresentation, VerificationOutcome};

use crate::wallet::offline_verifiers;

const PRESENTATION_TYPE: &str = "VerifiablePresentation";

/// Arguments for `attest verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Credential or presentation JSON file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
    /// Challenge the presentation proof must carry.
    #[arg(long)]
    pub challenge: Option<String>,
    /// Domain the presentation proof must carry.
    #[arg(long)]
    pub domain: Option<String>,
}

/// Execute `attest verify`.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let outcome = verify_file(args)?;
    if outcome.verified {
        println!("OK: {} verified", args.file.display());
        Ok(0)
    } else {
        println!(
            "FAIL: {}: {}",
            args.file.display(),
            outcome.reason.as_deref().unwrap_or("verification failed")
        );
        Ok(1)
    }
}

pub fn verify_file(args: &VerifyArgs) -> Result<VerificationOutcome> {
    let document: Value = crate::read_json(&args.file)?;
    let now = Timestamp::now();
    if is_presentation(&document) {
        let presentation: VerifiablePresentation =
            serde_json::from_value(document).context("malformed presentation")?;
        Ok(verify_presentation(
            &presentation,
            args.challenge.as_deref(),
            args.domain.as_deref(),
            now,
        ))
    } else {
        let credential: VerifiableCredential =
            serde_json::from_value(document).context("malformed credential")?;
        Ok(verify_credential(&credential, now))
    }
}

fn is_presentation(document: &Value) -> bool {
    match document.get("type") {
        Some(Value::Array(types)) => types.iter().any(|t| t == PRESENTATION_TYPE),
        Some(Value::String(t)) => t == PRESENTATION_TYPE,
        _ => false,
    }
}

pub fn verify_credential(credential: &VerifiableCredential, now: Timestamp) -> VerificationOutcome {
    let (signer, _) = offline_verifiers();
    let outcome = signer.verify(credential);
    if !outcome.verified {
        return outcome;
    }
    if credential.is_expired(now) {
        return VerificationOutcome::failed(format!("credential {} has expired", credential.id));
    }
    outcome
}

pub fn verify_presentation(
    presentation: &VerifiablePresentation,
    challenge: Option<&str>,
    domain: Option<&str>,
    now: Timestamp,
) -> VerificationOutcome {
    let (_, presentations) = offline_verifiers();
    let outcome = presentations.verify(presentation, challenge, domain);
    if !outcome.verified {
        return outcome;
    }
    for credential in &presentation.verifiable_credential {
        let outcome = verify_credential(credential, now);
        if !outcome.verified {
            let reason = outcome.reason.unwrap_or_default();
            return VerificationOutcome::failed(format!("credential {}: {reason}", credential.id));
        }
    }
    VerificationOutcome::ok()
}
