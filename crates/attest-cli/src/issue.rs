//! # Issue Subcommand
//!
//! Signs a credential as the seed's `did:key` over a JSON subject.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use attest_core::Timestamp;
use attest_vc::{IssueRequest, VerifiableCredential};

use crate::wallet::KeySource;

/// Arguments for `attest issue`.
#[derive(Args, Debug)]
pub struct IssueArgs {
    #[command(flatten)]
    pub issuer: KeySource,
    /// JSON file holding the credential subject.
    #[arg(long)]
    pub subject: PathBuf,
    /// Additional credential type. Repeatable.
    #[arg(long = "type", value_name = "TYPE")]
    pub types: Vec<String>,
    /// Expiration date (RFC 3339, UTC).
    #[arg(long)]
    pub expires: Option<String>,
    /// Explicit credential id. Defaults to a fresh `urn:uuid:`.
    #[arg(long)]
    pub id: Option<String>,
    /// Write the credential here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Execute `attest issue`.
pub fn run_issue(args: &IssueArgs) -> Result<u8> {
    let credential = issue_credential(args)?;
    crate::write_json(&credential, args.output.as_deref())?;
    Ok(0)
}

pub fn issue_credential(args: &IssueArgs) -> Result<VerifiableCredential> {
    let wallet = args.issuer.wallet()?;
    let subject: Value = crate::read_json(&args.subject)?;

    let mut request = IssueRequest::new(wallet.did().clone(), subject);
    for t in &args.types {
        request = request.with_type(t.clone());
    }
    if let Some(expires) = &args.expires {
        let at = Timestamp::parse(expires).context("invalid --expires")?;
        request = request.expires(at);
    }
    if let Some(id) = &args.id {
        request = request.with_id(id.clone());
    }

    Ok(wallet.signer().issue(request)?)
}
