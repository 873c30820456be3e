//! # Present Subcommand
//!
//! Wraps credential files in a presentation signed by the seed's
//! `did:key`, optionally bound to a verifier's challenge and domain.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use attest_vc::{VerifiableCredential, VerifiablePresentation};

use crate::wallet::KeySource;

/// Arguments for `attest present`.
#[derive(Args, Debug)]
pub struct PresentArgs {
    #[command(flatten)]
    pub holder: KeySource,
    /// Credential file to include. Repeatable.
    #[arg(long = "credential", value_name = "FILE", required = true)]
    pub credentials: Vec<PathBuf>,
    /// Verifier-supplied challenge.
    #[arg(long)]
    pub challenge: Option<String>,
    #[arg(long)]
    pub domain: Option<String>,
    /// Write the presentation here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Execute `attest present`.
pub fn run_present(args: &PresentArgs) -> Result<u8> {
    let presentation = create_presentation(args)?;
    crate::write_json(&presentation, args.output.as_deref())?;
    Ok(0)
}

pub fn create_presentation(args: &PresentArgs) -> Result<VerifiablePresentation> {
    if args.credentials.is_empty() {
        bail!("at least one --credential is required");
    }
    let wallet = args.holder.wallet()?;
    let credentials = args
        .credentials
        .iter()
        .map(|path| crate::read_json::<VerifiableCredential>(path))
        .collect::<Result<Vec<_>>>()?;

    Ok(wallet.presentations().present(
        wallet.did(),
        credentials,
        args.challenge.clone(),
        args.domain.clone(),
    )?)
}
