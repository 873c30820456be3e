//! # Keygen Subcommand
//!
//! Generates an Ed25519 seed and derives its `did:key`. Printing the seed
//! is the explicit export: the seed is the only secret and the DID can
//! always be re-derived from it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use attest_core::Did;
use attest_crypto::Ed25519KeyPair;
use attest_did::did_from_public_key;

/// Arguments for `attest keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Write `<prefix>.key` and `<prefix>.did` here instead of printing
    /// the seed.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    /// Prefix for the key filenames.
    #[arg(long, default_value = "attest")]
    pub prefix: String,
}

/// Execute `attest keygen`.
pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    match &args.output {
        Some(dir) => {
            let (did, seed_path) = generate_key_files(dir, &args.prefix)?;
            println!("OK: generated did:key identity");
            println!("  DID:  {did}");
            println!("  Seed: {}", seed_path.display());
        }
        None => {
            let (did, pair) = generate()?;
            println!("did:      {did}");
            println!("seed-hex: {}", pair.export_seed().as_str());
        }
    }
    Ok(0)
}

fn generate() -> Result<(Did, Ed25519KeyPair)> {
    let pair = Ed25519KeyPair::generate()?;
    let did = did_from_public_key(&pair.public_key())?;
    tracing::info!(did = %did, "generated key");
    Ok((did, pair))
}

/// Write `<prefix>.key` (hex seed) and `<prefix>.did` into `output_dir`.
pub fn generate_key_files(output_dir: &Path, prefix: &str) -> Result<(Did, PathBuf)> {
    std::fs::create_dir_all(output_dir).with_context(|| {
        format!(
            "failed to create output directory: {}",
            output_dir.display()
        )
    })?;

    let (did, pair) = generate()?;
    let seed = pair.export_seed();

    let seed_path = output_dir.join(format!("{prefix}.key"));
    let did_path = output_dir.join(format!("{prefix}.did"));
    std::fs::write(&seed_path, seed.as_bytes())
        .with_context(|| format!("failed to write key seed: {}", seed_path.display()))?;
    std::fs::write(&did_path, format!("{did}\n"))
        .with_context(|| format!("failed to write DID: {}", did_path.display()))?;

    Ok((did, seed_path))
}
