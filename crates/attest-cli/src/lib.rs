//! # attest-cli: CLI Tool for the Attest Stack
//!
//! Provides the `attest` command-line interface for working with
//! `did:key` identities without a running service.
//!
//! ## Subcommands
//!
//! - `attest keygen`: Generate a key seed and its `did:key`.
//! - `attest issue`: Sign a credential over a subject file.
//! - `attest present`: Wrap credentials in a signed presentation.
//! - `attest verify`: Verify a credential or presentation file.
//!
//! ```bash
//! attest keygen
//! attest issue --seed-hex <hex> --subject alice.json --type UniversityDegreeCredential > degree.json
//! attest present --key keys/alice.key --credential degree.json --challenge 4f1e
//! attest verify degree.json
//! ```
//!
//! Revocation is tracked by the API service, so offline verification
//! covers proofs and expiry only.

pub mod issue;
pub mod keys;
pub mod present;
pub mod verify;
pub mod wallet;

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Read and parse a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// Pretty-print `value` to `output`, or to stdout when `None`.
pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    match output {
        Some(path) => std::fs::write(path, format!("{rendered}\n"))
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}
