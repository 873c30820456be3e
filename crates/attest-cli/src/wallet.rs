//! # Local Wallet
//!
//! A single `did:key` identity backed by an in-memory key store. DIDs are
//! resolved by decoding `did:key` identifiers, so no registry is needed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;

use attest_core::Did;
use attest_crypto::{Ed25519KeyPair, KeyPurpose, KeyStore, MemoryKeyStore, StoredKey};
use attest_did::did_key::{did_from_public_key, synthesize_document};
use attest_did::{DidKeyResolver, DidResolver};
use attest_vc::{CredentialSigner, PresentationEngine};

#[derive(Debug)]
pub struct LocalWallet {
    did: Did,
    signer: CredentialSigner,
    presentations: PresentationEngine,
}

impl LocalWallet {
    /// Wallet for the identity derived from `pair`.
    pub fn from_key_pair(pair: Ed25519KeyPair) -> Result<Self> {
        let did = did_from_public_key(&pair.public_key())?;
        let document = synthesize_document(&did)?;
        let key_id = document
            .verification_method
            .first()
            .map(|vm| vm.id.clone())
            .context("did:key document has no verification method")?;

        let keys: Arc<dyn KeyStore> = Arc::new(MemoryKeyStore::new());
        keys.persist(
            &did,
            StoredKey::from_key_pair(key_id, did.clone(), pair, KeyPurpose::ALL),
        )?;
        let resolver: Arc<dyn DidResolver> = Arc::new(DidKeyResolver);

        Ok(Self {
            did,
            signer: CredentialSigner::new(Arc::clone(&keys), Arc::clone(&resolver)),
            presentations: PresentationEngine::new(keys, resolver),
        })
    }

    pub fn from_seed_hex(seed_hex: &str) -> Result<Self> {
        let pair = Ed25519KeyPair::from_seed_hex(seed_hex).context("invalid key seed")?;
        Self::from_key_pair(pair)
    }

    /// Wallet for the seed stored hex-encoded in `path`.
    pub fn from_key_file(path: &Path) -> Result<Self> {
        let seed = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read key file: {}", path.display()))?;
        Self::from_seed_hex(seed.trim())
            .with_context(|| format!("key file {} is not a valid seed", path.display()))
    }

    pub fn did(&self) -> &Did {
        &self.did
    }

    pub fn signer(&self) -> &CredentialSigner {
        &self.signer
    }

    pub fn presentations(&self) -> &PresentationEngine {
        &self.presentations
    }
}

/// Where a signing command takes its key seed from.
#[derive(Args, Debug, Clone, Default)]
pub struct KeySource {
    /// Hex-encoded 32-byte key seed, as printed by `attest keygen`.
    #[arg(long, value_name = "HEX", conflicts_with = "key")]
    pub seed_hex: Option<String>,
    /// File holding the hex-encoded seed.
    #[arg(long, value_name = "FILE")]
    pub key: Option<PathBuf>,
}

impl KeySource {
    pub fn from_seed_hex(seed_hex: impl Into<String>) -> Self {
        Self {
            seed_hex: Some(seed_hex.into()),
            key: None,
        }
    }

    pub fn from_key_file(path: impl Into<PathBuf>) -> Self {
        Self {
            seed_hex: None,
            key: Some(path.into()),
        }
    }

    pub fn wallet(&self) -> Result<LocalWallet> {
        match (&self.seed_hex, &self.key) {
            (Some(seed), _) => LocalWallet::from_seed_hex(seed),
            (None, Some(path)) => LocalWallet::from_key_file(path),
            (None, None) => bail!("either --seed-hex or --key is required"),
        }
    }
}

/// Signer and presentation engine that verify against `did:key` only.
pub fn offline_verifiers() -> (CredentialSigner, PresentationEngine) {
    let keys: Arc<dyn KeyStore> = Arc::new(MemoryKeyStore::new());
    let resolver: Arc<dyn DidResolver> = Arc::new(DidKeyResolver);
    (
        CredentialSigner::new(Arc::clone(&keys), Arc::clone(&resolver)),
        PresentationEngine::new(keys, resolver),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    #[test]
    fn same_seed_same_did() {
        let a = LocalWallet::from_seed_hex(SEED).unwrap();
        let b = LocalWallet::from_seed_hex(SEED).unwrap();
        assert_eq!(a.did(), b.did());
        assert!(a.did().as_str().starts_with("did:key:z6Mk"));
    }

    #[test]
    fn short_seed_is_rejected() {
        let err = LocalWallet::from_seed_hex("abcd").unwrap_err();
        assert!(format!("{err:#}").contains("invalid key seed"));
    }

    #[test]
    fn key_source_requires_a_seed() {
        let err = KeySource::default().wallet().unwrap_err();
        assert!(err.to_string().contains("--seed-hex"));
        let wallet = KeySource::from_seed_hex(SEED).wallet().unwrap();
        assert_eq!(wallet.did(), LocalWallet::from_seed_hex(SEED).unwrap().did());
    }

    #[test]
    fn key_file_whitespace_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("k.key");
        std::fs::write(&path, format!("{SEED}\n")).unwrap();
        let wallet = LocalWallet::from_key_file(&path).unwrap();
        assert_eq!(wallet.did(), LocalWallet::from_seed_hex(SEED).unwrap().did());
    }
}
