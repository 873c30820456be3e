//! # Multibase / Multicodec Encoding
//!
//! `did:key` identifiers and `publicKeyMultibase` values are
//! `z` + base58btc(`0xed 0x01` ‖ 32-byte Ed25519 public key). Every such
//! string starts with `z6Mk`.
//!
//! Signatures in proofs use the same `z` + base58btc form without a
//! multicodec header.

use bs58::Alphabet;

use crate::error::CryptoError;

/// Multicodec varint header for `ed25519-pub`.
pub const ED25519_PUB_MULTICODEC: [u8; 2] = [0xed, 0x01];

/// Multibase prefix for base58btc.
pub const BASE58BTC_PREFIX: char = 'z';

/// Encode raw bytes as `z<base58btc>`.
pub fn encode_base58btc(bytes: &[u8]) -> String {
    let body = bs58::encode(bytes)
        .with_alphabet(Alphabet::BITCOIN)
        .into_string();
    format!("{BASE58BTC_PREFIX}{body}")
}

/// Decode a `z<base58btc>` string to raw bytes.
pub fn decode_base58btc(s: &str) -> Result<Vec<u8>, String> {
    let body = s
        .strip_prefix(BASE58BTC_PREFIX)
        .ok_or_else(|| format!("unsupported multibase prefix in {s:?}, expected 'z'"))?;
    bs58::decode(body)
        .with_alphabet(Alphabet::BITCOIN)
        .into_vec()
        .map_err(|e| format!("invalid base58btc: {e}"))
}

/// Encode an Ed25519 public key with its multicodec header.
pub fn encode_ed25519_public_key(key: &[u8; 32]) -> String {
    let mut bytes = [0u8; 34];
    bytes[..2].copy_from_slice(&ED25519_PUB_MULTICODEC);
    bytes[2..].copy_from_slice(key);
    encode_base58btc(&bytes)
}

/// Decode a multibase, multicodec-prefixed Ed25519 public key.
pub fn decode_ed25519_public_key(s: &str) -> Result<[u8; 32], CryptoError> {
    let bytes = decode_base58btc(s).map_err(CryptoError::InvalidKey)?;
    if bytes.len() != 34 {
        return Err(CryptoError::InvalidKey(format!(
            "expected 34 bytes (multicodec + key), got {}",
            bytes.len()
        )));
    }
    if bytes[..2] != ED25519_PUB_MULTICODEC {
        return Err(CryptoError::InvalidKey(format!(
            "unsupported multicodec 0x{:02x}{:02x}, expected ed25519-pub",
            bytes[0], bytes[1]
        )));
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(&bytes[2..]);
    Ok(key)
}
