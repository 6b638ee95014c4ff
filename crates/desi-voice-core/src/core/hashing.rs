// crates/desi-voice-core/src/core/hashing.rs
// ============================================================================
// Module: Canonical Hashing
// Description: RFC 8785 JSON canonicalization and replay hashing.
// Purpose: Provide the deterministic replay digest for decision traces.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Replay hashes are computed over RFC 8785 (JCS) canonical JSON so that two
//! independent implementations agree bit-for-bit on the bytes of the same
//! logical trace. Canonical JSON uses sorted keys, no whitespace, UTF-8, and
//! integer-preserving number forms; non-finite floats are rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when computing canonical bytes or replay hashes.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Replay Hash
// ============================================================================

/// Stable replay digest in the `sha256:` + lowercase hex wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplayHash(String);

/// Wire prefix for replay hashes.
pub const REPLAY_HASH_PREFIX: &str = "sha256:";

impl ReplayHash {
    /// Creates a replay hash from raw digest bytes.
    #[must_use]
    pub fn from_digest_bytes(bytes: &[u8]) -> Self {
        Self(format!("{REPLAY_HASH_PREFIX}{}", hex_encode(bytes)))
    }

    /// Returns the hash in its wire form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReplayHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Canonicalization Helpers
// ============================================================================

/// Returns canonical JSON bytes for a serializable value using RFC 8785.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Returns canonical JSON as a string using RFC 8785.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonical_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String, HashError> {
    serde_jcs::to_string(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Hashes the canonical JSON form of a value into a replay hash.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn replay_hash<T: Serialize + ?Sized>(value: &T) -> Result<ReplayHash, HashError> {
    let bytes = canonical_json_bytes(value)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hasher.finalize();
    Ok(ReplayHash::from_digest_bytes(&digest))
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let hi = usize::from(byte >> 4);
        let lo = usize::from(byte & 0x0f);
        out.push(char::from(HEX[hi]));
        out.push(char::from(HEX[lo]));
    }
    out
}
