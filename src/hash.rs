//! Fixed-width hash types used as routing keys throughout the core.
//!
//! Sizes match the real Reticulum wire format: a full hash is a 32-byte SHA-256 digest,
//! a truncated hash (used for destination hashes, transport ids, and table keys) is its
//! first 16 bytes.

use rand_core::CryptoRngCore;
use sha2::{Digest, Sha256};
use std::fmt;

pub const HASH_LEN: usize = 32;
pub const TRUNCATED_HASH_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FullHash([u8; HASH_LEN]);

impl FullHash {
    pub fn from_data(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut out = [0u8; HASH_LEN];
        out.copy_from_slice(&digest);
        Self(out)
    }

    /// Wrap an already-computed 32-byte digest, e.g. one read back from persisted state.
    pub const fn from_raw(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; HASH_LEN] {
        self.0
    }

    pub fn truncate(&self) -> TruncatedHash {
        let mut out = [0u8; TRUNCATED_HASH_LEN];
        out.copy_from_slice(&self.0[..TRUNCATED_HASH_LEN]);
        TruncatedHash(out)
    }
}

impl fmt::Display for FullHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A 16-byte truncated hash: destination hash, transport id, or random blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TruncatedHash([u8; TRUNCATED_HASH_LEN]);

impl TruncatedHash {
    pub const fn new(bytes: [u8; TRUNCATED_HASH_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn new_empty() -> Self {
        Self([0u8; TRUNCATED_HASH_LEN])
    }

    pub fn new_from_slice(data: &[u8]) -> Option<Self> {
        if data.len() < TRUNCATED_HASH_LEN {
            return None;
        }
        let mut out = [0u8; TRUNCATED_HASH_LEN];
        out.copy_from_slice(&data[..TRUNCATED_HASH_LEN]);
        Some(Self(out))
    }

    pub fn new_from_rand<R: CryptoRngCore>(mut rng: R) -> Self {
        let mut out = [0u8; TRUNCATED_HASH_LEN];
        rng.fill_bytes(&mut out);
        Self(out)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for TruncatedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A replay/loop guard embedded in announce payloads. Same width as a truncated hash but
/// kept as a distinct type so it can't be confused with a destination hash at a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RandomBlob([u8; TRUNCATED_HASH_LEN]);

impl RandomBlob {
    pub fn new_from_slice(data: &[u8]) -> Option<Self> {
        if data.len() < TRUNCATED_HASH_LEN {
            return None;
        }
        let mut out = [0u8; TRUNCATED_HASH_LEN];
        out.copy_from_slice(&data[..TRUNCATED_HASH_LEN]);
        Some(Self(out))
    }

    pub fn new_from_rand<R: CryptoRngCore>(mut rng: R) -> Self {
        let mut out = [0u8; TRUNCATED_HASH_LEN];
        rng.fill_bytes(&mut out);
        Self(out)
    }
}
