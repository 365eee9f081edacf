//! Fixed-size digests
//!
//! Facto uses 32-byte digests throughout: SHA3-256 for event hashes and
//! SHA-256 for Merkle nodes and session digests. On the wire both appear as
//! 64-character lowercase hex strings, which is also how `EventDigest`
//! serializes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};
use sha3::Sha3_256;
use std::fmt;
use thiserror::Error;

/// Error type for digest operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// Digest has wrong length
    #[error("Invalid digest length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Invalid hex string
    #[error("Invalid hex string: {0}")]
    InvalidHex(String),
}

impl From<hex::FromHexError> for DigestError {
    fn from(err: hex::FromHexError) -> Self {
        DigestError::InvalidHex(err.to_string())
    }
}

/// 32-byte fixed-size digest
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventDigest(pub [u8; 32]);

impl EventDigest {
    /// Create a new digest from bytes
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a digest from a 64-character hex string
    pub fn from_hex(s: &str) -> Result<Self, DigestError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(DigestError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Convert to a lowercase hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The all-zero digest, used as the chain genesis marker
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Check if this is the zero digest
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Compute the SHA3-256 digest of `data`
    pub fn sha3_256(data: &[u8]) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Compute the SHA-256 digest of `data`
    pub fn sha256(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Combine two digests into a Merkle parent: SHA-256(left || right)
    pub fn combine(left: &Self, right: &Self) -> Self {
        let mut combined = [0u8; 64];
        combined[..32].copy_from_slice(&left.0);
        combined[32..].copy_from_slice(&right.0);
        Self::sha256(&combined)
    }
}

impl fmt::Debug for EventDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventDigest({}...)", &self.to_hex()[..16])
    }
}

impl fmt::Display for EventDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Default for EventDigest {
    fn default() -> Self {
        Self::zero()
    }
}

impl Serialize for EventDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EventDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        EventDigest::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
