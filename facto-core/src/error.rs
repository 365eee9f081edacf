//! Error types for Facto Core

use thiserror::Error;

/// Core errors
#[derive(Error, Debug)]
pub enum FactoError {
    #[error("Canonicalization error: {0}")]
    Canonicalize(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid digest: {0}")]
    InvalidDigest(#[from] crate::types::DigestError),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Signing failed: {0}")]
    Signature(String),
}

/// Result type alias for core operations
pub type FactoResult<T> = Result<T, FactoError>;
