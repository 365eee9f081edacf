//! Storage error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connect error: {0}")]
    Connect(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Row decode error: {0}")]
    Decode(String),

    #[error("Invalid cursor")]
    InvalidCursor,

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
