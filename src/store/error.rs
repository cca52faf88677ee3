//! Error types for document store operations

use crate::error::AppError;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by a [`DocumentStore`](super::DocumentStore) backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered with a non-success status
    #[error("Store returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The store's answer could not be decoded
    #[error("Failed to decode store response: {0}")]
    Decode(String),

    /// Some documents in a bulk request were rejected
    #[error("Bulk write to {index} rejected {failed} of {total} documents")]
    BulkRejected {
        index: String,
        failed: usize,
        total: usize,
    },

    /// The target index does not exist
    #[error("Index not found: {0}")]
    MissingIndex(String),

    /// The index to create already exists
    #[error("Index already exists: {0}")]
    IndexExists(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err.to_string())
    }
}
