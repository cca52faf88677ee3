//! Error types for index rebuilds

use crate::error::AppError;
use crate::store::StoreError;

/// Errors that abort or fail a rebuild
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The index could not be created with the class mapping
    #[error("Failed to create index {index}: {source}")]
    Schema {
        index: String,
        #[source]
        source: StoreError,
    },

    /// At least one term group's bulk write failed; the others may have landed
    #[error("{failed} of {total} term groups failed to write: {source}")]
    PartialWrite {
        failed: usize,
        total: usize,
        #[source]
        source: StoreError,
    },

    /// A class document could not be serialized
    #[error("Failed to serialize class document {class_hash}: {reason}")]
    Serialization { class_hash: String, reason: String },
}

impl From<IndexError> for AppError {
    fn from(err: IndexError) -> Self {
        AppError::Indexing(err.to_string())
    }
}
