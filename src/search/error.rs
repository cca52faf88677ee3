//! Error types for search operations

use crate::error::AppError;
use crate::store::StoreError;

/// Result type for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that fail a search request
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The store call failed or the store was unreachable
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The pagination window ends before it starts
    #[error("Invalid result window: min {min} is greater than max {max}")]
    InvalidWindow { min: usize, max: usize },

    /// The store answered fewer queries than were sent
    #[error("Multi-query returned {received} responses for {expected} queries")]
    BatchIncomplete { expected: usize, received: usize },

    /// One query of the batch failed
    #[error("Query {position} of the batch failed: {reason}")]
    SubQueryFailed { position: usize, reason: String },

    /// A facet query came back without its aggregation
    #[error("Facet response for {facet} has no aggregation")]
    MissingAggregation { facet: String },

    /// Hits could not be expanded into full records
    #[error("Hydration failed: {0}")]
    Hydration(String),
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidWindow { .. } => AppError::Validation(err.to_string()),
            SearchError::Store(e) => AppError::Store(e.to_string()),
            _ => AppError::Search(err.to_string()),
        }
    }
}
