use super::error::SearchResult;
use crate::store::Hit;
use async_trait::async_trait;
use serde_json::Value;

/// Expands hit references into full records.
///
/// Implementations must return one record per hit, in hit order.
#[async_trait]
pub trait Hydrator: Send + Sync {
    async fn hydrate(&self, hits: &[Hit]) -> SearchResult<Vec<Value>>;
}

/// Returns each hit's stored source unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceHydrator;

#[async_trait]
impl Hydrator for SourceHydrator {
    async fn hydrate(&self, hits: &[Hit]) -> SearchResult<Vec<Value>> {
        Ok(hits.iter().map(|hit| hit.source.clone()).collect())
    }
}
