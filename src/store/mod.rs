//! Document store capability.
//!
//! The indexing and search pipelines never talk to Elasticsearch directly;
//! they go through [`DocumentStore`]. [`ElasticStore`] speaks the HTTP API,
//! [`InMemoryStore`] keeps everything in process for tests and dry runs.

mod elastic;
mod error;
mod memory;

pub use elastic::ElasticStore;
pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryStore, RecordedMultiQuery};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// One create-or-overwrite action in a bulk request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkOperation {
    /// Document id the action is addressed to
    pub id: String,

    /// Document body
    pub document: Value,
}

impl BulkOperation {
    pub fn new(id: impl Into<String>, document: Value) -> Self {
        Self {
            id: id.into(),
            document,
        }
    }
}

/// Whether a total hit count is exact or a lower bound
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalRelation {
    #[default]
    Eq,
    Gte,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalHits {
    pub value: u64,

    #[serde(default)]
    pub relation: TotalRelation,
}

/// A single ranked hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    #[serde(rename = "_index")]
    pub index: String,

    #[serde(rename = "_id")]
    pub id: String,

    /// Relevance score; absent when the store did not score the hit
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,

    #[serde(rename = "_source", default)]
    pub source: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hits {
    #[serde(default)]
    pub total: TotalHits,

    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// One bucket of a terms aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub key: Value,
    pub doc_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermsAggregation {
    #[serde(default)]
    pub buckets: Vec<Bucket>,
}

/// Answer to one query of a multi-query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Elapsed time in milliseconds
    #[serde(default)]
    pub took: u64,

    #[serde(default)]
    pub hits: Hits,

    #[serde(default)]
    pub aggregations: BTreeMap<String, TermsAggregation>,

    /// Set when this sub-query failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

/// Operations the indexing and search pipelines need from the store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create or overwrite every document in `operations`; returns the number written
    async fn bulk_write(&self, index: &str, operations: Vec<BulkOperation>) -> StoreResult<usize>;

    /// Delete an index; an absent index is not an error
    async fn delete_index(&self, index: &str) -> StoreResult<()>;

    /// Create an index with the given mapping
    async fn create_index(&self, index: &str, mapping: &Value) -> StoreResult<()>;

    /// Run several queries in one round trip.
    ///
    /// The response list is positional: entry `i` answers `queries[i]`.
    async fn multi_query(
        &self,
        indices: &[String],
        queries: Vec<Value>,
    ) -> StoreResult<Vec<QueryResponse>>;

    /// Every distinct value of a keyword field in the class index
    async fn distinct_values(&self, field: &str) -> StoreResult<HashSet<String>>;
}

/// Render a bucket key or other scalar as the string shown to users
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
