use super::error::{StoreError, StoreResult};
use super::{BulkOperation, DocumentStore, QueryResponse, TermsAggregation};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct MemoryIndex {
    mapping: Value,
    documents: BTreeMap<String, Value>,
}

/// A multi-query as the store received it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedMultiQuery {
    pub indices: Vec<String>,
    pub queries: Vec<Value>,
}

/// In-process document store.
///
/// Keeps created indices and written documents, records every multi-query,
/// and answers multi-queries from scripted responses (or empty results when
/// nothing is scripted). It never evaluates query clauses.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    indices: Arc<DashMap<String, MemoryIndex>>,
    distinct: Arc<DashMap<String, HashSet<String>>>,
    distinct_calls: Arc<AtomicUsize>,
    scripted: Arc<Mutex<VecDeque<Vec<QueryResponse>>>>,
    multi_queries: Arc<Mutex<Vec<RecordedMultiQuery>>>,
    events: Arc<Mutex<Vec<String>>>,
    rejected_prefixes: Arc<Mutex<Vec<String>>>,
    reject_create: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values returned by `distinct_values(field)`
    pub fn set_distinct_values<I, S>(&self, field: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.distinct
            .insert(field.to_string(), values.into_iter().map(Into::into).collect());
    }

    /// Queue the answer for the next multi-query
    pub fn push_multi_query_response(&self, responses: Vec<QueryResponse>) {
        self.scripted.lock().push_back(responses);
    }

    /// Reject bulk documents whose id starts with `prefix`
    pub fn reject_bulk_ids_with_prefix(&self, prefix: impl Into<String>) {
        self.rejected_prefixes.lock().push(prefix.into());
    }

    /// Make every subsequent `create_index` fail
    pub fn reject_index_creation(&self) {
        self.reject_create.store(true, Ordering::SeqCst);
    }

    pub fn index_exists(&self, index: &str) -> bool {
        self.indices.contains_key(index)
    }

    pub fn mapping(&self, index: &str) -> Option<Value> {
        self.indices.get(index).map(|entry| entry.mapping.clone())
    }

    /// Documents currently stored in `index`, keyed by id
    pub fn documents(&self, index: &str) -> BTreeMap<String, Value> {
        self.indices
            .get(index)
            .map(|entry| entry.documents.clone())
            .unwrap_or_default()
    }

    /// Seed a document directly, bypassing bulk writes
    pub fn insert_document(&self, index: &str, id: impl Into<String>, document: Value) {
        self.indices
            .entry(index.to_string())
            .or_default()
            .documents
            .insert(id.into(), document);
    }

    pub fn multi_queries(&self) -> Vec<RecordedMultiQuery> {
        self.multi_queries.lock().clone()
    }

    pub fn distinct_calls(&self) -> usize {
        self.distinct_calls.load(Ordering::SeqCst)
    }

    /// Lifecycle calls in arrival order, e.g. `delete:classes`
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn record(&self, event: String) {
        self.events.lock().push(event);
    }

    fn is_rejected(&self, id: &str) -> bool {
        self.rejected_prefixes
            .lock()
            .iter()
            .any(|prefix| id.starts_with(prefix.as_str()))
    }

    /// Empty answer shaped like the query: no hits, empty buckets per aggregation
    fn empty_response(query: &Value) -> QueryResponse {
        let aggregations = query
            .get("aggregations")
            .and_then(Value::as_object)
            .map(|aggs| {
                aggs.keys()
                    .map(|name| (name.clone(), TermsAggregation::default()))
                    .collect()
            })
            .unwrap_or_default();

        QueryResponse {
            aggregations,
            ..Default::default()
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn bulk_write(&self, index: &str, operations: Vec<BulkOperation>) -> StoreResult<usize> {
        let total = operations.len();
        self.record(format!("bulk:{}:{}", index, total));

        let mut entry = self
            .indices
            .get_mut(index)
            .ok_or_else(|| StoreError::MissingIndex(index.to_string()))?;

        let mut failed = 0;
        for op in operations {
            if self.is_rejected(&op.id) {
                failed += 1;
                continue;
            }
            entry.documents.insert(op.id, op.document);
        }

        if failed > 0 {
            return Err(StoreError::BulkRejected {
                index: index.to_string(),
                failed,
                total,
            });
        }

        Ok(total)
    }

    async fn delete_index(&self, index: &str) -> StoreResult<()> {
        self.record(format!("delete:{}", index));
        self.indices.remove(index);
        Ok(())
    }

    async fn create_index(&self, index: &str, mapping: &Value) -> StoreResult<()> {
        self.record(format!("create:{}", index));

        if self.reject_create.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: 400,
                body: format!("mapping rejected for {}", index),
            });
        }

        if self.indices.contains_key(index) {
            return Err(StoreError::IndexExists(index.to_string()));
        }

        self.indices.insert(
            index.to_string(),
            MemoryIndex {
                mapping: mapping.clone(),
                documents: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn multi_query(
        &self,
        indices: &[String],
        queries: Vec<Value>,
    ) -> StoreResult<Vec<QueryResponse>> {
        self.multi_queries.lock().push(RecordedMultiQuery {
            indices: indices.to_vec(),
            queries: queries.clone(),
        });

        if let Some(responses) = self.scripted.lock().pop_front() {
            return Ok(responses);
        }

        Ok(queries.iter().map(Self::empty_response).collect())
    }

    async fn distinct_values(&self, field: &str) -> StoreResult<HashSet<String>> {
        self.distinct_calls.fetch_add(1, Ordering::SeqCst);
        // Give concurrent callers a chance to interleave
        tokio::task::yield_now().await;

        Ok(self
            .distinct
            .get(field)
            .map(|values| values.value().clone())
            .unwrap_or_default())
    }
}
