//! Main search service implementation

use super::error::{SearchError, SearchResult};
use super::hydrate::Hydrator;
use super::query::{validate_filters, QueryCompiler, Window};
use super::results::{parse_results, FacetBucket, ParsedResults};
use crate::config::StoreConfig;
use crate::metrics::{SEARCH_DURATION_SECONDS, SEARCH_REQUESTS_TOTAL};
use crate::store::DocumentStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

/// Search response handed to the API layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutput {
    /// Hydrated records, in rank order
    pub hits: Vec<Value>,

    /// Total matches before pagination
    pub result_count: u64,

    /// Store time for the primary query in milliseconds
    pub took: u64,

    /// Facet buckets keyed by filter name
    pub facets: BTreeMap<String, Vec<FacetBucket>>,
}

/// Class and employee search over a document store
pub struct SearchService {
    store: Arc<dyn DocumentStore>,
    hydrator: Arc<dyn Hydrator>,

    /// Lowercase subject codes, populated on first search
    subjects: OnceCell<HashSet<String>>,

    /// Indices every search runs against
    indices: Vec<String>,
    subject_field: String,
}

impl SearchService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        hydrator: Arc<dyn Hydrator>,
        config: &StoreConfig,
    ) -> Self {
        Self {
            store,
            hydrator,
            subjects: OnceCell::new(),
            indices: vec![config.class_index.clone(), config.employee_index.clone()],
            subject_field: config.subject_field.clone(),
        }
    }

    /// Known subject codes, loaded once per service.
    ///
    /// Concurrent first calls share one store query. If that query fails the
    /// cache stays empty and the next call tries again.
    pub async fn subjects(&self) -> SearchResult<&HashSet<String>> {
        self.subjects
            .get_or_try_init(|| async {
                let values = self.store.distinct_values(&self.subject_field).await?;
                let subjects: HashSet<String> =
                    values.into_iter().map(|s| s.to_lowercase()).collect();
                info!(
                    field = %self.subject_field,
                    subjects = subjects.len(),
                    "Loaded known subjects"
                );
                Ok::<_, SearchError>(subjects)
            })
            .await
    }

    /// Run the primary query and every facet query in one round trip
    pub async fn get_search_results(
        &self,
        query: &str,
        term_id: &str,
        window: Window,
        filters: &Map<String, Value>,
    ) -> SearchResult<ParsedResults> {
        let subjects = self.subjects().await?;
        let valid = validate_filters(filters);
        let batch = QueryCompiler::new(subjects).compile(query, term_id, window, &valid);

        debug!(
            query = %query,
            term_id = %term_id,
            filters = valid.len(),
            queries = batch.queries.len(),
            "Sending search batch"
        );

        let responses = self.store.multi_query(&self.indices, batch.queries).await?;
        parse_results(responses, &batch.facets)
    }

    /// Search classes and employees for `query` within one term.
    ///
    /// Invalid filter entries are dropped, not reported. Returns hits
    /// `[min, max)` of the ranked results.
    pub async fn search(
        &self,
        query: &str,
        term_id: &str,
        min: usize,
        max: usize,
        filters: &Map<String, Value>,
    ) -> SearchResult<SearchOutput> {
        let timer = SEARCH_DURATION_SECONDS.start_timer();
        let result = self.execute(query, term_id, min, max, filters).await;
        timer.observe_duration();

        match &result {
            Ok(output) => {
                SEARCH_REQUESTS_TOTAL.with_label_values(&["success"]).inc();
                debug!(
                    query = %query,
                    result_count = output.result_count,
                    took_ms = output.took,
                    "Search complete"
                );
            }
            Err(e) => {
                SEARCH_REQUESTS_TOTAL.with_label_values(&["failure"]).inc();
                error!(query = %query, term_id = %term_id, error = %e, "Search failed");
            }
        }

        result
    }

    async fn execute(
        &self,
        query: &str,
        term_id: &str,
        min: usize,
        max: usize,
        filters: &Map<String, Value>,
    ) -> SearchResult<SearchOutput> {
        let window = Window::new(min, max)?;
        let parsed = self
            .get_search_results(query, term_id, window, filters)
            .await?;

        let hits = self.hydrator.hydrate(&parsed.hits).await?;
        if hits.len() != parsed.hits.len() {
            return Err(SearchError::Hydration(format!(
                "expected {} records, got {}",
                parsed.hits.len(),
                hits.len()
            )));
        }

        Ok(SearchOutput {
            hits,
            result_count: parsed.result_count,
            took: parsed.took,
            facets: parsed.facets,
        })
    }
}
