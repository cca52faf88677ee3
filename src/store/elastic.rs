use super::error::{StoreError, StoreResult};
use super::{scalar_to_string, BulkOperation, DocumentStore, QueryResponse, TermsAggregation};
use crate::config::StoreConfig;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tracing::{debug, warn};

const NDJSON: &str = "application/x-ndjson";

/// Elasticsearch backend speaking the REST API over HTTP
#[derive(Clone)]
pub struct ElasticStore {
    client: Client,
    base_url: String,
    class_index: String,
    distinct_values_limit: usize,
}

#[derive(Debug, Deserialize)]
struct BulkReply {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<BTreeMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct MultiSearchReply {
    responses: Vec<QueryResponse>,
}

#[derive(Debug, Deserialize)]
struct AggregationReply {
    #[serde(default)]
    aggregations: BTreeMap<String, TermsAggregation>,
}

impl ElasticStore {
    /// Create a new store client
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            class_index: config.class_index.clone(),
            distinct_values_limit: config.distinct_values_limit,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Turn a non-success status into [`StoreError::Status`]
    async fn check(response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }

    fn bulk_body(operations: &[BulkOperation]) -> StoreResult<String> {
        let mut body = String::new();
        for op in operations {
            body.push_str(&serde_json::to_string(&json!({ "index": { "_id": op.id } }))?);
            body.push('\n');
            body.push_str(&serde_json::to_string(&op.document)?);
            body.push('\n');
        }
        Ok(body)
    }

    fn multi_search_body(queries: &[Value]) -> StoreResult<String> {
        let mut body = String::new();
        for query in queries {
            body.push_str("{}\n");
            body.push_str(&serde_json::to_string(query)?);
            body.push('\n');
        }
        Ok(body)
    }
}

#[async_trait]
impl DocumentStore for ElasticStore {
    async fn bulk_write(&self, index: &str, operations: Vec<BulkOperation>) -> StoreResult<usize> {
        let total = operations.len();
        if total == 0 {
            return Ok(0);
        }

        let body = Self::bulk_body(&operations)?;
        let response = self
            .client
            .post(self.url(&format!("{}/_bulk", index)))
            .header(reqwest::header::CONTENT_TYPE, NDJSON)
            .body(body)
            .send()
            .await?;

        let reply: BulkReply = Self::check(response).await?.json().await?;
        if reply.errors {
            let failed = reply
                .items
                .iter()
                .flat_map(|item| item.values())
                .filter(|item| item.error.is_some())
                .count();

            return Err(StoreError::BulkRejected {
                index: index.to_string(),
                failed,
                total,
            });
        }

        debug!(index = %index, documents = total, "Bulk write complete");
        Ok(total)
    }

    async fn delete_index(&self, index: &str) -> StoreResult<()> {
        let response = self.client.delete(self.url(index)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(index = %index, "Index did not exist, nothing to delete");
            return Ok(());
        }

        Self::check(response).await?;
        Ok(())
    }

    async fn create_index(&self, index: &str, mapping: &Value) -> StoreResult<()> {
        let response = self
            .client
            .put(self.url(index))
            .json(mapping)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn multi_query(
        &self,
        indices: &[String],
        queries: Vec<Value>,
    ) -> StoreResult<Vec<QueryResponse>> {
        let body = Self::multi_search_body(&queries)?;
        let response = self
            .client
            .post(self.url(&format!("{}/_msearch", indices.join(","))))
            .header(reqwest::header::CONTENT_TYPE, NDJSON)
            .body(body)
            .send()
            .await?;

        let reply: MultiSearchReply = Self::check(response).await?.json().await?;
        Ok(reply.responses)
    }

    async fn distinct_values(&self, field: &str) -> StoreResult<HashSet<String>> {
        let query = json!({
            "size": 0,
            "aggregations": {
                "distinct": { "terms": { "field": field, "size": self.distinct_values_limit } }
            }
        });

        let response = self
            .client
            .post(self.url(&format!("{}/_search", self.class_index)))
            .json(&query)
            .send()
            .await?;

        let reply: AggregationReply = Self::check(response).await?.json().await?;
        let buckets = reply
            .aggregations
            .get("distinct")
            .map(|agg| agg.buckets.as_slice())
            .unwrap_or_default();

        if buckets.len() >= self.distinct_values_limit {
            warn!(
                field = %field,
                limit = self.distinct_values_limit,
                "Distinct value lookup hit its limit, some values may be missing"
            );
        }

        Ok(buckets.iter().map(|b| scalar_to_string(&b.key)).collect())
    }
}
