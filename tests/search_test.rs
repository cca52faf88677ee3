//! Search service tests: filter validation, query shape and facet merging

mod common;

use async_trait::async_trait;
use common::*;
use course_search::config::StoreConfig;
use course_search::search::*;
use course_search::store::{
    BulkOperation, DocumentStore, InMemoryStore, QueryResponse, StoreError, StoreResult,
};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Helper to create test search service
fn create_test_service(store: &InMemoryStore) -> SearchService {
    store.set_distinct_values("class.subject.keyword", ["CS", "MATH", "ENGL"]);
    SearchService::new(
        Arc::new(store.clone()),
        Arc::new(SourceHydrator),
        &StoreConfig::default(),
    )
}

fn filters(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

fn multi_match_fields(query: &Value) -> Value {
    query["query"]["bool"]["must"]["multi_match"]["fields"].clone()
}

fn class_filters(query: &Value) -> Value {
    query["query"]["bool"]["filter"]["bool"]["should"][0]["bool"]["must"].clone()
}

#[test]
fn test_validate_filters_keeps_only_valid_entries() {
    let valid = validate_filters(&filters(json!({
        "online": false,
        "subject": ["CS"],
        "nupath": "Writing Intensive",
        "campus": ["Boston"]
    })));

    assert_eq!(serde_json::to_value(&valid).unwrap(), json!({ "subject": ["CS"] }));
}

#[tokio::test]
async fn test_course_code_query_uses_narrow_fields() {
    let store = InMemoryStore::new();
    let service = create_test_service(&store);

    service
        .search("CS2500", FALL, 0, 10, &Map::new())
        .await
        .unwrap();

    let sent = &store.multi_queries()[0];
    for query in &sent.queries {
        assert_eq!(multi_match_fields(query), json!(["class.subject^10", "class.classId"]));
    }
}

#[tokio::test]
async fn test_unknown_subject_falls_back_to_generic_fields() {
    let store = InMemoryStore::new();
    let service = create_test_service(&store);

    service.search("XYZ2500", FALL, 0, 10, &Map::new()).await.unwrap();
    service
        .search("intro to programming", FALL, 0, 10, &Map::new())
        .await
        .unwrap();

    for sent in store.multi_queries() {
        assert_eq!(multi_match_fields(&sent.queries[0]), json!(GENERIC_FIELDS));
    }
}

#[tokio::test]
async fn test_facet_query_excludes_its_own_filter() {
    let store = InMemoryStore::new();
    let service = create_test_service(&store);

    service
        .search(
            "algorithms",
            FALL,
            0,
            10,
            &filters(json!({ "subject": ["CS"], "online": true })),
        )
        .await
        .unwrap();

    let sent = &store.multi_queries()[0];
    // primary + nupath + subject + classType; online has no facet
    assert_eq!(sent.queries.len(), 4);

    let term = json!({ "term": { "class.termId": FALL } });
    let online = json!({ "term": { "sections.online": true } });
    let subject = json!({ "bool": { "should": [{ "match": { "class.subject": "CS" } }] } });

    assert_eq!(class_filters(&sent.queries[0]), json!([subject, online, term]));
    assert_eq!(class_filters(&sent.queries[1]), json!([subject, online, term]));
    assert_eq!(class_filters(&sent.queries[2]), json!([online, term]));
    assert_eq!(class_filters(&sent.queries[3]), json!([subject, online, term]));

    assert_eq!(sent.queries[2]["size"], 0);
    assert_eq!(
        sent.queries[2]["aggregations"]["subject"]["terms"]["field"],
        "class.subject.keyword"
    );
}

#[tokio::test]
async fn test_employees_bypass_class_filters() {
    let store = InMemoryStore::new();
    let service = create_test_service(&store);

    service
        .search("lerner", FALL, 0, 10, &filters(json!({ "classType": ["Lab"] })))
        .await
        .unwrap();

    let primary = &store.multi_queries()[0].queries[0];
    assert_eq!(
        primary["query"]["bool"]["filter"]["bool"]["should"][1],
        json!({ "term": { "type": "employee" } })
    );
}

#[tokio::test]
async fn test_search_merges_hits_and_facets() {
    let store = InMemoryStore::new();
    let service = create_test_service(&store);

    store.push_multi_query_response(vec![
        primary_response(
            2,
            12,
            vec![
                hit("neu.edu/202110/CS/2500", json!({ "class": { "classId": "2500" } })),
                hit("neu.edu/202110/CS/2510", json!({ "class": { "classId": "2510" } })),
            ],
        ),
        facet_response("nupath", &[("NUpath Formal/Quant Reasoning", 1)]),
        facet_response("subject", &[("CS", 2), ("MATH", 9)]),
        facet_response("classType", &[]),
    ]);

    let output = service
        .search("fundamentals", FALL, 0, 10, &filters(json!({ "subject": ["CS"] })))
        .await
        .unwrap();

    assert_eq!(output.result_count, 2);
    assert_eq!(output.took, 12);
    assert_eq!(output.hits[0]["class"]["classId"], "2500");
    assert_eq!(output.hits[1]["class"]["classId"], "2510");

    assert_eq!(output.facets.len(), 3);
    assert_eq!(
        output.facets["subject"],
        vec![
            FacetBucket { value: "CS".into(), count: 2 },
            FacetBucket { value: "MATH".into(), count: 9 },
        ]
    );
    assert!(output.facets["classType"].is_empty());
}

#[tokio::test]
async fn test_window_becomes_from_and_size() {
    let store = InMemoryStore::new();
    let service = create_test_service(&store);

    service.search("calculus", SPRING, 20, 30, &Map::new()).await.unwrap();

    let primary = &store.multi_queries()[0].queries[0];
    assert_eq!(primary["from"], 20);
    assert_eq!(primary["size"], 10);
}

#[tokio::test]
async fn test_short_response_fails_search() {
    let store = InMemoryStore::new();
    let service = create_test_service(&store);
    store.push_multi_query_response(vec![primary_response(0, 1, vec![])]);

    let result = service.search("x", FALL, 0, 10, &Map::new()).await;
    assert!(matches!(
        result,
        Err(SearchError::BatchIncomplete { expected: 4, received: 1 })
    ));
}

#[tokio::test]
async fn test_failed_sub_query_fails_search() {
    let store = InMemoryStore::new();
    let service = create_test_service(&store);

    let mut broken = facet_response("subject", &[]);
    broken.error = Some(json!({ "type": "query_shard_exception" }));
    broken.status = Some(400);

    store.push_multi_query_response(vec![
        primary_response(0, 1, vec![]),
        facet_response("nupath", &[]),
        broken,
        facet_response("classType", &[]),
    ]);

    let result = service.search("x", FALL, 0, 10, &Map::new()).await;
    assert!(matches!(
        result,
        Err(SearchError::SubQueryFailed { position: 2, .. })
    ));
}

/// Drops every hit it is given
struct LossyHydrator;

#[async_trait]
impl Hydrator for LossyHydrator {
    async fn hydrate(&self, _hits: &[course_search::store::Hit]) -> SearchResult<Vec<Value>> {
        Ok(vec![])
    }
}

#[tokio::test]
async fn test_hydrator_must_return_every_hit() {
    let store = InMemoryStore::new();
    store.push_multi_query_response(vec![
        primary_response(1, 1, vec![hit("a", json!({}))]),
        facet_response("nupath", &[]),
        facet_response("subject", &[]),
        facet_response("classType", &[]),
    ]);

    let service = SearchService::new(
        Arc::new(store.clone()),
        Arc::new(LossyHydrator),
        &StoreConfig::default(),
    );

    let result = service.search("x", FALL, 0, 10, &Map::new()).await;
    assert!(matches!(result, Err(SearchError::Hydration(_))));
}

/// Fails the first distinct-value lookup, then delegates
struct FlakySubjects {
    inner: InMemoryStore,
    failed_once: AtomicBool,
}

#[async_trait]
impl DocumentStore for FlakySubjects {
    async fn bulk_write(&self, index: &str, operations: Vec<BulkOperation>) -> StoreResult<usize> {
        self.inner.bulk_write(index, operations).await
    }

    async fn delete_index(&self, index: &str) -> StoreResult<()> {
        self.inner.delete_index(index).await
    }

    async fn create_index(&self, index: &str, mapping: &Value) -> StoreResult<()> {
        self.inner.create_index(index, mapping).await
    }

    async fn multi_query(
        &self,
        indices: &[String],
        queries: Vec<Value>,
    ) -> StoreResult<Vec<QueryResponse>> {
        self.inner.multi_query(indices, queries).await
    }

    async fn distinct_values(&self, field: &str) -> StoreResult<HashSet<String>> {
        if !self.failed_once.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        self.inner.distinct_values(field).await
    }
}

#[tokio::test]
async fn test_subject_cache_retries_after_failure() {
    let inner = InMemoryStore::new();
    inner.set_distinct_values("class.subject.keyword", ["CS"]);
    let store = Arc::new(FlakySubjects {
        inner: inner.clone(),
        failed_once: AtomicBool::new(false),
    });

    let service = SearchService::new(store, Arc::new(SourceHydrator), &StoreConfig::default());

    let first = service.search("CS2500", FALL, 0, 10, &Map::new()).await;
    assert!(matches!(first, Err(SearchError::Store(StoreError::Status { status: 503, .. }))));
    assert!(inner.multi_queries().is_empty());

    service.search("CS2500", FALL, 0, 10, &Map::new()).await.unwrap();
    assert!(service.subjects().await.unwrap().contains("cs"));
    assert_eq!(inner.distinct_calls(), 1);
}

#[tokio::test]
async fn test_subjects_loaded_once_across_searches() {
    let store = InMemoryStore::new();
    let service = Arc::new(create_test_service(&store));

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .search(&format!("query {}", i), FALL, 0, 5, &Map::new())
                    .await
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(store.distinct_calls(), 1);
    assert_eq!(store.multi_queries().len(), 8);
}
