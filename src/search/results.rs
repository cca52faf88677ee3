//! Merging a multi-query response into one result set

use super::error::{SearchError, SearchResult};
use super::filters::FilterKind;
use crate::store::{scalar_to_string, Hit, QueryResponse};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One facet value with the number of matching records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetBucket {
    pub value: String,
    pub count: u64,
}

/// Primary hits plus facet counts, before hydration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResults {
    /// Ranked hit references from the primary query
    pub hits: Vec<Hit>,

    /// Total matches of the primary query
    pub result_count: u64,

    /// Elapsed time of the primary query in milliseconds
    pub took: u64,

    /// Buckets keyed by filter name
    pub facets: BTreeMap<String, Vec<FacetBucket>>,
}

/// Split a multi-query response into hits and facets.
///
/// `responses[0]` answers the primary query and `responses[i + 1]` answers
/// `facets[i]`. A short response list or any failed sub-query fails the
/// whole batch.
pub fn parse_results(
    responses: Vec<QueryResponse>,
    facets: &[FilterKind],
) -> SearchResult<ParsedResults> {
    let expected = facets.len() + 1;
    if responses.len() < expected {
        return Err(SearchError::BatchIncomplete {
            expected,
            received: responses.len(),
        });
    }

    if let Some((position, response)) = responses
        .iter()
        .enumerate()
        .take(expected)
        .find(|(_, response)| response.error.is_some())
    {
        let reason = response
            .error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_default();
        return Err(SearchError::SubQueryFailed { position, reason });
    }

    let mut responses = responses.into_iter();
    let Some(primary) = responses.next() else {
        return Err(SearchError::BatchIncomplete {
            expected,
            received: 0,
        });
    };

    let mut parsed = ParsedResults {
        hits: primary.hits.hits,
        result_count: primary.hits.total.value,
        took: primary.took,
        facets: BTreeMap::new(),
    };

    for (facet, mut response) in facets.iter().zip(responses) {
        let name = facet.name();
        let aggregation = response.aggregations.remove(name).ok_or_else(|| {
            SearchError::MissingAggregation {
                facet: name.to_string(),
            }
        })?;

        let buckets = aggregation
            .buckets
            .into_iter()
            .map(|bucket| FacetBucket {
                value: scalar_to_string(&bucket.key),
                count: bucket.doc_count,
            })
            .collect();
        parsed.facets.insert(name.to_string(), buckets);
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Bucket, Hits, TermsAggregation, TotalHits, TotalRelation};
    use serde_json::json;

    fn facet_response(name: &str, buckets: Vec<(&str, u64)>) -> QueryResponse {
        let buckets = buckets
            .into_iter()
            .map(|(key, doc_count)| Bucket {
                key: json!(key),
                doc_count,
            })
            .collect();
        QueryResponse {
            aggregations: [(name.to_string(), TermsAggregation { buckets })].into(),
            ..Default::default()
        }
    }

    fn primary() -> QueryResponse {
        QueryResponse {
            took: 7,
            hits: Hits {
                total: TotalHits {
                    value: 42,
                    relation: TotalRelation::Gte,
                },
                hits: vec![Hit {
                    index: "classes".to_string(),
                    id: "neu.edu/202110/CS/2500".to_string(),
                    score: Some(3.5),
                    source: json!({ "type": "class" }),
                }],
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_merges_every_facet() {
        let facets = [FilterKind::Subject, FilterKind::ClassType];
        let responses = vec![
            primary(),
            facet_response("subject", vec![("CS", 10), ("DS", 4)]),
            facet_response("classType", vec![("Lab", 2)]),
        ];

        let parsed = parse_results(responses, &facets).unwrap();

        assert_eq!(parsed.result_count, 42);
        assert_eq!(parsed.took, 7);
        assert_eq!(parsed.hits.len(), 1);
        assert_eq!(parsed.facets.len(), 2);
        assert_eq!(
            parsed.facets["subject"],
            vec![
                FacetBucket { value: "CS".into(), count: 10 },
                FacetBucket { value: "DS".into(), count: 4 },
            ]
        );
        assert_eq!(parsed.facets["classType"][0].value, "Lab");
    }

    #[test]
    fn test_short_batch_fails() {
        let result = parse_results(vec![primary()], &[FilterKind::Subject]);
        assert!(matches!(
            result,
            Err(SearchError::BatchIncomplete { expected: 2, received: 1 })
        ));
    }

    #[test]
    fn test_sub_query_error_fails_batch() {
        let mut failed = facet_response("subject", vec![]);
        failed.error = Some(json!({ "type": "search_phase_execution_exception" }));

        let result = parse_results(vec![primary(), failed], &[FilterKind::Subject]);
        assert!(matches!(
            result,
            Err(SearchError::SubQueryFailed { position: 1, .. })
        ));
    }

    #[test]
    fn test_missing_aggregation_fails() {
        let result = parse_results(vec![primary(), QueryResponse::default()], &[FilterKind::Nupath]);
        assert!(matches!(result, Err(SearchError::MissingAggregation { .. })));
    }

    #[test]
    fn test_numeric_bucket_keys_become_strings() {
        let response = QueryResponse {
            aggregations: [(
                "nupath".to_string(),
                TermsAggregation {
                    buckets: vec![Bucket { key: json!(4), doc_count: 1 }],
                },
            )]
            .into(),
            ..Default::default()
        };

        let parsed = parse_results(vec![primary(), response], &[FilterKind::Nupath]).unwrap();
        assert_eq!(parsed.facets["nupath"][0].value, "4");
    }
}
