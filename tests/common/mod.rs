//! Shared fixtures for the integration tests

#![allow(dead_code)]

use course_search::models::{RawClassRecord, RawSectionRecord, TermDump};
use course_search::store::{Bucket, Hit, Hits, QueryResponse, TermsAggregation, TotalHits};
use serde_json::{json, Value};

pub const HOST: &str = "neu.edu";
pub const FALL: &str = "202110";
pub const SPRING: &str = "202130";

pub fn class(term_id: &str, subject: &str, class_id: &str, name: &str) -> RawClassRecord {
    RawClassRecord::new(HOST, term_id, subject, class_id).with_name(name)
}

pub fn section(term_id: &str, subject: &str, class_id: &str, crn: &str) -> RawSectionRecord {
    RawSectionRecord::new(HOST, term_id, subject, class_id, crn)
}

/// Two terms, three classes, one orphaned section, sections out of CRN order
pub fn sample_dump() -> TermDump {
    TermDump::new(
        vec![
            class(FALL, "CS", "2500", "Fundamentals of Computer Science 1")
                .with_attributes(vec!["NUpath Formal/Quant Reasoning"]),
            class(FALL, "CS", "2510", "Fundamentals of Computer Science 2"),
            class(SPRING, "MATH", "1341", "Calculus 1"),
        ],
        vec![
            section(FALL, "CS", "2500", "10462").with_profs(vec!["Ben Lerner"]),
            section(FALL, "CS", "2500", "10461").with_online(true),
            section(FALL, "CS", "2510", "30340").with_class_type("Lecture"),
            section(SPRING, "MATH", "1341", "20001"),
            // No CS 9999 class in the dump
            section(FALL, "CS", "9999", "99999"),
        ],
    )
}

pub fn hit(id: &str, source: Value) -> Hit {
    Hit {
        index: "classes".to_string(),
        id: id.to_string(),
        score: Some(1.0),
        source,
    }
}

pub fn primary_response(total: u64, took: u64, hits: Vec<Hit>) -> QueryResponse {
    QueryResponse {
        took,
        hits: Hits {
            total: TotalHits {
                value: total,
                ..Default::default()
            },
            hits,
        },
        ..Default::default()
    }
}

pub fn facet_response(name: &str, buckets: &[(&str, u64)]) -> QueryResponse {
    let buckets = buckets
        .iter()
        .map(|(key, doc_count)| Bucket {
            key: json!(key),
            doc_count: *doc_count,
        })
        .collect();

    QueryResponse {
        aggregations: [(name.to_string(), TermsAggregation { buckets })].into(),
        ..Default::default()
    }
}

/// Lines of a Prometheus text exposition that belong to `name`
pub fn metric_lines<'a>(output: &'a str, name: &str) -> Vec<&'a str> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter(|line| line.starts_with(name))
        .collect()
}
