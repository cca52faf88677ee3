//! Search query compilation

use super::error::{SearchError, SearchResult};
use super::filters::{FilterKind, ValidFilters};
use crate::metrics::FILTERS_REJECTED_TOTAL;
use crate::models::RecordType;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use tracing::warn;

/// Weighted fields for a general free-text query
pub const GENERIC_FIELDS: &[&str] = &[
    "class.name^2",
    "class.name.autocomplete",
    "class.subject^4",
    "class.classId^3",
    "sections.profs",
    "class.crns",
    "employee.name^2",
    "employee.emails",
    "employee.phone",
];

/// Fields for a query shaped like a known course code, e.g. "CS2500".
///
/// Subject dominates so that every result after the first stays in the
/// same subject.
pub const COURSE_CODE_FIELDS: &[&str] = &["class.subject^10", "class.classId"];

static COURSE_CODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([a-zA-Z]{2,4})\s*(\d{4})?\s*$").expect("course code pattern is valid")
});

/// Which field list a query is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSelection {
    CourseCode,
    Generic,
}

impl FieldSelection {
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            FieldSelection::CourseCode => COURSE_CODE_FIELDS,
            FieldSelection::Generic => GENERIC_FIELDS,
        }
    }
}

/// Pagination window `[min, max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub min: usize,
    pub max: usize,
}

impl Window {
    pub fn new(min: usize, max: usize) -> SearchResult<Self> {
        if min > max {
            return Err(SearchError::InvalidWindow { min, max });
        }
        Ok(Self { min, max })
    }

    /// No hits requested; used by facet-only queries
    pub const fn empty() -> Self {
        Self { min: 0, max: 0 }
    }

    pub fn size(&self) -> usize {
        self.max - self.min
    }
}

/// Drop unknown filter names and values their filter rejects.
///
/// Rejections are logged and counted, never returned as errors.
pub fn validate_filters(filters: &Map<String, Value>) -> ValidFilters {
    let mut valid = ValidFilters::new();

    for (name, value) in filters {
        let Some(kind) = FilterKind::lookup(name) else {
            warn!(filter = %name, "Invalid filter key");
            FILTERS_REJECTED_TOTAL.with_label_values(&["unknown"]).inc();
            continue;
        };

        if !kind.validate(value) {
            warn!(filter = %name, value = %value, "Invalid filter value type");
            FILTERS_REJECTED_TOTAL.with_label_values(&[kind.name()]).inc();
            continue;
        }

        valid.insert(kind, value.clone());
    }

    valid
}

/// A multi-query ready to send, with the facet each auxiliary query answers
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledBatch {
    /// `queries[0]` is the primary query; `queries[i + 1]` answers `facets[i]`
    pub queries: Vec<Value>,
    pub facets: Vec<FilterKind>,
}

/// Compiles text + filters into Elasticsearch request bodies
pub struct QueryCompiler<'a> {
    subjects: &'a HashSet<String>,
}

impl<'a> QueryCompiler<'a> {
    /// `subjects` must hold lowercase subject codes
    pub fn new(subjects: &'a HashSet<String>) -> Self {
        Self { subjects }
    }

    /// Narrow to subject + class number when the query looks like a known course code
    pub fn field_selection(&self, query: &str) -> FieldSelection {
        match COURSE_CODE_PATTERN.captures(query) {
            Some(caps) if self.subjects.contains(&caps[1].to_lowercase()) => {
                FieldSelection::CourseCode
            }
            _ => FieldSelection::Generic,
        }
    }

    /// Every filter clause plus equality on the term
    pub fn class_filter_clauses(term_id: &str, filters: &ValidFilters) -> Vec<Value> {
        let mut clauses = filters.clauses();
        clauses.push(json!({ "term": { "class.termId": term_id } }));
        clauses
    }

    /// Build one search request body.
    ///
    /// Employee records bypass the class filters: the filter stage is
    /// `(all class filters) OR (type == employee)`. With `aggregation` set,
    /// a terms aggregation over that filter's facet field is attached.
    pub fn generate_query(
        &self,
        query: &str,
        class_filters: Vec<Value>,
        window: Window,
        aggregation: Option<FilterKind>,
    ) -> Value {
        let fields = self.field_selection(query).fields();

        let mut body = json!({
            "from": window.min,
            "size": window.size(),
            "sort": [
                "_score",
                { "class.classId.keyword": { "order": "asc", "unmapped_type": "keyword" } }
            ],
            "query": {
                "bool": {
                    "must": {
                        "multi_match": {
                            "query": query,
                            "type": "most_fields",
                            "fuzziness": "AUTO",
                            "fields": fields
                        }
                    },
                    "filter": {
                        "bool": {
                            "should": [
                                { "bool": { "must": class_filters } },
                                { "term": { "type": RecordType::Employee.as_str() } }
                            ]
                        }
                    }
                }
            }
        });

        if let Some(kind) = aggregation {
            if let Some(field) = kind.facet_field() {
                body["aggregations"] = json!({
                    kind.name(): { "terms": { "field": field } }
                });
            }
        }

        body
    }

    /// The primary query followed by one facet query per facetable filter.
    ///
    /// Each facet query applies every active filter except its own, so its
    /// counts show what selecting another value would yield.
    pub fn compile(
        &self,
        query: &str,
        term_id: &str,
        window: Window,
        filters: &ValidFilters,
    ) -> CompiledBatch {
        let mut queries = vec![self.generate_query(
            query,
            Self::class_filter_clauses(term_id, filters),
            window,
            None,
        )];

        let facets: Vec<FilterKind> = FilterKind::facetable().collect();
        for &facet in &facets {
            let others = filters.without(facet);
            queries.push(self.generate_query(
                query,
                Self::class_filter_clauses(term_id, &others),
                Window::empty(),
                Some(facet),
            ));
        }

        CompiledBatch { queries, facets }
    }
}
