//! The filter registry.
//!
//! Every filter a search request may carry is one [`FilterKind`] variant.
//! Its [`FilterDefinition`] validates a raw JSON value, compiles an accepted
//! value into an Elasticsearch clause, and optionally names the keyword field
//! its facet counts are aggregated over.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Named filters, in registry iteration order
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
    IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum FilterKind {
    /// Distribution-requirement tags on the class
    Nupath,
    Subject,
    /// Only classes with an online section; `false` is not a valid value
    Online,
    ClassType,
    /// Only classes that have at least one section
    SectionsAvailable,
}

/// Behavior attached to one filter
#[derive(Clone, Copy)]
pub struct FilterDefinition {
    pub validate: fn(&Value) -> bool,
    pub create: fn(&Value) -> Value,
    pub facet_field: Option<&'static str>,
}

impl FilterKind {
    pub fn definition(self) -> FilterDefinition {
        match self {
            FilterKind::Nupath => FilterDefinition {
                validate: is_string_array,
                create: nupath_clause,
                facet_field: Some("class.classAttributes.keyword"),
            },
            FilterKind::Subject => FilterDefinition {
                validate: is_string_array,
                create: subject_clause,
                facet_field: Some("class.subject.keyword"),
            },
            FilterKind::Online => FilterDefinition {
                validate: is_true,
                create: online_clause,
                facet_field: None,
            },
            FilterKind::ClassType => FilterDefinition {
                validate: is_string_array,
                create: class_type_clause,
                facet_field: Some("sections.classType.keyword"),
            },
            FilterKind::SectionsAvailable => FilterDefinition {
                validate: is_true,
                create: sections_available_clause,
                facet_field: None,
            },
        }
    }

    /// Look a filter up by its request name (e.g. `classType`)
    pub fn lookup(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    /// Request name, also the facet key in results
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Filters that have a facet, in registry order
    pub fn facetable() -> impl Iterator<Item = FilterKind> {
        FilterKind::iter().filter(|kind| kind.facet_field().is_some())
    }

    pub fn validate(self, value: &Value) -> bool {
        (self.definition().validate)(value)
    }

    /// Compile a value that already passed [`FilterKind::validate`]
    pub fn create(self, value: &Value) -> Value {
        (self.definition().create)(value)
    }

    pub fn facet_field(self) -> Option<&'static str> {
        self.definition().facet_field
    }
}

fn is_string_array(value: &Value) -> bool {
    match value {
        // An empty selection means "no filter"
        Value::Array(items) => !items.is_empty() && items.iter().all(Value::is_string),
        _ => false,
    }
}

fn is_true(value: &Value) -> bool {
    matches!(value, Value::Bool(true))
}

fn string_items(value: &Value) -> impl Iterator<Item = &Value> {
    value.as_array().into_iter().flatten()
}

fn nupath_clause(value: &Value) -> Value {
    let should: Vec<Value> = string_items(value)
        .map(|tag| json!({ "match_phrase": { "class.classAttributes": tag } }))
        .collect();
    json!({ "bool": { "should": should } })
}

fn subject_clause(value: &Value) -> Value {
    let should: Vec<Value> = string_items(value)
        .map(|subject| json!({ "match": { "class.subject": subject } }))
        .collect();
    json!({ "bool": { "should": should } })
}

fn online_clause(value: &Value) -> Value {
    json!({ "term": { "sections.online": value } })
}

fn class_type_clause(value: &Value) -> Value {
    json!({ "terms": { "sections.classType.keyword": value } })
}

fn sections_available_clause(_value: &Value) -> Value {
    json!({ "exists": { "field": "sections" } })
}

/// Filters that survived validation, keyed in registry order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidFilters(BTreeMap<FilterKind, Value>);

impl ValidFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: FilterKind, value: Value) {
        self.0.insert(kind, value);
    }

    pub fn get(&self, kind: FilterKind) -> Option<&Value> {
        self.0.get(&kind)
    }

    pub fn contains(&self, kind: FilterKind) -> bool {
        self.0.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FilterKind, &Value)> {
        self.0.iter().map(|(kind, value)| (*kind, value))
    }

    /// Every filter except `kind`
    pub fn without(&self, kind: FilterKind) -> Self {
        let mut rest = self.clone();
        rest.0.remove(&kind);
        rest
    }

    /// Compiled clauses, one per filter
    pub fn clauses(&self) -> Vec<Value> {
        self.iter().map(|(kind, value)| kind.create(value)).collect()
    }
}
