//! Faceted class and employee search.
//!
//! ```text
//!   query + filters
//!         │
//!         ▼
//!   validate_filters ──► ValidFilters (invalid entries dropped)
//!         │
//!         ▼
//!   QueryCompiler ──► [primary, facet(nupath), facet(subject), facet(classType)]
//!         │
//!         ▼
//!   DocumentStore::multi_query (one round trip)
//!         │
//!         ▼
//!   parse_results ──► hits, resultCount, took, facets
//!         │
//!         ▼
//!   Hydrator ──► full records
//! ```
//!
//! # Example
//!
//! ```no_run
//! use course_search::config::StoreConfig;
//! use course_search::search::{SearchService, SourceHydrator};
//! use course_search::store::ElasticStore;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoreConfig::default();
//!     let store = Arc::new(ElasticStore::new(&config)?);
//!     let search = SearchService::new(store, Arc::new(SourceHydrator), &config);
//!
//!     let filters = json!({ "subject": ["CS"], "online": true });
//!     let results = search
//!         .search("fundamentals", "202110", 0, 10, filters.as_object().unwrap())
//!         .await?;
//!     println!("Found {} results", results.result_count);
//!
//!     Ok(())
//! }
//! ```

mod error;
mod filters;
mod hydrate;
mod query;
mod results;
mod service;

pub use error::{SearchError, SearchResult};
pub use filters::{FilterDefinition, FilterKind, ValidFilters};
pub use hydrate::{Hydrator, SourceHydrator};
pub use query::{
    validate_filters, CompiledBatch, FieldSelection, QueryCompiler, Window, COURSE_CODE_FIELDS,
    GENERIC_FIELDS,
};
pub use results::{parse_results, FacetBucket, ParsedResults};
pub use service::{SearchOutput, SearchService};
