//! Course search: index building and faceted query compilation.
//!
//! Two pipelines live here:
//!
//! - **Indexing**: a scrape batch ([`models::TermDump`]) is joined into one
//!   [`models::ClassDocument`] per class, grouped by term, and written into a
//!   freshly recreated class index ([`indexing::IndexBuilder`]).
//! - **Searching**: a free-text query plus a filter selection is compiled into
//!   one primary query and one facet query per facetable filter, sent as a
//!   single multi-query, and shaped into hits and facet counts
//!   ([`search::SearchService`]).
//!
//! The document store itself sits behind [`store::DocumentStore`].

pub mod config;
pub mod error;
pub mod indexing;
pub mod keys;
pub mod metrics;
pub mod models;
pub mod search;
pub mod store;

pub use error::{AppError, Result};
