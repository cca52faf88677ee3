//! Class index construction.
//!
//! A [`TermDump`](crate::models::TermDump) is joined into class documents in
//! two passes (classes create keyed placeholders, sections attach by key),
//! then the class index is deleted, recreated with [`class_index_mapping`]
//! and filled with one concurrent bulk write per term.

mod builder;
mod error;
mod mapping;

pub use builder::{GroupedDump, IndexBuilder, RebuildReport};
pub use error::IndexError;
pub use mapping::class_index_mapping;
