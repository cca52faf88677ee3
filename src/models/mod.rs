pub mod class;
pub mod document;

pub use class::*;
pub use document::*;
