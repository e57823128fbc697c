//! Secondary indexes.
//!
//! An index is described by an [IndexDescriptor] and created from
//! [IndexOptions]. Unique and non-unique indexes keep ordered composite keys
//! for point and range lookups; text indexes map tokens to document ids.

mod comparable_indexer;
mod descriptor;
mod index_map;
mod indexer;
mod key_range;
mod options;
pub mod text;
mod text_indexer;

pub(crate) use comparable_indexer::*;
pub use descriptor::*;
pub(crate) use index_map::*;
pub(crate) use indexer::*;
pub use key_range::*;
pub use options::*;
pub(crate) use text_indexer::*;
