//! Lazy document streams and the query cursor built on top of them.

mod document_cursor;
mod filtered_stream;
mod indexed_stream;
mod map_values;
mod projection;
mod sorted_stream;

use crate::collection::Document;
use crate::errors::LiteDocResult;

pub use document_cursor::*;
pub(crate) use filtered_stream::*;
pub(crate) use indexed_stream::*;
pub use map_values::*;
pub use projection::*;
pub(crate) use sorted_stream::*;

/// A boxed, sendable stream of documents.
pub type DocumentStream = Box<dyn Iterator<Item = LiteDocResult<Document>> + Send>;
