//! In-memory storage of collection documents.

mod document_map;

pub use document_map::*;
