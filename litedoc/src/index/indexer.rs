use std::ops::Deref;
use std::sync::Arc;

use crate::collection::{Document, ObjectId};
use crate::errors::{ErrorKind, LiteDocError, LiteDocResult};
use crate::filter::TextFilter;

use super::{ComparableIndexer, IndexDescriptor, IndexKey, KeyRange, TextIndexer};

/// Maintains the entries of one index and answers lookups against them.
///
/// Writers go through three steps: compute the keys of a document with
/// [IndexerProvider::entry_keys], claim them with
/// [IndexerProvider::add_entries] (which enforces uniqueness) and release
/// stale ones with [IndexerProvider::remove_entries].
pub(crate) trait IndexerProvider: Send + Sync {
    fn descriptor(&self) -> &IndexDescriptor;

    fn entry_keys(&self, document: &Document) -> Vec<IndexKey>;

    /// Adds `(key, id)` entries, all or nothing.
    fn add_entries(&self, id: &ObjectId, keys: &[IndexKey]) -> LiteDocResult<()>;

    fn remove_entries(&self, id: &ObjectId, keys: &[IndexKey]);

    /// Ids whose leading key lies in `range`, in key order.
    fn scan(&self, _range: &KeyRange) -> LiteDocResult<Vec<ObjectId>> {
        log::error!("Index {} does not support range scans", self.descriptor());
        Err(LiteDocError::new(
            &format!("Index {} does not support range scans", self.descriptor()),
            ErrorKind::InvalidOperation,
        ))
    }

    /// Candidate ids for a text search, or `None` when the search cannot
    /// be narrowed by this index.
    fn search(&self, _filter: &TextFilter) -> LiteDocResult<Option<Vec<ObjectId>>> {
        log::error!("Index {} does not support text search", self.descriptor());
        Err(LiteDocError::new(
            &format!("Index {} does not support text search", self.descriptor()),
            ErrorKind::InvalidOperation,
        ))
    }

    fn entry_count(&self) -> usize;

    fn clear(&self);
}

#[derive(Clone)]
pub(crate) struct Indexer {
    inner: Arc<dyn IndexerProvider>,
}

impl Indexer {
    pub fn new<T: IndexerProvider + 'static>(inner: T) -> Self {
        Indexer {
            inner: Arc::new(inner),
        }
    }

    /// Creates the indexer matching the descriptor's index type.
    pub fn for_descriptor(descriptor: IndexDescriptor) -> Self {
        if descriptor.is_text() {
            Indexer::new(TextIndexer::new(descriptor))
        } else {
            Indexer::new(ComparableIndexer::new(descriptor))
        }
    }
}

impl Deref for Indexer {
    type Target = Arc<dyn IndexerProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
