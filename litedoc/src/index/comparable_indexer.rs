use parking_lot::Mutex;

use crate::collection::{Document, ObjectId};
use crate::common::Value;
use crate::errors::{ErrorKind, LiteDocError, LiteDocResult};

use super::{index_keys, IndexDescriptor, IndexEntry, IndexKey, IndexerProvider, KeyRange};

/// Indexer for `unique` and `non-unique` indexes.
///
/// A unique index checks and claims keys under its write gate, so two
/// writers can never both take the same key.
pub(crate) struct ComparableIndexer {
    descriptor: IndexDescriptor,
    entries: IndexEntry,
    write_gate: Mutex<()>,
}

impl ComparableIndexer {
    pub fn new(descriptor: IndexDescriptor) -> Self {
        ComparableIndexer {
            descriptor,
            entries: IndexEntry::new(),
            write_gate: Mutex::new(()),
        }
    }

    fn duplicate_key(&self, key: &IndexKey) -> LiteDocError {
        let key = Value::Array(key.clone());
        log::error!(
            "Duplicate key {} in index {} of collection {}",
            key,
            self.descriptor.name(),
            self.descriptor.collection_name()
        );
        LiteDocError::new(
            &format!(
                "Duplicate key error in collection {}, index {}: key {}",
                self.descriptor.collection_name(),
                self.descriptor.name(),
                key
            ),
            ErrorKind::DuplicateKey,
        )
    }
}

impl IndexerProvider for ComparableIndexer {
    fn descriptor(&self) -> &IndexDescriptor {
        &self.descriptor
    }

    fn entry_keys(&self, document: &Document) -> Vec<IndexKey> {
        index_keys(document, self.descriptor.index_fields())
    }

    fn add_entries(&self, id: &ObjectId, keys: &[IndexKey]) -> LiteDocResult<()> {
        if !self.descriptor.is_unique() {
            for key in keys {
                self.entries.insert(key.clone(), *id);
            }
            return Ok(());
        }

        let _gate = self.write_gate.lock();
        if let Some(taken) = keys.iter().find(|key| self.entries.is_taken_by_other(key, id)) {
            return Err(self.duplicate_key(taken));
        }
        for key in keys {
            self.entries.insert(key.clone(), *id);
        }
        Ok(())
    }

    fn remove_entries(&self, id: &ObjectId, keys: &[IndexKey]) {
        for key in keys {
            self.entries.remove(key, id);
        }
    }

    fn scan(&self, range: &KeyRange) -> LiteDocResult<Vec<ObjectId>> {
        Ok(self.entries.scan(range))
    }

    fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn clear(&self) {
        self.entries.clear();
    }
}
