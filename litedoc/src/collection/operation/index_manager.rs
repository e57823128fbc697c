use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use itertools::Itertools;

use crate::collection::{Document, ObjectId};
use crate::common::{SortOrder, SortableFields, DOC_ID, NON_UNIQUE_INDEX, TEXT_INDEX, UNIQUE_INDEX};
use crate::errors::{ErrorKind, LiteDocError, LiteDocResult};
use crate::filter::TextFilter;
use crate::index::{IndexDescriptor, IndexKey, IndexOptions, Indexer, KeyRange};
use crate::store::DocumentMap;

/// Keys one write added to or must still remove from each index.
type KeyChanges = Vec<(Indexer, Vec<IndexKey>)>;

/// The index entries an update claimed before its new document version is
/// published.
///
/// Once the store holds the new version, [IndexUpdate::commit] drops the
/// stale entries of the old version. If publishing fails,
/// [IndexUpdate::rollback] releases the claimed entries instead.
pub(crate) struct IndexUpdate {
    id: ObjectId,
    added: KeyChanges,
    stale: KeyChanges,
}

impl IndexUpdate {
    pub fn commit(self) {
        for (indexer, keys) in self.stale {
            indexer.remove_entries(&self.id, &keys);
        }
    }

    pub fn rollback(self) {
        for (indexer, keys) in self.added {
            indexer.remove_entries(&self.id, &keys);
        }
    }
}

/// Owns the secondary indexes of a collection and keeps them in step with
/// the document map.
///
/// The implicit `_id_` index is the document map itself and is not held
/// here. Index creation and removal must run under the collection's
/// exclusive gate, the write hooks under its shared gate together with the
/// per-document lock of the written id.
#[derive(Clone)]
pub(crate) struct IndexManager {
    inner: Arc<IndexManagerInner>,
}

struct IndexManagerInner {
    collection_name: String,
    document_map: DocumentMap,
    indexers: DashMap<String, Indexer>,
}

impl IndexManager {
    pub fn new(collection_name: &str, document_map: DocumentMap) -> Self {
        IndexManager {
            inner: Arc::new(IndexManagerInner {
                collection_name: collection_name.to_string(),
                document_map,
                indexers: DashMap::new(),
            }),
        }
    }

    /// The secondary index descriptors, ordered by name.
    pub fn descriptors(&self) -> Vec<IndexDescriptor> {
        self.indexers()
            .into_iter()
            .map(|indexer| indexer.descriptor().clone())
            .collect()
    }

    /// Every index of the collection, `_id_` first.
    pub fn list_indexes(&self) -> Vec<IndexDescriptor> {
        let mut indexes = vec![IndexDescriptor::id_index(&self.inner.collection_name)];
        indexes.extend(self.descriptors());
        indexes
    }

    pub fn has_index(&self, fields: &SortableFields) -> bool {
        is_id_fields(fields) || self.find_indexer(fields).is_some()
    }

    /// Creates and backfills an index.
    ///
    /// Creating an index identical to an existing one returns the existing
    /// descriptor. Fails with [ErrorKind::IndexingError] for another index
    /// on the same fields, an unknown index type, a text index on several
    /// fields or a second text index, and with [ErrorKind::DuplicateKey]
    /// when a unique index meets a duplicate and `drop_dups` is off. A
    /// failed build leaves no trace.
    pub fn create_index(
        &self,
        fields: &SortableFields,
        options: &IndexOptions,
    ) -> LiteDocResult<IndexDescriptor> {
        let collection_name = &self.inner.collection_name;
        let index_type = options.index_type();
        if ![UNIQUE_INDEX, NON_UNIQUE_INDEX, TEXT_INDEX].contains(&index_type) {
            return Err(self.indexing_error(&format!("Unknown index type {}", index_type)));
        }
        if fields.is_empty() {
            return Err(self.indexing_error("An index needs at least one field"));
        }

        if is_id_fields(fields) {
            if index_type == UNIQUE_INDEX {
                return Ok(IndexDescriptor::id_index(collection_name));
            }
            return Err(self.indexing_error(&format!(
                "Index on _id is always unique, cannot create a {} index",
                index_type
            )));
        }

        if let Some(existing) = self.find_indexer(fields) {
            let descriptor = existing.descriptor();
            if descriptor.index_fields() == fields && descriptor.index_type() == index_type {
                log::debug!("Index {} already exists", descriptor);
                return Ok(descriptor.clone());
            }
            return Err(self.indexing_error(&format!(
                "Index {} already exists on fields {}",
                descriptor,
                fields.field_names().join(", ")
            )));
        }

        if index_type == TEXT_INDEX {
            if fields.len() != 1 {
                return Err(self.indexing_error("A text index covers exactly one field"));
            }
            if let Some(text) = self.descriptors().into_iter().find(|d| d.is_text()) {
                return Err(self.indexing_error(&format!(
                    "Collection already has the text index {}",
                    text
                )));
            }
        }

        let descriptor =
            IndexDescriptor::new(index_type, fields.clone(), collection_name, options.background());
        let indexer = Indexer::for_descriptor(descriptor.clone());
        let duplicates = self.backfill(&indexer, options.drop_dups())?;

        for id in duplicates {
            let removed = self.inner.document_map.remove(&id)?;
            self.on_remove(&removed);
            log::info!(
                "Dropped duplicate document {} from {} while building {}",
                id,
                collection_name,
                descriptor
            );
        }

        self.inner.indexers.insert(descriptor.name(), indexer.clone());
        log::debug!(
            "Built index {} with {} entries",
            descriptor,
            indexer.entry_count()
        );
        Ok(descriptor)
    }

    /// Removes an index. The `_id_` index cannot be dropped.
    pub fn drop_index(&self, fields: &SortableFields) -> LiteDocResult<()> {
        if is_id_fields(fields) {
            log::error!(
                "Cannot drop the _id_ index of {}",
                self.inner.collection_name
            );
            return Err(LiteDocError::new(
                &format!(
                    "Cannot drop the _id_ index of collection {}",
                    self.inner.collection_name
                ),
                ErrorKind::InvalidOperation,
            ));
        }

        let Some(indexer) = self.find_indexer(fields) else {
            log::error!(
                "No index on {} in collection {}",
                fields,
                self.inner.collection_name
            );
            return Err(LiteDocError::new(
                &format!(
                    "No index on fields {} in collection {}",
                    fields.field_names().join(", "),
                    self.inner.collection_name
                ),
                ErrorKind::NotFound,
            ));
        };

        let descriptor = indexer.descriptor().clone();
        self.inner.indexers.remove(&descriptor.name());
        indexer.clear();
        log::debug!("Dropped index {}", descriptor);
        Ok(())
    }

    /// Removes every secondary index.
    pub fn drop_all_indexes(&self) {
        for indexer in self.indexers() {
            self.inner.indexers.remove(&indexer.descriptor().name());
            indexer.clear();
        }
        log::debug!("Dropped all indexes of {}", self.inner.collection_name);
    }

    /// Adds the entries of a new document to every index, all or nothing.
    pub fn on_insert(&self, id: &ObjectId, document: &Document) -> LiteDocResult<()> {
        let mut added: KeyChanges = Vec::new();
        for indexer in self.indexers() {
            let keys = indexer.entry_keys(document);
            if let Err(e) = indexer.add_entries(id, &keys) {
                for (indexer, keys) in added {
                    indexer.remove_entries(id, &keys);
                }
                return Err(e);
            }
            added.push((indexer, keys));
        }
        Ok(())
    }

    /// Claims the entries the new version of a document adds. Nothing is
    /// claimed when any index rejects the new version.
    pub fn on_update(
        &self,
        id: &ObjectId,
        old: &Document,
        new: &Document,
    ) -> LiteDocResult<IndexUpdate> {
        let mut update = IndexUpdate {
            id: *id,
            added: Vec::new(),
            stale: Vec::new(),
        };

        for indexer in self.indexers() {
            let old_keys: HashSet<IndexKey> = indexer.entry_keys(old).into_iter().collect();
            let new_keys: HashSet<IndexKey> = indexer.entry_keys(new).into_iter().collect();

            let added = new_keys.difference(&old_keys).cloned().collect_vec();
            let stale = old_keys.difference(&new_keys).cloned().collect_vec();

            if let Err(e) = indexer.add_entries(id, &added) {
                update.rollback();
                return Err(e);
            }
            update.added.push((indexer.clone(), added));
            update.stale.push((indexer, stale));
        }
        Ok(update)
    }

    /// Drops the entries of a removed document.
    pub fn on_remove(&self, document: &Document) {
        let Some(id) = document.id() else {
            return;
        };
        for indexer in self.indexers() {
            let keys = indexer.entry_keys(document);
            indexer.remove_entries(&id, &keys);
        }
    }

    /// Ids whose leading key of `descriptor` lies in `range`.
    pub fn scan(&self, descriptor: &IndexDescriptor, range: &KeyRange) -> LiteDocResult<Vec<ObjectId>> {
        self.indexer_of(descriptor)?.scan(range)
    }

    /// Candidate ids of a text search, `None` when the index cannot narrow
    /// the search.
    pub fn search(
        &self,
        descriptor: &IndexDescriptor,
        filter: &TextFilter,
    ) -> LiteDocResult<Option<Vec<ObjectId>>> {
        self.indexer_of(descriptor)?.search(filter)
    }

    pub fn clear(&self) {
        for indexer in self.indexers() {
            indexer.clear();
        }
    }

    fn indexers(&self) -> Vec<Indexer> {
        self.inner
            .indexers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .sorted_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, indexer)| indexer)
            .collect()
    }

    fn find_indexer(&self, fields: &SortableFields) -> Option<Indexer> {
        self.indexers()
            .into_iter()
            .find(|indexer| indexer.descriptor().index_fields().same_fields(fields))
    }

    fn indexer_of(&self, descriptor: &IndexDescriptor) -> LiteDocResult<Indexer> {
        match self.inner.indexers.get(&descriptor.name()) {
            Some(indexer) => Ok(indexer.clone()),
            None => {
                log::warn!("Index {} no longer exists", descriptor);
                Err(LiteDocError::new(
                    &format!("Index {} no longer exists", descriptor),
                    ErrorKind::IndexMissing,
                ))
            }
        }
    }

    /// Adds the entries of every stored document to `indexer` and returns
    /// the documents a `drop_dups` build has to discard.
    fn backfill(&self, indexer: &Indexer, drop_dups: bool) -> LiteDocResult<Vec<ObjectId>> {
        let mut duplicates = Vec::new();
        for document in self.inner.document_map.scan() {
            let document = document?;
            let Some(id) = document.id() else {
                continue;
            };

            let keys = indexer.entry_keys(&document);
            match indexer.add_entries(&id, &keys) {
                Ok(()) => {}
                Err(e) if drop_dups && e.kind() == &ErrorKind::DuplicateKey => {
                    duplicates.push(id);
                }
                Err(e) => {
                    indexer.clear();
                    return Err(e);
                }
            }
        }
        Ok(duplicates)
    }

    fn indexing_error(&self, message: &str) -> LiteDocError {
        log::error!("{} in collection {}", message, self.inner.collection_name);
        LiteDocError::new(
            &format!("{} in collection {}", message, self.inner.collection_name),
            ErrorKind::IndexingError,
        )
    }
}

fn is_id_fields(fields: &SortableFields) -> bool {
    fields.len() == 1
        && fields.first_field() == Some(DOC_ID)
        && fields.sorting_order()[0].1 == SortOrder::Ascending
}
