use std::sync::Arc;

use crate::collection::{Document, ObjectId, UpdateOptions, UpdateSpec};
use crate::common::LockRegistry;
use crate::errors::{ErrorKind, LiteDocError, LiteDocResult};
use crate::filter::Filter;
use crate::store::DocumentMap;

use super::{IndexManager, ReadOperations, RemoveResult, UpdateResult, WriteResult};

/// Runs inserts, updates and removes.
///
/// Every document write is one atomic unit under the per-document lock of
/// its `_id`: index entries of the new version are claimed first, the store
/// is written next and stale entries are released last.
#[derive(Clone)]
pub(crate) struct WriteOperations {
    collection_name: String,
    document_map: DocumentMap,
    index_manager: IndexManager,
    read_operations: ReadOperations,
    document_locks: Arc<LockRegistry<ObjectId>>,
}

impl WriteOperations {
    pub fn new(
        collection_name: &str,
        document_map: DocumentMap,
        index_manager: IndexManager,
        read_operations: ReadOperations,
    ) -> Self {
        WriteOperations {
            collection_name: collection_name.to_string(),
            document_map,
            index_manager,
            read_operations,
            document_locks: Arc::new(LockRegistry::new()),
        }
    }

    pub fn insert(&self, document: Document) -> LiteDocResult<WriteResult> {
        let id = self.insert_one(document)?;
        Ok(WriteResult::new(vec![id]))
    }

    /// Inserts documents in order, stopping at the first failure. Documents
    /// inserted before the failure stay.
    pub fn insert_many(&self, documents: Vec<Document>) -> LiteDocResult<WriteResult> {
        let mut ids = Vec::with_capacity(documents.len());
        for document in documents {
            ids.push(self.insert_one(document)?);
        }
        log::debug!("Inserted {} documents into {}", ids.len(), self.collection_name);
        Ok(WriteResult::new(ids))
    }

    pub fn update(
        &self,
        filter: &Filter,
        spec: &UpdateSpec,
        options: &UpdateOptions,
    ) -> LiteDocResult<UpdateResult> {
        let limit = options.is_just_once().then_some(1);
        let plan = self.read_operations.create_plan(filter)?;
        let ids = self.read_operations.plan_ids(&plan, limit)?;
        // re-checks use the planned filter, whose text searches are bound
        let filter = plan.filter();

        let mut matched = 0;
        let mut modified = 0;
        for id in ids {
            match self.update_one(&id, filter, spec)? {
                UpdateOutcome::Gone => {}
                UpdateOutcome::Unchanged => matched += 1,
                UpdateOutcome::Modified => {
                    matched += 1;
                    modified += 1;
                }
            }
        }

        if matched == 0 && options.is_upsert() {
            return self.upsert(filter, spec);
        }
        Ok(UpdateResult::new(matched, modified, None))
    }

    pub fn remove(&self, filter: &Filter, just_once: bool) -> LiteDocResult<RemoveResult> {
        let limit = just_once.then_some(1);
        let plan = self.read_operations.create_plan(filter)?;
        let ids = self.read_operations.plan_ids(&plan, limit)?;
        let filter = plan.filter();

        let mut deleted = 0;
        for id in ids {
            if self.remove_one(&id, filter)? {
                deleted += 1;
            }
        }
        Ok(RemoveResult::new(deleted))
    }

    /// Runs `operation` while holding the write lock of `id`.
    fn with_document_lock<T>(&self, id: &ObjectId, operation: impl FnOnce() -> T) -> T {
        let lock = self.document_locks.get_lock(id);
        let result = {
            let _guard = lock.write();
            operation()
        };
        drop(lock);
        self.document_locks.release(id);
        result
    }

    fn insert_one(&self, mut document: Document) -> LiteDocResult<ObjectId> {
        let id = document.ensure_id();
        self.with_document_lock(&id, || self.insert_locked(&id, document))
    }

    /// Inserts the upsert document of `filter` unless a concurrent writer
    /// stored its `_id` first, in which case that document is updated.
    fn upsert(&self, filter: &Filter, spec: &UpdateSpec) -> LiteDocResult<UpdateResult> {
        let mut document = spec.upsert_document(filter)?;
        let id = document.ensure_id();
        self.with_document_lock(&id, || -> LiteDocResult<UpdateResult> {
            if self.document_map.contains(&id)? {
                match self.update_locked(&id, filter, spec)? {
                    UpdateOutcome::Unchanged => return Ok(UpdateResult::new(1, 0, None)),
                    UpdateOutcome::Modified => return Ok(UpdateResult::new(1, 1, None)),
                    // not a match, so inserting reports the duplicate _id
                    UpdateOutcome::Gone => {}
                }
            }

            self.insert_locked(&id, document)?;
            log::debug!("Upserted {} into {}", id, self.collection_name);
            Ok(UpdateResult::new(0, 0, Some(id)))
        })
    }

    fn insert_locked(&self, id: &ObjectId, document: Document) -> LiteDocResult<ObjectId> {
        if self.document_map.contains(id)? {
            log::error!("Duplicate _id {} in collection {}", id, self.collection_name);
            return Err(LiteDocError::new(
                &format!(
                    "Duplicate key error in collection {}, index _id_: _id {} already exists",
                    self.collection_name, id
                ),
                ErrorKind::DuplicateKey,
            ));
        }

        self.index_manager.on_insert(id, &document)?;
        if let Err(e) = self.document_map.insert(document.clone()) {
            self.index_manager.on_remove(&document);
            return Err(e);
        }
        Ok(*id)
    }

    fn update_one(&self, id: &ObjectId, filter: &Filter, spec: &UpdateSpec) -> LiteDocResult<UpdateOutcome> {
        self.with_document_lock(id, || self.update_locked(id, filter, spec))
    }

    fn update_locked(&self, id: &ObjectId, filter: &Filter, spec: &UpdateSpec) -> LiteDocResult<UpdateOutcome> {
        // the document may have changed since the query matched it
        let Some(current) = self.document_map.find(id)? else {
            return Ok(UpdateOutcome::Gone);
        };
        if !filter.apply(&current)? {
            return Ok(UpdateOutcome::Gone);
        }

        let updated = spec.apply(&current)?;
        if updated == current {
            return Ok(UpdateOutcome::Unchanged);
        }

        let index_update = self.index_manager.on_update(id, &current, &updated)?;
        if let Err(e) = self.document_map.update(id, updated) {
            index_update.rollback();
            return Err(e);
        }
        index_update.commit();
        Ok(UpdateOutcome::Modified)
    }

    fn remove_one(&self, id: &ObjectId, filter: &Filter) -> LiteDocResult<bool> {
        self.with_document_lock(id, || self.remove_locked(id, filter))
    }

    fn remove_locked(&self, id: &ObjectId, filter: &Filter) -> LiteDocResult<bool> {
        let Some(current) = self.document_map.find(id)? else {
            return Ok(false);
        };
        if !filter.apply(&current)? {
            return Ok(false);
        }

        let removed = self.document_map.remove(id)?;
        self.index_manager.on_remove(&removed);
        Ok(true)
    }
}

enum UpdateOutcome {
    Gone,
    Unchanged,
    Modified,
}
