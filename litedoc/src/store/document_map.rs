use crate::collection::{Document, ObjectId};
use crate::common::stream::MapValues;
use crate::errors::{ErrorKind, LiteDocError, LiteDocResult};
use crossbeam_skiplist::SkipMap;
use std::ops::Bound::{Excluded, Unbounded};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The primary storage of a collection: documents keyed by `_id`.
///
/// `DocumentMap` is a concurrent skip list, so reads never block and writers
/// to different ids proceed in parallel. The map itself does not serialize
/// writers of the same id; the collection does that through its per-document
/// lock registry before calling [DocumentMap::insert], [DocumentMap::update]
/// or [DocumentMap::remove].
///
/// Every accessor returns a copy of the stored document.
#[derive(Clone)]
pub struct DocumentMap {
    inner: Arc<DocumentMapInner>,
}

impl DocumentMap {
    pub fn new(collection_name: &str) -> Self {
        DocumentMap {
            inner: Arc::new(DocumentMapInner {
                collection_name: collection_name.to_string(),
                backing_map: SkipMap::new(),
                dropped: AtomicBool::new(false),
            }),
        }
    }

    pub fn collection_name(&self) -> &str {
        &self.inner.collection_name
    }

    /// Stores a new document, generating its `_id` when absent.
    ///
    /// Fails with [ErrorKind::DuplicateKey] if the `_id` is already taken.
    pub fn insert(&self, mut document: Document) -> LiteDocResult<ObjectId> {
        self.check_opened()?;
        let id = document.ensure_id();
        if self.inner.backing_map.contains_key(&id) {
            log::error!(
                "Duplicate _id {} in collection {}",
                id,
                self.inner.collection_name
            );
            return Err(LiteDocError::new(
                &format!(
                    "Duplicate key error in collection {}: _id {} already exists",
                    self.inner.collection_name, id
                ),
                ErrorKind::DuplicateKey,
            ));
        }
        self.inner.backing_map.insert(id, document);
        Ok(id)
    }

    /// Returns the document stored under `id`, or [ErrorKind::NotFound].
    pub fn get(&self, id: &ObjectId) -> LiteDocResult<Document> {
        match self.find(id)? {
            Some(document) => Ok(document),
            None => Err(self.not_found(id)),
        }
    }

    /// Returns the document stored under `id`, if any.
    pub fn find(&self, id: &ObjectId) -> LiteDocResult<Option<Document>> {
        self.check_opened()?;
        Ok(self
            .inner
            .backing_map
            .get(id)
            .map(|entry| entry.value().clone()))
    }

    pub fn contains(&self, id: &ObjectId) -> LiteDocResult<bool> {
        self.check_opened()?;
        Ok(self.inner.backing_map.contains_key(id))
    }

    /// Replaces the document stored under `id`. The stored `_id` is kept.
    pub fn update(&self, id: &ObjectId, mut document: Document) -> LiteDocResult<()> {
        self.check_opened()?;
        if !self.inner.backing_map.contains_key(id) {
            return Err(self.not_found(id));
        }
        document.set_id(*id);
        self.inner.backing_map.insert(*id, document);
        Ok(())
    }

    /// Removes and returns the document stored under `id`.
    pub fn remove(&self, id: &ObjectId) -> LiteDocResult<Document> {
        self.check_opened()?;
        match self.inner.backing_map.remove(id) {
            Some(entry) => Ok(entry.value().clone()),
            None => Err(self.not_found(id)),
        }
    }

    /// A lazy scan over all documents in `_id` order.
    pub fn scan(&self) -> MapValues {
        MapValues::new(self.clone())
    }

    /// A lazy scan over documents whose `_id` is greater than `after`.
    pub fn scan_after(&self, after: ObjectId) -> MapValues {
        MapValues::starting_after(self.clone(), after)
    }

    pub fn size(&self) -> LiteDocResult<usize> {
        self.check_opened()?;
        Ok(self.inner.backing_map.len())
    }

    pub fn is_empty(&self) -> LiteDocResult<bool> {
        self.check_opened()?;
        Ok(self.inner.backing_map.is_empty())
    }

    pub fn first_key(&self) -> LiteDocResult<Option<ObjectId>> {
        self.check_opened()?;
        Ok(self.inner.backing_map.front().map(|entry| *entry.key()))
    }

    pub fn last_key(&self) -> LiteDocResult<Option<ObjectId>> {
        self.check_opened()?;
        Ok(self.inner.backing_map.back().map(|entry| *entry.key()))
    }

    pub fn higher_key(&self, key: &ObjectId) -> LiteDocResult<Option<ObjectId>> {
        self.check_opened()?;
        Ok(self
            .inner
            .backing_map
            .range((Excluded(key), Unbounded))
            .next()
            .map(|entry| *entry.key()))
    }

    pub fn lower_key(&self, key: &ObjectId) -> LiteDocResult<Option<ObjectId>> {
        self.check_opened()?;
        Ok(self
            .inner
            .backing_map
            .range((Unbounded, Excluded(key)))
            .next_back()
            .map(|entry| *entry.key()))
    }

    /// Returns the entry following `key` (or the first entry) in one step.
    pub(crate) fn higher_entry(
        &self,
        key: Option<&ObjectId>,
    ) -> LiteDocResult<Option<(ObjectId, Document)>> {
        self.check_opened()?;
        let entry = match key {
            Some(key) => self.inner.backing_map.range((Excluded(key), Unbounded)).next(),
            None => self.inner.backing_map.front(),
        };
        Ok(entry.map(|e| (*e.key(), e.value().clone())))
    }

    pub fn clear(&self) -> LiteDocResult<()> {
        self.check_opened()?;
        self.inner.backing_map.clear();
        Ok(())
    }

    /// Drops all documents and marks the map unusable.
    pub fn dispose(&self) {
        self.inner.backing_map.clear();
        self.inner.dropped.store(true, Ordering::Release);
    }

    pub fn is_dropped(&self) -> bool {
        self.inner.dropped.load(Ordering::Acquire)
    }

    pub(crate) fn check_opened(&self) -> LiteDocResult<()> {
        if self.is_dropped() {
            log::error!("Collection {} has been dropped", self.inner.collection_name);
            return Err(LiteDocError::new(
                &format!("Collection {} has been dropped", self.inner.collection_name),
                ErrorKind::NotFound,
            ));
        }
        Ok(())
    }

    fn not_found(&self, id: &ObjectId) -> LiteDocError {
        log::error!(
            "No document with _id {} in collection {}",
            id,
            self.inner.collection_name
        );
        LiteDocError::new(
            &format!(
                "No document with _id {} in collection {}",
                id, self.inner.collection_name
            ),
            ErrorKind::NotFound,
        )
    }
}

struct DocumentMapInner {
    collection_name: String,
    backing_map: SkipMap<ObjectId, Document>,
    dropped: AtomicBool,
}
