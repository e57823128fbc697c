use std::sync::Arc;

use crate::collection::operation::{CollectionOperations, RemoveResult, UpdateResult, WriteResult};
use crate::collection::{Document, ExplainResult, FindOptions, ObjectId, UpdateOptions, UpdateSpec};
use crate::common::stream::DocumentCursor;
use crate::common::{SortOrder, SortableFields, TEXT_INDEX};
use crate::errors::{ErrorKind, LiteDocError, LiteDocResult};
use crate::filter::Filter;
use crate::index::{IndexDescriptor, IndexOptions};

/// A named set of documents with its indexes.
///
/// Handles are cheap to clone and share the same collection. Every
/// document read from a collection is a copy; changing it does not change
/// the stored version.
///
/// # Examples
///
/// ```rust
/// use litedoc::Database;
/// use litedoc::doc;
/// use litedoc::filter::field;
///
/// let db = Database::builder().open().unwrap();
/// let posts = db.collection("posts").unwrap();
/// posts.insert(doc! { title: "Post One", likes: 4 }).unwrap();
///
/// let popular = posts.find(field("likes").gt(3)).unwrap();
/// assert_eq!(popular.count(), 1);
/// ```
#[derive(Clone)]
pub struct DocumentCollection {
    inner: Arc<DocumentCollectionInner>,
}

struct DocumentCollectionInner {
    name: String,
    operations: CollectionOperations,
}

impl DocumentCollection {
    pub(crate) fn new(name: &str) -> Self {
        DocumentCollection {
            inner: Arc::new(DocumentCollectionInner {
                name: name.to_string(),
                operations: CollectionOperations::new(name),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Inserts a document, generating its `_id` when absent.
    ///
    /// Fails with [ErrorKind::DuplicateKey] when the `_id` or a unique index
    /// key is already taken; nothing is written then.
    pub fn insert(&self, document: Document) -> LiteDocResult<WriteResult> {
        self.inner.operations.insert(document)
    }

    /// Inserts documents in order and stops at the first failure.
    pub fn insert_many(&self, documents: Vec<Document>) -> LiteDocResult<WriteResult> {
        self.inner.operations.insert_many(documents)
    }

    pub fn find(&self, filter: Filter) -> LiteDocResult<DocumentCursor> {
        self.inner.operations.find(filter, &FindOptions::new())
    }

    pub fn find_with_options(
        &self,
        filter: Filter,
        find_options: &FindOptions,
    ) -> LiteDocResult<DocumentCursor> {
        self.inner.operations.find(filter, find_options)
    }

    /// The first match of `filter`, or [ErrorKind::NotFound].
    pub fn find_one(&self, filter: Filter) -> LiteDocResult<Document> {
        self.find_one_with_options(filter, &FindOptions::new())
    }

    pub fn find_one_with_options(
        &self,
        filter: Filter,
        find_options: &FindOptions,
    ) -> LiteDocResult<Document> {
        let options = find_options.clone().limit(1);
        let description = filter.to_string();
        match self.inner.operations.find(filter, &options)?.next() {
            Some(result) => result,
            None => {
                log::error!("No document matches {} in {}", description, self.name());
                Err(LiteDocError::new(
                    &format!(
                        "No document matches {} in collection {}",
                        description,
                        self.name()
                    ),
                    ErrorKind::NotFound,
                ))
            }
        }
    }

    pub fn get_by_id(&self, id: &ObjectId) -> LiteDocResult<Document> {
        self.inner.operations.get_by_id(id)
    }

    /// Updates every match of `filter`.
    pub fn update<T: Into<UpdateSpec>>(&self, filter: Filter, spec: T) -> LiteDocResult<UpdateResult> {
        self.update_with_options(filter, spec, &UpdateOptions::default())
    }

    pub fn update_with_options<T: Into<UpdateSpec>>(
        &self,
        filter: Filter,
        spec: T,
        options: &UpdateOptions,
    ) -> LiteDocResult<UpdateResult> {
        self.inner
            .operations
            .update(&filter, &spec.into(), options)
    }

    /// Removes every match of `filter`. Removing nothing is not an error.
    pub fn remove(&self, filter: Filter) -> LiteDocResult<RemoveResult> {
        self.inner.operations.remove(&filter, false)
    }

    /// Removes the first match of `filter`.
    pub fn remove_one(&self, filter: Filter) -> LiteDocResult<RemoveResult> {
        self.inner.operations.remove(&filter, true)
    }

    /// Creates an ascending index on `field_names`.
    pub fn create_index(
        &self,
        field_names: Vec<&str>,
        index_options: &IndexOptions,
    ) -> LiteDocResult<IndexDescriptor> {
        let fields = SortableFields::with_names(field_names)?;
        self.inner.operations.create_index(&fields, index_options)
    }

    /// Creates an index from a key document: `{title: 1, date: -1}` for an
    /// ordered index or `{title: "text"}` for a text index, whatever the
    /// type in `index_options`.
    pub fn create_index_from(
        &self,
        keys: &Document,
        index_options: &IndexOptions,
    ) -> LiteDocResult<IndexDescriptor> {
        let text_fields: Vec<String> = keys
            .leaf_entries()
            .into_iter()
            .filter(|(_, value)| value.as_str() == Some(TEXT_INDEX))
            .map(|(name, _)| name)
            .collect();

        if text_fields.is_empty() {
            let fields = SortableFields::from_document(keys)?;
            return self.inner.operations.create_index(&fields, index_options);
        }

        if text_fields.len() != keys.leaf_entries().len() {
            log::error!("Key document {:?} mixes text and ordered keys", keys);
            return Err(LiteDocError::new(
                &format!(
                    "Key document {:?} of collection {} mixes text and ordered keys",
                    keys,
                    self.name()
                ),
                ErrorKind::ValidationError,
            ));
        }

        let fields = text_fields
            .iter()
            .fold(SortableFields::new(), |fields, name| {
                fields.add_sorted_field(name, SortOrder::Ascending)
            });
        let options = IndexOptions::new(TEXT_INDEX)
            .with_background(index_options.background())
            .with_drop_dups(index_options.drop_dups());
        self.inner.operations.create_index(&fields, &options)
    }

    /// Every index of the collection, `_id_` first.
    pub fn list_indexes(&self) -> Vec<IndexDescriptor> {
        self.inner.operations.list_indexes()
    }

    /// The indexes as key documents, e.g. `{key: {title: 1}, name: "title_1", ..}`.
    pub fn get_indexes(&self) -> Vec<Document> {
        self.list_indexes()
            .iter()
            .map(|descriptor| descriptor.to_document())
            .collect()
    }

    pub fn has_index(&self, field_names: Vec<&str>) -> LiteDocResult<bool> {
        let fields = SortableFields::with_names(field_names)?;
        Ok(self.inner.operations.has_index(&fields))
    }

    pub fn drop_index(&self, field_names: Vec<&str>) -> LiteDocResult<()> {
        let fields = SortableFields::with_names(field_names)?;
        self.inner.operations.drop_index(&fields)
    }

    pub fn drop_all_indexes(&self) {
        self.inner.operations.drop_all_indexes()
    }

    /// Runs `filter` and reports how it was executed.
    pub fn explain(&self, filter: Filter) -> LiteDocResult<ExplainResult> {
        self.inner.operations.explain(&filter)
    }

    /// Number of documents matching `filter`.
    pub fn count(&self, filter: Filter) -> LiteDocResult<usize> {
        self.inner.operations.count(&filter)
    }

    /// Number of documents in the collection.
    pub fn size(&self) -> LiteDocResult<usize> {
        self.inner.operations.size()
    }

    pub fn is_dropped(&self) -> bool {
        self.inner.operations.is_dropped()
    }

    pub(crate) fn dispose(&self) {
        self.inner.operations.dispose();
        log::info!("Dropped collection {}", self.name());
    }
}

impl std::fmt::Debug for DocumentCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DocumentCollection({})", self.name())
    }
}

impl PartialEq for DocumentCollection {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
