use std::fmt::Display;
use std::sync::Arc;

use crate::collection::Document;
use crate::common::{
    SortableFields, Value, DOC_ID, ID_INDEX_NAME, INDEX_NAME_SEPARATOR, TEXT_INDEX, UNIQUE_INDEX,
};

/// Describes an index of a collection: its fields with directions, its
/// type and its options.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexDescriptor {
    inner: Arc<IndexDescriptorInner>,
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct IndexDescriptorInner {
    index_type: String,
    index_fields: SortableFields,
    collection_name: String,
    background: bool,
}

impl IndexDescriptor {
    pub fn new(
        index_type: &str,
        index_fields: SortableFields,
        collection_name: &str,
        background: bool,
    ) -> Self {
        IndexDescriptor {
            inner: Arc::new(IndexDescriptorInner {
                index_type: index_type.to_string(),
                index_fields,
                collection_name: collection_name.to_string(),
                background,
            }),
        }
    }

    /// The implicit unique index on `_id` every collection carries.
    pub(crate) fn id_index(collection_name: &str) -> Self {
        IndexDescriptor::new(
            UNIQUE_INDEX,
            SortableFields::new().add_sorted_field(DOC_ID, crate::common::SortOrder::Ascending),
            collection_name,
            false,
        )
    }

    pub fn index_type(&self) -> &str {
        &self.inner.index_type
    }

    pub fn index_fields(&self) -> &SortableFields {
        &self.inner.index_fields
    }

    pub fn collection_name(&self) -> &str {
        &self.inner.collection_name
    }

    pub fn background(&self) -> bool {
        self.inner.background
    }

    pub fn is_unique(&self) -> bool {
        self.inner.index_type == UNIQUE_INDEX
    }

    pub fn is_text(&self) -> bool {
        self.inner.index_type == TEXT_INDEX
    }

    pub fn is_compound_index(&self) -> bool {
        self.inner.index_fields.len() > 1
    }

    pub fn is_id_index(&self) -> bool {
        self.inner.index_fields.field_names() == [DOC_ID]
    }

    /// The index name: `_id_`, `title_1`, `title_1_date_-1` or
    /// `body_text`.
    pub fn name(&self) -> String {
        if self.is_id_index() {
            ID_INDEX_NAME.to_string()
        } else if self.is_text() {
            self.inner
                .index_fields
                .field_names()
                .iter()
                .map(|name| format!("{}{}{}", name, INDEX_NAME_SEPARATOR, TEXT_INDEX))
                .collect::<Vec<_>>()
                .join(INDEX_NAME_SEPARATOR)
        } else {
            self.inner.index_fields.encoded_names()
        }
    }

    /// The key document: `{title: 1}` or `{body: "text"}`.
    pub fn key_document(&self) -> Document {
        if self.is_text() {
            let mut key = Document::new();
            for name in self.inner.index_fields.field_names() {
                key.put_raw(&name, TEXT_INDEX);
            }
            key
        } else {
            self.inner.index_fields.to_document()
        }
    }

    /// The document reported by `list_indexes`, e.g.
    /// `{key: {title: 1}, name: "title_1", ns: "posts", unique: true}`.
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        document.put_raw("key", Value::Document(self.key_document()));
        document.put_raw("name", self.name());
        document.put_raw("ns", self.collection_name());
        if self.is_unique() && !self.is_id_index() {
            document.put_raw("unique", true);
        }
        if self.background() {
            document.put_raw("background", true);
        }
        document
    }
}

impl Display for IndexDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.inner.collection_name, self.name())
    }
}
