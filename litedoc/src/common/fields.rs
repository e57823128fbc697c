use crate::collection::Document;
use crate::common::{SortOrder, Value, INDEX_NAME_SEPARATOR};
use crate::errors::{ErrorKind, LiteDocError, LiteDocResult};
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;

/// An ordered list of field names, each with a direction.
///
/// `SortableFields` describes both the keys of an index and the sort keys of
/// a query. Field names may be dotted paths into embedded documents.
///
/// # Examples
///
/// ```ignore
/// let fields = SortableFields::with_names(vec!["title"])?;
/// let fields = SortableFields::new()
///     .add_sorted_field("title", SortOrder::Ascending)
///     .add_sorted_field("date", SortOrder::Descending);
/// ```
#[derive(Clone, Debug)]
pub struct SortableFields {
    inner: Arc<SortableFieldsInner>,
}

#[derive(Debug, Default)]
struct SortableFieldsInner {
    sorting_order: Vec<(String, SortOrder)>,
}

impl SortableFields {
    pub fn new() -> Self {
        SortableFields {
            inner: Arc::new(SortableFieldsInner::default()),
        }
    }

    /// Creates ascending fields from the given names.
    ///
    /// Fails with [ErrorKind::ValidationError] if `field_names` is empty or
    /// contains an empty name.
    pub fn with_names(field_names: Vec<&str>) -> LiteDocResult<SortableFields> {
        if field_names.is_empty() {
            log::error!("Field names cannot be empty");
            return Err(LiteDocError::new(
                "Field names cannot be empty",
                ErrorKind::ValidationError,
            ));
        }

        let mut fields = SortableFields::new();
        for name in field_names {
            if name.is_empty() {
                log::error!("Field name cannot be empty");
                return Err(LiteDocError::new(
                    "Field name cannot be empty",
                    ErrorKind::ValidationError,
                ));
            }
            fields = fields.add_sorted_field(name, SortOrder::Ascending);
        }
        Ok(fields)
    }

    /// Parses a key document such as `{title: 1, date: -1}`.
    ///
    /// Embedded documents are flattened into dotted paths, so
    /// `{"components.area": 1}` names the `components.area` field.
    ///
    /// Values must be `1` or `-1`. Fails with [ErrorKind::ValidationError]
    /// otherwise or when the document is empty.
    pub fn from_document(keys: &Document) -> LiteDocResult<SortableFields> {
        if keys.is_empty() {
            log::error!("Key document cannot be empty");
            return Err(LiteDocError::new(
                "Key document cannot be empty",
                ErrorKind::ValidationError,
            ));
        }

        let mut fields = SortableFields::new();
        for (name, value) in keys.leaf_entries() {
            let order = match value.as_i64() {
                Some(1) => SortOrder::Ascending,
                Some(-1) => SortOrder::Descending,
                _ => {
                    log::error!("Invalid direction {} for field {}", value, name);
                    return Err(LiteDocError::new(
                        &format!("Invalid direction {} for field {}, expected 1 or -1", value, name),
                        ErrorKind::ValidationError,
                    ));
                }
            };
            fields = fields.add_sorted_field(&name, order);
        }
        Ok(fields)
    }

    pub fn add_sorted_field(self, field_name: &str, sort_order: SortOrder) -> Self {
        let mut sorting_order = self.inner.sorting_order.clone();
        sorting_order.push((field_name.to_string(), sort_order));
        SortableFields {
            inner: Arc::new(SortableFieldsInner { sorting_order }),
        }
    }

    pub fn field_names(&self) -> Vec<String> {
        self.inner
            .sorting_order
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn first_field(&self) -> Option<&str> {
        self.inner.sorting_order.first().map(|(name, _)| name.as_str())
    }

    pub fn sorting_order(&self) -> &[(String, SortOrder)] {
        &self.inner.sorting_order
    }

    pub fn len(&self) -> usize {
        self.inner.sorting_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.sorting_order.is_empty()
    }

    /// The key document form, e.g. `{title: 1, date: -1}`.
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        for (name, order) in self.sorting_order() {
            document.put_raw(name, Value::I64(order.as_i64()));
        }
        document
    }

    /// Encodes the fields as an index name fragment, e.g. `title_1_date_-1`.
    pub fn encoded_names(&self) -> String {
        self.inner
            .sorting_order
            .iter()
            .map(|(name, order)| format!("{}{}{}", name, INDEX_NAME_SEPARATOR, order.as_i64()))
            .collect::<Vec<_>>()
            .join(INDEX_NAME_SEPARATOR)
    }

    /// Returns `true` if both lists name the same fields in the same order,
    /// ignoring directions.
    pub fn same_fields(&self, other: &SortableFields) -> bool {
        self.len() == other.len()
            && self
                .sorting_order()
                .iter()
                .zip(other.sorting_order())
                .all(|((a, _), (b, _))| a == b)
    }
}

impl Default for SortableFields {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SortableFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encoded_names())
    }
}

impl PartialEq for SortableFields {
    fn eq(&self, other: &Self) -> bool {
        self.sorting_order() == other.sorting_order()
    }
}

impl Eq for SortableFields {}

impl Hash for SortableFields {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.sorting_order().hash(state);
    }
}
