use std::any::Any;
use std::fmt::Display;

use crate::collection::Document;
use crate::common::Value;
use crate::errors::LiteDocResult;
use crate::index::KeyRange;

use super::{match_value, FilterProvider};

/// Matches every document.
pub(crate) struct AllFilter;

impl FilterProvider for AllFilter {
    fn apply(&self, _document: &Document) -> LiteDocResult<bool> {
        Ok(true)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Display for AllFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AllFilter")
    }
}

/// Matches documents where a field equals a value.
///
/// A missing field reads as `null`, so `eq(Value::Null)` matches documents
/// without the field. When the field holds an array, the filter matches if
/// the array equals the value or any element does.
pub(crate) struct EqualsFilter {
    field_name: String,
    field_value: Value,
}

impl EqualsFilter {
    #[inline]
    pub(crate) fn new(field_name: String, field_value: Value) -> Self {
        EqualsFilter {
            field_name,
            field_value,
        }
    }
}

impl Display for EqualsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} == {})", self.field_name, self.field_value)
    }
}

impl FilterProvider for EqualsFilter {
    #[inline]
    fn apply(&self, document: &Document) -> LiteDocResult<bool> {
        let value = document.get_value(&self.field_name);
        Ok(match_value(&value, &|v| v == &self.field_value))
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field_name)
    }

    fn index_range(&self) -> Option<KeyRange> {
        // index keys hold array elements, never whole arrays
        if self.field_value.is_array() {
            None
        } else {
            Some(KeyRange::eq(self.field_value.clone()))
        }
    }

    fn equality_value(&self) -> Option<&Value> {
        Some(&self.field_value)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Matches documents where a field does not equal a value, including
/// documents without the field.
pub(crate) struct NotEqualsFilter {
    field_name: String,
    field_value: Value,
}

impl NotEqualsFilter {
    #[inline]
    pub(crate) fn new(field_name: String, field_value: Value) -> Self {
        NotEqualsFilter {
            field_name,
            field_value,
        }
    }
}

impl Display for NotEqualsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} != {})", self.field_name, self.field_value)
    }
}

impl FilterProvider for NotEqualsFilter {
    fn apply(&self, document: &Document) -> LiteDocResult<bool> {
        let value = document.get_value(&self.field_name);
        Ok(!match_value(&value, &|v| v == &self.field_value))
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field_name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Matches documents where a field equals any of the given values.
pub(crate) struct InFilter {
    field_name: String,
    field_values: Vec<Value>,
}

impl InFilter {
    pub(crate) fn new(field_name: String, field_values: Vec<Value>) -> Self {
        InFilter {
            field_name,
            field_values,
        }
    }

    pub(crate) fn matches(&self, document: &Document) -> bool {
        let value = document.get_value(&self.field_name);
        match_value(&value, &|v| self.field_values.iter().any(|candidate| candidate == v))
    }
}

impl Display for InFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} in {})", self.field_name, Value::Array(self.field_values.clone()))
    }
}

impl FilterProvider for InFilter {
    fn apply(&self, document: &Document) -> LiteDocResult<bool> {
        Ok(self.matches(document))
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field_name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Matches documents where a field equals none of the given values.
pub(crate) struct NotInFilter {
    inner: InFilter,
}

impl NotInFilter {
    pub(crate) fn new(field_name: String, field_values: Vec<Value>) -> Self {
        NotInFilter {
            inner: InFilter::new(field_name, field_values),
        }
    }
}

impl Display for NotInFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({} not in {})",
            self.inner.field_name,
            Value::Array(self.inner.field_values.clone())
        )
    }
}

impl FilterProvider for NotInFilter {
    fn apply(&self, document: &Document) -> LiteDocResult<bool> {
        Ok(!self.inner.matches(document))
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.inner.field_name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Matches documents by presence of a field. A field explicitly set to
/// `null` exists.
pub(crate) struct ExistsFilter {
    field_name: String,
    exists: bool,
}

impl ExistsFilter {
    pub(crate) fn new(field_name: String, exists: bool) -> Self {
        ExistsFilter { field_name, exists }
    }
}

impl Display for ExistsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} exists {})", self.field_name, self.exists)
    }
}

impl FilterProvider for ExistsFilter {
    fn apply(&self, document: &Document) -> LiteDocResult<bool> {
        Ok(document.get(&self.field_name).is_some() == self.exists)
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field_name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
