use crate::collection::ObjectId;
use crate::common::{ReadExecutor, Value, DOC_ID, RESERVED_FIELDS};
use crate::errors::{ErrorKind, LiteDocError, LiteDocResult};
use crate::FIELD_SEPARATOR;
use indexmap::IndexMap;
use itertools::Itertools;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub type FieldVec = SmallVec<[String; 8]>;

/// A record stored in a collection: an ordered mapping from field names to
/// [Value]s.
///
/// Fields keep their insertion order. Every stored document carries a unique
/// `_id` field holding an [ObjectId]; the engine generates one on insert when
/// the caller did not supply it.
///
/// Keys containing the field separator (`.` by default) address embedded
/// documents, so `put("user.name", "John")` creates `{user: {name: "John"}}`
/// and `get("user.name")` reads it back. Numeric segments index into arrays
/// (`comments.0.user`), and a non-numeric segment applied to an array of
/// documents collects the field from every element (`comments.user`).
///
/// Documents returned by queries are independent copies. Changing one never
/// affects the stored version; write it back through an update instead.
///
/// # Examples
///
/// ```rust
/// use litedoc::doc;
/// use litedoc::val;
///
/// let mut post = doc! {
///     title: "Post One",
///     tags: ["news", "events"],
///     user: { name: "John Doe", status: "author" },
/// };
/// post.put("likes", 4).unwrap();
///
/// assert_eq!(post.get("user.name"), Some(val!("John Doe")));
/// assert_eq!(post.get("tags.1"), Some(val!("events")));
/// assert_eq!(post.size(), 4);
/// ```
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    /// Associates `value` with `key`.
    ///
    /// Dotted keys create or descend into embedded documents. An existing
    /// top-level key keeps its position; a new one is appended.
    ///
    /// # Errors
    ///
    /// * [ErrorKind::ValidationError] if the key, or one of its segments, is
    ///   empty.
    /// * [ErrorKind::InvalidId] if `key` is `_id` and `value` is not an
    ///   [ObjectId].
    /// * [ErrorKind::TypeMismatch] if a dotted key crosses a field holding a
    ///   scalar.
    pub fn put<'a, T: Into<Value>>(
        &mut self,
        key: impl Into<Cow<'a, str>>,
        value: T,
    ) -> LiteDocResult<()> {
        let key = key.into();
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(LiteDocError::new(
                "Document does not support empty key",
                ErrorKind::ValidationError,
            ));
        }

        let value = value.into();
        if key == DOC_ID && !value.is_id() {
            log::error!("Document id must be an object id, found {}", value.type_name());
            return Err(LiteDocError::new(
                &format!("Document id must be an object id, found {}", value.type_name()),
                ErrorKind::InvalidId,
            ));
        }

        if self.is_embedded(&key) {
            let splits = split_key(&key);
            self.deep_put(&splits, value)
        } else {
            self.data.insert(key.into_owned(), value);
            Ok(())
        }
    }

    /// Inserts a top-level entry as is, without splitting the key.
    ///
    /// Query, projection and sort documents use this to carry dotted paths
    /// (`{"user.name": 1}`) as literal keys.
    pub fn put_raw<T: Into<Value>>(&mut self, key: &str, value: T) {
        let value = value.into();
        self.data.insert(key.to_string(), value);
    }

    /// Returns the value at `key`, or `None` when the field is absent.
    ///
    /// A field explicitly set to null returns `Some(Value::Null)`.
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.data.get(key) {
            return Some(value.clone());
        }

        if self.is_embedded(key) {
            let splits = split_key(key);
            let first = self.data.get(splits[0])?;
            recursive_get(first, &splits[1..])
        } else {
            None
        }
    }

    /// Returns the value at `key`, or [Value::Null] when the field is absent.
    pub fn get_value(&self, key: &str) -> Value {
        self.get(key).unwrap_or(Value::Null)
    }

    /// Removes the value at `key` (dotted keys supported) and returns it.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        if self.data.contains_key(key) {
            return self.data.shift_remove(key);
        }

        if self.is_embedded(key) {
            let splits = split_key(key);
            self.deep_remove(&splits)
        } else {
            None
        }
    }

    /// Returns the `_id` of this document, if it has one.
    pub fn id(&self) -> Option<ObjectId> {
        self.data.get(DOC_ID).and_then(|v| v.as_id()).copied()
    }

    pub fn has_id(&self) -> bool {
        self.data.contains_key(DOC_ID)
    }

    /// Returns the existing `_id` or generates one and stores it as the
    /// first field.
    pub(crate) fn ensure_id(&mut self) -> ObjectId {
        match self.id() {
            Some(id) => id,
            None => {
                let id = ObjectId::new();
                self.data.shift_insert(0, DOC_ID.to_string(), Value::Id(id));
                id
            }
        }
    }

    /// Sets `_id` as the first field, replacing any existing one.
    pub(crate) fn set_id(&mut self, id: ObjectId) {
        self.data.shift_remove(DOC_ID);
        self.data.shift_insert(0, DOC_ID.to_string(), Value::Id(id));
    }

    /// Checks for a top-level key only.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Checks for a field, following dotted paths.
    pub fn contains_field(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Returns the dotted paths of every leaf field, skipping `_id`.
    pub fn fields(&self) -> FieldVec {
        self.leaf_entries()
            .into_iter()
            .map(|(name, _)| name)
            .filter(|name| !RESERVED_FIELDS.contains(&name.as_str()))
            .collect()
    }

    /// Flattens embedded documents into `(dotted path, value)` pairs.
    /// Arrays are leaves.
    pub(crate) fn leaf_entries(&self) -> Vec<(String, Value)> {
        let separator = FIELD_SEPARATOR.read_with(|sep| sep.clone());
        let mut entries = Vec::with_capacity(self.data.len());
        self.collect_leaves("", &separator, &mut entries);
        entries
    }

    fn collect_leaves(&self, prefix: &str, separator: &str, entries: &mut Vec<(String, Value)>) {
        for (key, value) in self.data.iter() {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}{}{}", prefix, separator, key)
            };

            match value {
                Value::Document(doc) if !doc.is_empty() => {
                    doc.collect_leaves(&path, separator, entries)
                }
                _ => entries.push((path, value.clone())),
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Merges `other` into this document. Embedded documents present on
    /// both sides are merged recursively; any other value is overwritten.
    pub fn merge(&mut self, other: &Document) {
        for (key, value) in other.data.iter() {
            match (self.data.get_mut(key), value) {
                (Some(Value::Document(existing)), Value::Document(incoming)) => {
                    existing.merge(incoming)
                }
                _ => {
                    self.data.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// Renders the document as indented JSON-like text.
    pub fn to_pretty_json(&self, indent: usize) -> String {
        if self.data.is_empty() {
            return "{}".to_string();
        }

        let indent_str = " ".repeat(indent + 2);
        let mut json_string = String::with_capacity(self.data.len() * 30 + indent * 2);
        json_string.push_str("{\n");
        for (i, (key, value)) in self.data.iter().enumerate() {
            if i > 0 {
                json_string.push_str(",\n");
            }
            let rendered = match value {
                Value::Document(doc) => doc.to_pretty_json(indent + 2),
                other => other.to_string(),
            };
            json_string.push_str(&format!("{}\"{}\": {}", indent_str, key, rendered));
        }
        json_string.push_str(&format!("\n{}}}", " ".repeat(indent)));
        json_string
    }

    pub(crate) fn write_compact(&self, f: &mut dyn std::fmt::Write) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: ", key)?;
            value.write_compact(f)?;
        }
        write!(f, "}}")
    }

    fn is_embedded(&self, key: &str) -> bool {
        FIELD_SEPARATOR.read_with(|sep| key.contains(sep.as_str()))
    }

    fn deep_put(&mut self, splits: &[&str], value: Value) -> LiteDocResult<()> {
        let key = splits[0];
        if key.is_empty() {
            log::error!("Document does not support empty key segment");
            return Err(LiteDocError::new(
                "Document does not support empty key segment",
                ErrorKind::ValidationError,
            ));
        }

        if splits.len() == 1 {
            self.data.insert(key.to_string(), value);
            return Ok(());
        }

        let remaining = &splits[1..];
        match self.data.get_mut(key) {
            Some(Value::Document(nested)) => nested.deep_put(remaining, value),
            Some(Value::Array(arr)) => array_put(key, arr, remaining, value),
            Some(Value::Null) | None => {
                let mut nested = Document::new();
                nested.deep_put(remaining, value)?;
                self.data.insert(key.to_string(), Value::Document(nested));
                Ok(())
            }
            Some(other) => {
                log::error!(
                    "Cannot create field {} inside {} field {}",
                    remaining.join("."),
                    other.type_name(),
                    key
                );
                Err(LiteDocError::new(
                    &format!(
                        "Cannot create field {} inside {} field {}",
                        remaining.join("."),
                        other.type_name(),
                        key
                    ),
                    ErrorKind::TypeMismatch,
                ))
            }
        }
    }

    fn deep_remove(&mut self, splits: &[&str]) -> Option<Value> {
        let key = splits[0];
        if splits.len() == 1 {
            return self.data.shift_remove(key);
        }

        match self.data.get_mut(key)? {
            Value::Document(nested) => nested.deep_remove(&splits[1..]),
            Value::Array(arr) => {
                let index = splits[1].parse::<usize>().ok()?;
                if splits.len() == 2 {
                    if index < arr.len() {
                        Some(arr.remove(index))
                    } else {
                        None
                    }
                } else {
                    match arr.get_mut(index)? {
                        Value::Document(nested) => nested.deep_remove(&splits[2..]),
                        _ => None,
                    }
                }
            }
            _ => None,
        }
    }
}

fn split_key(key: &str) -> Vec<&str> {
    FIELD_SEPARATOR.read_with(|sep| key.split(sep.as_str()).collect())
}

fn recursive_get(value: &Value, splits: &[&str]) -> Option<Value> {
    if splits.is_empty() {
        return Some(value.clone());
    }

    let key = splits[0];
    match value {
        Value::Document(doc) => {
            let next = doc.data.get(key)?;
            recursive_get(next, &splits[1..])
        }
        Value::Array(arr) => {
            if let Ok(index) = key.parse::<usize>() {
                let next = arr.get(index)?;
                recursive_get(next, &splits[1..])
            } else {
                decompose(arr, splits)
            }
        }
        _ => None,
    }
}

/// Collects `splits` from every element of `arr`, flattening nested arrays
/// and dropping duplicates.
fn decompose(arr: &[Value], splits: &[&str]) -> Option<Value> {
    let mut items: Vec<Value> = Vec::with_capacity(arr.len());
    for item in arr {
        match recursive_get(item, splits) {
            Some(Value::Array(values)) => items.extend(values),
            Some(value) => items.push(value),
            None => {}
        }
    }

    if items.is_empty() {
        None
    } else {
        Some(Value::Array(items.into_iter().unique().collect()))
    }
}

fn array_put(key: &str, arr: &mut [Value], splits: &[&str], value: Value) -> LiteDocResult<()> {
    let index = match splits[0].parse::<usize>() {
        Ok(index) if index < arr.len() => index,
        _ => {
            log::error!("Invalid array index {} for array field {}", splits[0], key);
            return Err(LiteDocError::new(
                &format!("Invalid array index {} for array field {}", splits[0], key),
                ErrorKind::TypeMismatch,
            ));
        }
    };

    if splits.len() == 1 {
        arr[index] = value;
        return Ok(());
    }

    match &mut arr[index] {
        Value::Document(nested) => nested.deep_put(&splits[1..], value),
        Value::Null => {
            let mut nested = Document::new();
            nested.deep_put(&splits[1..], value)?;
            arr[index] = Value::Document(nested);
            Ok(())
        }
        other => {
            log::error!(
                "Cannot create field {} inside {} element of {}",
                splits[1],
                other.type_name(),
                key
            );
            Err(LiteDocError::new(
                &format!(
                    "Cannot create field {} inside {} element of {}",
                    splits[1],
                    other.type_name(),
                    key
                ),
                ErrorKind::TypeMismatch,
            ))
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Document {}

impl PartialOrd for Document {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Document {
    fn cmp(&self, other: &Self) -> Ordering {
        self.data.iter().cmp(other.data.iter())
    }
}

impl Hash for Document {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.len().hash(state);
        for (key, value) in self.data.iter() {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.write_compact(f)
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_pretty_json(0))
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Document {
            data: iter.into_iter().collect(),
        }
    }
}

pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// Keys may be bare identifiers or string literals (required for dotted keys
/// and operator keys such as `"$set"`). Values are expressions, negative
/// literals, nested `{ .. }` documents or `[ .. ]` arrays. Other multi-token
/// expressions must be wrapped in parentheses.
///
/// # Examples
///
/// ```rust
/// use litedoc::doc;
///
/// let empty = doc! {};
/// let post = doc! {
///     title: "Post One",
///     likes: 4,
///     delta: -1,
///     user: { name: "John Doe", rank: -2 },
///     tags: ["news", "events"],
///     "$set": { body: "changed" },
/// };
/// assert_eq!(post.size(), 6);
/// ```
#[macro_export]
macro_rules! doc {
    ({}) => {
        $crate::collection::Document::new()
    };

    () => {
        $crate::collection::Document::new()
    };

    (@munch $doc:ident; $(,)?) => {};

    (@munch $doc:ident; $key:tt : - $value:tt $(, $($rest:tt)*)?) => {
        $crate::doc!(@put $doc; $key; - $value);
        $crate::doc!(@munch $doc; $($($rest)*)?);
    };

    (@munch $doc:ident; $key:tt : $value:tt $(, $($rest:tt)*)?) => {
        $crate::doc!(@put $doc; $key; $value);
        $crate::doc!(@munch $doc; $($($rest)*)?);
    };

    (@put $doc:ident; $key:tt; $($value:tt)+) => {
        $doc.put(&$crate::collection::normalize(stringify!($key)), $crate::doc_value!($($value)+))
            .expect(&format!("Failed to put value {} in document", stringify!($($value)+)));
    };

    ({ $($tokens:tt)* }) => {
        $crate::doc!($($tokens)*)
    };

    ($($tokens:tt)+) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::collection::Document::new();
            $crate::doc!(@munch doc; $($tokens)+);
            doc
        }
    };
}

/// Helper macro to convert values for the doc! macro.
#[macro_export]
macro_rules! doc_value {
    (@array [$($items:expr),*] $(,)?) => {
        vec![$($items),*]
    };

    (@array [$($items:expr),*] - $value:tt $(, $($rest:tt)*)?) => {
        $crate::doc_value!(@array [$($items,)* $crate::doc_value!(- $value)] $($($rest)*)?)
    };

    (@array [$($items:expr),*] $value:tt $(, $($rest:tt)*)?) => {
        $crate::doc_value!(@array [$($items,)* $crate::doc_value!($value)] $($($rest)*)?)
    };

    ({ $($tokens:tt)* }) => {
        $crate::common::Value::Document($crate::doc!{ $($tokens)* })
    };

    ([ $($tokens:tt)* ]) => {
        $crate::common::Value::Array($crate::doc_value!(@array [] $($tokens)*))
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::val;

    fn set_up() -> Document {
        doc! {
            score: 1034,
            location: {
                state: "NY",
                city: "New York",
                address: {
                    line1: "40",
                    house: ["1", "2", "3"],
                    zip: 10001,
                },
            },
            category: ["food", "produce", "grocery"],
            obj_array: [
                { value: 1 },
                { value: 2 },
                { value: 1 },
            ]
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("\"ABC\""), "ABC");
        assert_eq!(normalize("ABC"), "ABC");
    }

    #[test]
    fn test_insertion_order_preserved() {
        let doc = doc! { c: 1, a: 2, b: 3 };
        let keys: Vec<&String> = doc.keys().collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_doc_macro_negative_values() {
        let doc = doc! {
            title: -1,
            score: -2.5,
            nested: { views: -3, inner: { likes: -4 } },
            deltas: [-1, 2, -3],
            empty: [],
            grouped: (-5),
        };
        assert_eq!(doc.get("title"), Some(val!(-1)));
        assert_eq!(doc.get("score"), Some(val!(-2.5)));
        assert_eq!(doc.get("nested.views"), Some(val!(-3)));
        assert_eq!(doc.get("nested.inner.likes"), Some(val!(-4)));
        assert_eq!(
            doc.get("deltas"),
            Some(Value::Array(vec![val!(-1), val!(2), val!(-3)]))
        );
        assert_eq!(doc.get("empty"), Some(Value::Array(vec![])));
        assert_eq!(doc.get("grouped"), Some(val!(-5)));
    }

    #[test]
    fn test_put_empty_key() {
        let mut doc = Document::new();
        let result = doc.put("", 1);
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_put_invalid_id() {
        let mut doc = Document::new();
        let result = doc.put(DOC_ID, "abc");
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::InvalidId);

        let id = ObjectId::new();
        doc.put(DOC_ID, id).unwrap();
        assert_eq!(doc.id(), Some(id));
    }

    #[test]
    fn test_get_embedded() {
        let doc = set_up();
        assert_eq!(doc.get("location.state"), Some(val!("NY")));
        assert_eq!(doc.get("location.address.zip"), Some(val!(10001)));
        assert_eq!(doc.get("location.address.house.1"), Some(val!("2")));
        assert_eq!(doc.get("location.address.house.5"), None);
        assert_eq!(doc.get("location.country"), None);
        assert_eq!(doc.get("score.value"), None);
    }

    #[test]
    fn test_get_decomposed_array() {
        let doc = set_up();
        assert_eq!(doc.get("obj_array.value"), Some(val!(vec![1, 2])));
        assert_eq!(doc.get("obj_array.missing"), None);
    }

    #[test]
    fn test_get_null_vs_missing() {
        let doc = doc! { a: (Value::Null) };
        assert_eq!(doc.get("a"), Some(Value::Null));
        assert_eq!(doc.get("b"), None);
        assert_eq!(doc.get_value("b"), Value::Null);
    }

    #[test]
    fn test_put_embedded_creates_documents() {
        let mut doc = Document::new();
        doc.put("user.name", "John").unwrap();
        doc.put("user.status", "author").unwrap();
        assert_eq!(doc, doc! { user: { name: "John", status: "author" } });
    }

    #[test]
    fn test_put_embedded_into_scalar_fails() {
        let mut doc = doc! { title: "x" };
        let result = doc.put("title.sub", 1);
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_put_into_array_element() {
        let mut doc = set_up();
        doc.put("obj_array.1.value", 20).unwrap();
        assert_eq!(doc.get("obj_array.1.value"), Some(val!(20)));

        let result = doc.put("obj_array.9.value", 1);
        assert!(result.is_err());
    }

    #[test]
    fn test_remove() {
        let mut doc = set_up();
        assert_eq!(doc.remove("score"), Some(val!(1034)));
        assert_eq!(doc.remove("location.address.zip"), Some(val!(10001)));
        assert!(!doc.contains_field("location.address.zip"));
        assert_eq!(doc.remove("category.0"), Some(val!("food")));
        assert_eq!(doc.get("category.0"), Some(val!("produce")));
        assert_eq!(doc.remove("nothing.here"), None);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut doc = doc! { a: 1, b: 2, c: 3 };
        doc.remove("b");
        let keys: Vec<&String> = doc.keys().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_fields() {
        let mut doc = set_up();
        doc.ensure_id();
        let fields = doc.fields();
        assert!(fields.contains(&"location.address.zip".to_string()));
        assert!(fields.contains(&"category".to_string()));
        assert!(!fields.contains(&"_id".to_string()));
    }

    #[test]
    fn test_ensure_id_is_first_field() {
        let mut doc = doc! { title: "x" };
        let id = doc.ensure_id();
        assert_eq!(doc.keys().next().unwrap(), DOC_ID);
        assert_eq!(doc.ensure_id(), id);
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        let a = doc! { x: 1, y: 2 };
        let b = doc! { y: 2, x: 1 };
        assert_ne!(a, b);
        assert_eq!(a, doc! { x: 1, y: 2 });
    }

    #[test]
    fn test_merge() {
        let mut doc = doc! { a: 1, nested: { x: 1 } };
        doc.merge(&doc! { b: 2, nested: { y: 2 } });
        assert_eq!(doc, doc! { a: 1, nested: { x: 1, y: 2 }, b: 2 });
    }

    #[test]
    fn test_display_and_debug() {
        let doc = doc! { a: 1, b: { c: "d" } };
        assert_eq!(format!("{:?}", doc), "{a: 1, b: {c: \"d\"}}");
        assert_eq!(
            format!("{}", doc),
            "{\n  \"a\": 1,\n  \"b\": {\n    \"c\": \"d\"\n  }\n}"
        );
        assert_eq!(format!("{}", Document::new()), "{}");
    }

    #[test]
    fn test_from_iterator() {
        let doc: Document = vec![("a".to_string(), val!(1))].into_iter().collect();
        assert_eq!(doc, doc! { a: 1 });
    }
}
