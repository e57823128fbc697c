use crossbeam_skiplist::SkipSet;
use itertools::Itertools;
use std::ops::Bound::{Included, Unbounded};

use crate::collection::{Document, ObjectId};
use crate::common::{SortableFields, Value};

use super::KeyRange;

/// A composite index key: one value per indexed field.
pub(crate) type IndexKey = Vec<Value>;

/// The ordered entries of one index: `(key, _id)` pairs in a lock-free skip
/// set.
///
/// Keeping the id inside the set element means every key owns an ordered
/// run of ids without a mutable posting list, so concurrent writers of
/// different documents never contend.
pub(crate) struct IndexEntry {
    entries: SkipSet<(IndexKey, ObjectId)>,
}

impl IndexEntry {
    pub fn new() -> Self {
        IndexEntry {
            entries: SkipSet::new(),
        }
    }

    pub fn insert(&self, key: IndexKey, id: ObjectId) {
        self.entries.insert((key, id));
    }

    pub fn remove(&self, key: &IndexKey, id: &ObjectId) {
        // SkipSet::remove needs an owned element to borrow from
        self.entries.remove(&(key.clone(), *id));
    }

    /// The ids stored under exactly `key`, in `_id` order.
    pub fn get(&self, key: &IndexKey) -> Vec<ObjectId> {
        let start = (key.clone(), ObjectId::MIN);
        let end = (key.clone(), ObjectId::MAX);
        self.entries
            .range((Included(&start), Included(&end)))
            .map(|entry| entry.value().1)
            .collect()
    }

    /// Returns `true` if a document other than `id` holds `key`.
    pub fn is_taken_by_other(&self, key: &IndexKey, id: &ObjectId) -> bool {
        self.get(key).iter().any(|other| other != id)
    }

    /// The ids of every entry whose leading key lies in `range`, in key
    /// order. Multikey documents may repeat.
    pub fn scan(&self, range: &KeyRange) -> Vec<ObjectId> {
        let start = (vec![range.scan_start()], ObjectId::MIN);
        let mut ids = Vec::new();
        for entry in self.entries.range((Included(&start), Unbounded)) {
            let (key, id) = entry.value();
            let Some(leading) = key.first() else {
                continue;
            };
            if range.is_past_upper(leading) {
                break;
            }
            if range.contains(leading) {
                ids.push(*id);
            }
        }
        ids
    }

    /// The ids of entries whose single string key starts with `prefix`.
    pub fn scan_prefix(&self, prefix: &str) -> Vec<ObjectId> {
        let start = (vec![Value::String(prefix.to_string())], ObjectId::MIN);
        let mut ids = Vec::new();
        for entry in self.entries.range((Included(&start), Unbounded)) {
            let (key, id) = entry.value();
            match key.first() {
                Some(Value::String(s)) if s.starts_with(prefix) => ids.push(*id),
                _ => break,
            }
        }
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for IndexEntry {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes the index keys of a document.
///
/// A missing field keys as `null`. An array keys once per distinct element
/// (an empty array keys as `null`), and compound keys take the cartesian
/// product across fields.
pub(crate) fn index_keys(document: &Document, fields: &SortableFields) -> Vec<IndexKey> {
    fields
        .sorting_order()
        .iter()
        .map(|(name, _)| match document.get_value(name) {
            Value::Array(items) if items.is_empty() => vec![Value::Null],
            Value::Array(items) => items.into_iter().unique().collect(),
            other => vec![other],
        })
        .multi_cartesian_product()
        .collect()
}
