use crate::collection::id_generator::{EPOCH, TIMESTAMP_LEFT_SHIFT};
use crate::errors::{ErrorKind, LiteDocError, LiteDocResult};
use crate::ID_GENERATOR;
use chrono::{DateTime, Utc};
use std::fmt::{Debug, Display};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A unique identifier of a document inside a collection.
///
/// Object ids are opaque 64 bit values that sort by creation order: an id
/// created later always compares greater than one created earlier by the
/// same process. The textual form is 16 lowercase hex digits.
///
/// # Examples
///
/// ```rust
/// use litedoc::collection::ObjectId;
///
/// let first = ObjectId::new();
/// let second = ObjectId::new();
/// assert!(first < second);
///
/// let parsed = ObjectId::parse(&first.to_string()).unwrap();
/// assert_eq!(parsed, first);
/// ```
#[derive(PartialEq, Eq, Ord, PartialOrd, Hash, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectId {
    id_value: u64,
}

impl ObjectId {
    /// Sentinel bounds for range scans; never assigned to a document.
    pub(crate) const MIN: ObjectId = ObjectId { id_value: 0 };
    pub(crate) const MAX: ObjectId = ObjectId { id_value: u64::MAX };

    pub fn new() -> Self {
        ObjectId {
            id_value: ID_GENERATOR.next_id(),
        }
    }

    /// Wraps a raw id value. Zero is rejected.
    pub fn create_id(id_value: u64) -> LiteDocResult<ObjectId> {
        if id_value == 0 {
            log::error!("Object id value cannot be zero");
            return Err(LiteDocError::new(
                "Object id value cannot be zero",
                ErrorKind::InvalidId,
            ));
        }
        Ok(ObjectId { id_value })
    }

    /// Parses the 16 hex digit form produced by `Display`.
    pub fn parse(hex: &str) -> LiteDocResult<ObjectId> {
        if hex.len() != 16 {
            log::error!("Invalid object id {:?}, expected 16 hex digits", hex);
            return Err(LiteDocError::new(
                &format!("Invalid object id {:?}, expected 16 hex digits", hex),
                ErrorKind::InvalidId,
            ));
        }
        let id_value = u64::from_str_radix(hex, 16)?;
        ObjectId::create_id(id_value)
    }

    pub fn id_value(&self) -> u64 {
        self.id_value
    }

    /// The creation instant encoded in the id.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let millis = (self.id_value >> TIMESTAMP_LEFT_SHIFT) + EPOCH;
        DateTime::<Utc>::from_timestamp_millis(millis as i64)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        ObjectId::new()
    }
}

impl Debug for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId(\"{:016x}\")", self.id_value)
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.id_value)
    }
}
