use crate::collection::{Document, ObjectId};
use crate::common::Value;
use chrono::{DateTime, Utc};
use std::fmt::Display;
use std::ops::Bound;

/// A contiguous range of index keys selected by an equality or comparison
/// predicate.
///
/// The range never crosses a type bracket: `$gt: 5` selects numbers greater
/// than five, never strings or dates, matching the comparison semantics of
/// the filters.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyRange {
    lower: Bound<Value>,
    upper: Bound<Value>,
}

impl KeyRange {
    pub fn eq(value: Value) -> Self {
        KeyRange {
            lower: Bound::Included(value.clone()),
            upper: Bound::Included(value),
        }
    }

    pub fn gt(value: Value) -> Self {
        KeyRange {
            lower: Bound::Excluded(value),
            upper: Bound::Unbounded,
        }
    }

    pub fn gte(value: Value) -> Self {
        KeyRange {
            lower: Bound::Included(value),
            upper: Bound::Unbounded,
        }
    }

    pub fn lt(value: Value) -> Self {
        KeyRange {
            lower: Bound::Unbounded,
            upper: Bound::Excluded(value),
        }
    }

    pub fn lte(value: Value) -> Self {
        KeyRange {
            lower: Bound::Unbounded,
            upper: Bound::Included(value),
        }
    }

    pub fn lower(&self) -> Bound<&Value> {
        self.lower.as_ref()
    }

    pub fn upper(&self) -> Bound<&Value> {
        self.upper.as_ref()
    }

    pub fn is_point(&self) -> bool {
        matches!((&self.lower, &self.upper), (Bound::Included(a), Bound::Included(b)) if a == b)
    }

    /// The type rank every key in this range shares.
    pub fn type_rank(&self) -> u8 {
        match (&self.lower, &self.upper) {
            (Bound::Included(v), _) | (Bound::Excluded(v), _) => v.type_rank(),
            (_, Bound::Included(v)) | (_, Bound::Excluded(v)) => v.type_rank(),
            (Bound::Unbounded, Bound::Unbounded) => 0,
        }
    }

    /// The smallest key a scan of this range has to visit.
    pub fn scan_start(&self) -> Value {
        match &self.lower {
            Bound::Included(v) | Bound::Excluded(v) => v.clone(),
            Bound::Unbounded => bracket_floor(self.type_rank()),
        }
    }

    /// Returns `true` if `value` lies within the range and its type bracket.
    pub fn contains(&self, value: &Value) -> bool {
        if value.type_rank() != self.type_rank() {
            return false;
        }

        let above_lower = match &self.lower {
            Bound::Included(low) => value >= low,
            Bound::Excluded(low) => value > low,
            Bound::Unbounded => true,
        };
        let below_upper = match &self.upper {
            Bound::Included(high) => value <= high,
            Bound::Excluded(high) => value < high,
            Bound::Unbounded => true,
        };
        above_lower && below_upper
    }

    /// Returns `true` once `value` has passed the upper end of the range
    /// in ascending key order.
    pub fn is_past_upper(&self, value: &Value) -> bool {
        if value.type_rank() > self.type_rank() {
            return true;
        }
        match &self.upper {
            Bound::Included(high) => value > high,
            Bound::Excluded(high) => value >= high,
            Bound::Unbounded => false,
        }
    }
}

/// The least value of a type bracket.
fn bracket_floor(type_rank: u8) -> Value {
    match type_rank {
        0 => Value::Null,
        1 => Value::F64(f64::NEG_INFINITY),
        2 => Value::String(String::new()),
        3 => Value::Document(Document::new()),
        4 => Value::Array(Vec::new()),
        5 => Value::Id(ObjectId::MIN),
        6 => Value::Bool(false),
        _ => Value::DateTime(DateTime::<Utc>::MIN_UTC),
    }
}

impl Display for KeyRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.lower {
            Bound::Included(v) => write!(f, "[{}", v)?,
            Bound::Excluded(v) => write!(f, "({}", v)?,
            Bound::Unbounded => write!(f, "(-inf")?,
        }
        write!(f, ", ")?;
        match &self.upper {
            Bound::Included(v) => write!(f, "{}]", v),
            Bound::Excluded(v) => write!(f, "{})", v),
            Bound::Unbounded => write!(f, "+inf)"),
        }
    }
}
