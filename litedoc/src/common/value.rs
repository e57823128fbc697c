use crate::collection::{Document, ObjectId};
use chrono::{DateTime, FixedOffset, Utc};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Compare two floats, treating NaN as equal to itself and greater than
/// every other number.
#[inline]
fn num_cmp_float(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Compare an integer with a float without losing precision.
#[inline]
fn num_cmp_int_float(a: i64, b: f64) -> Ordering {
    if b.is_nan() {
        return Ordering::Less;
    }
    // i64::MAX as f64 rounds up to 2^63
    if b >= 9_223_372_036_854_775_808.0 {
        return Ordering::Less;
    }
    if b < -9_223_372_036_854_775_808.0 {
        return Ordering::Greater;
    }

    let truncated = b.trunc();
    match a.cmp(&(truncated as i64)) {
        Ordering::Equal => {
            let fraction = b - truncated;
            if fraction > 0.0 {
                Ordering::Less
            } else if fraction < 0.0 {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        }
        other => other,
    }
}

/// A typed value stored inside a [Document].
///
/// `Value` is a closed set of variants covering everything a document can
/// hold: scalars, absolute instants, object ids and the two recursive
/// containers ([Value::Array] and [Value::Document]).
///
/// # Ordering
///
/// Values are totally ordered so that they can be used as index keys and
/// sort keys. Variants are first grouped into type brackets:
///
/// `Null < numbers < String < Document < Array < Id < Bool < DateTime`
///
/// Within the numeric bracket [Value::I64] and [Value::F64] compare by
/// magnitude, so `I64(2) == F64(2.0)`. Use [Value::compare_same_type] when
/// values from different brackets must not be compared at all.
///
/// # Examples
///
/// ```rust
/// use litedoc::common::Value;
/// use litedoc::val;
///
/// assert_eq!(val!(42), Value::I64(42));
/// assert_eq!(val!(42), val!(42.0));
/// assert!(val!("a") > val!(1000));
/// ```
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Id(ObjectId),
    Array(Vec<Value>),
    Document(Document),
}

impl Value {
    /// The position of this value's type bracket in the total order.
    pub fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::I64(_) | Value::F64(_) => 1,
            Value::String(_) => 2,
            Value::Document(_) => 3,
            Value::Array(_) => 4,
            Value::Id(_) => 5,
            Value::Bool(_) => 6,
            Value::DateTime(_) => 7,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I64(_) => "int",
            Value::F64(_) => "double",
            Value::String(_) => "string",
            Value::DateTime(_) => "date",
            Value::Id(_) => "objectId",
            Value::Array(_) => "array",
            Value::Document(_) => "document",
        }
    }

    /// Compares two values only when they belong to the same type bracket.
    ///
    /// Returns `None` for values of incompatible types, e.g. a string and a
    /// number. Comparison operators of the query language are built on this,
    /// so a mismatched comparison never matches.
    pub fn compare_same_type(&self, other: &Value) -> Option<Ordering> {
        if self.type_rank() == other.type_rank() {
            Some(self.cmp(other))
        } else {
            None
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::I64(_) | Value::F64(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Value::Document(_))
    }

    pub fn is_id(&self) -> bool {
        matches!(self, Value::Id(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer value. Floats with no fractional part are
    /// accepted as well.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            Value::F64(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::I64(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&String> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_string().map(|s| s.as_str())
    }

    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_id(&self) -> Option<&ObjectId> {
        match self {
            Value::Id(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Compact single-line rendering used inside documents and messages.
    pub(crate) fn write_compact(&self, f: &mut dyn std::fmt::Write) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I64(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{:?}", v),
            Value::String(s) => write!(f, "{:?}", s),
            Value::DateTime(dt) => write!(f, "ISODate(\"{}\")", dt.to_rfc3339()),
            Value::Id(id) => write!(f, "ObjectId(\"{}\")", id),
            Value::Array(arr) => {
                write!(f, "[")?;
                for (i, item) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.write_compact(f)?;
                }
                write!(f, "]")
            }
            Value::Document(doc) => doc.write_compact(f),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.write_compact(f)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::I64(a), Value::I64(b)) => a.cmp(b),
            (Value::F64(a), Value::F64(b)) => num_cmp_float(*a, *b),
            (Value::I64(a), Value::F64(b)) => num_cmp_int_float(*a, *b),
            (Value::F64(a), Value::I64(b)) => num_cmp_int_float(*b, *a).reverse(),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Document(a), Value::Document(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => a.cmp(b),
            (Value::Id(a), Value::Id(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_rank().hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::I64(v) => v.hash(state),
            Value::F64(v) => {
                // integral floats must hash like the equal integer
                if v.is_nan() {
                    u64::MAX.hash(state);
                } else if v.fract() == 0.0
                    && *v >= -9_223_372_036_854_775_808.0
                    && *v < 9_223_372_036_854_775_808.0
                {
                    (*v as i64).hash(state);
                } else {
                    v.to_bits().hash(state);
                }
            }
            Value::String(s) => s.hash(state),
            Value::DateTime(dt) => dt.hash(state),
            Value::Id(id) => id.hash(state),
            Value::Array(arr) => arr.hash(state),
            Value::Document(doc) => doc.hash(state),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::I64(value as i64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::F64(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Value::DateTime(value.with_timezone(&Utc))
    }
}

impl From<ObjectId> for Value {
    fn from(value: ObjectId) -> Self {
        Value::Id(value)
    }
}

impl From<&ObjectId> for Value {
    fn from(value: &ObjectId) -> Self {
        Value::Id(*value)
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Document(value)
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// A macro to create a `Value` from a given expression.
///
/// # Examples
///
/// ```rust
/// use litedoc::common::Value;
/// use litedoc::val;
///
/// assert_eq!(val!(42), Value::I64(42));
/// assert_eq!(val!("hello"), Value::String("hello".to_string()));
/// assert_eq!(val!(true), Value::Bool(true));
/// ```
#[macro_export]
macro_rules! val {
    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
