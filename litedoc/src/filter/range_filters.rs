use std::any::Any;
use std::cmp::Ordering;
use std::fmt::Display;

use crate::collection::Document;
use crate::common::Value;
use crate::errors::LiteDocResult;
use crate::index::KeyRange;

use super::{match_value, FilterProvider};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ComparisonMode {
    Greater,
    GreaterEqual,
    Lesser,
    LesserEqual,
}

impl ComparisonMode {
    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            ComparisonMode::Greater => ordering == Ordering::Greater,
            ComparisonMode::GreaterEqual => ordering != Ordering::Less,
            ComparisonMode::Lesser => ordering == Ordering::Less,
            ComparisonMode::LesserEqual => ordering != Ordering::Greater,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            ComparisonMode::Greater => ">",
            ComparisonMode::GreaterEqual => ">=",
            ComparisonMode::Lesser => "<",
            ComparisonMode::LesserEqual => "<=",
        }
    }
}

/// Compares a field against a bound with `$gt`, `$gte`, `$lt` or `$lte`.
///
/// Only values in the same type bracket as the bound are compared: numbers
/// with numbers, strings with strings, dates with dates. A string never
/// matches `$gt: 5`. A missing field reads as `null`.
pub(crate) struct ComparisonFilter {
    field_name: String,
    field_value: Value,
    mode: ComparisonMode,
}

impl ComparisonFilter {
    pub(crate) fn new(field_name: String, field_value: Value, mode: ComparisonMode) -> Self {
        ComparisonFilter {
            field_name,
            field_value,
            mode,
        }
    }

    fn compare(&self, value: &Value) -> bool {
        value
            .compare_same_type(&self.field_value)
            .map(|ordering| self.mode.accepts(ordering))
            .unwrap_or(false)
    }
}

impl Display for ComparisonFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({} {} {})",
            self.field_name,
            self.mode.symbol(),
            self.field_value
        )
    }
}

impl FilterProvider for ComparisonFilter {
    fn apply(&self, document: &Document) -> LiteDocResult<bool> {
        let value = document.get_value(&self.field_name);
        Ok(match_value(&value, &|v| self.compare(v)))
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field_name)
    }

    fn index_range(&self) -> Option<KeyRange> {
        if self.field_value.is_array() {
            return None;
        }

        let bound = self.field_value.clone();
        Some(match self.mode {
            ComparisonMode::Greater => KeyRange::gt(bound),
            ComparisonMode::GreaterEqual => KeyRange::gte(bound),
            ComparisonMode::Lesser => KeyRange::lt(bound),
            ComparisonMode::LesserEqual => KeyRange::lte(bound),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
