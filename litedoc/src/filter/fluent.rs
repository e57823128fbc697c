use crate::common::Value;

use super::{
    AndFilter, ComparisonFilter, ComparisonMode, ElementMatchFilter, EqualsFilter, ExistsFilter,
    Filter, InFilter, NotEqualsFilter, NotFilter, NotInFilter, OrFilter, RegexFilter, TextFilter,
};

/// Starts a filter on `field_name`. Dotted names address embedded fields.
pub fn field(field_name: &str) -> FluentFilter {
    FluentFilter {
        field_name: field_name.to_string(),
    }
}

/// Matches documents satisfying every filter.
pub fn and(filters: Vec<Filter>) -> Filter {
    Filter::new(AndFilter::new(filters))
}

/// Matches documents satisfying at least one filter.
pub fn or(filters: Vec<Filter>) -> Filter {
    Filter::new(OrFilter::new(filters))
}

/// Matches documents satisfying none of the filters.
pub fn nor(filters: Vec<Filter>) -> Filter {
    Filter::new(NotFilter::new(or(filters)))
}

/// Full-text search against the collection's text index.
pub fn text(search: &str) -> Filter {
    Filter::new(TextFilter::new(None, search.to_string()))
}

/// A builder for single-field predicates.
///
/// # Examples
///
/// ```rust
/// use litedoc::filter::field;
///
/// let recent = field("date").gte(chrono::Utc::now());
/// let tagged = field("tags").in_array(vec!["news", "events"]);
/// let by_user = field("user.name").regex_with_options("^john", "i");
/// ```
pub struct FluentFilter {
    field_name: String,
}

impl FluentFilter {
    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Filter {
        Filter::new(EqualsFilter::new(self.field_name, value.into()))
    }

    #[inline]
    pub fn ne<T: Into<Value>>(self, value: T) -> Filter {
        Filter::new(NotEqualsFilter::new(self.field_name, value.into()))
    }

    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::Greater)
    }

    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::GreaterEqual)
    }

    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::Lesser)
    }

    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::LesserEqual)
    }

    /// Matches when the field equals any of `values`.
    pub fn in_array<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        let values = values.into_iter().map(Into::into).collect();
        Filter::new(InFilter::new(self.field_name, values))
    }

    /// Matches when the field equals none of `values`.
    pub fn not_in<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        let values = values.into_iter().map(Into::into).collect();
        Filter::new(NotInFilter::new(self.field_name, values))
    }

    pub fn exists(self, exists: bool) -> Filter {
        Filter::new(ExistsFilter::new(self.field_name, exists))
    }

    pub fn regex(self, pattern: &str) -> Filter {
        self.regex_with_options(pattern, "")
    }

    /// Regex match with `$options` flags (`i`, `m`, `s`, `x`).
    pub fn regex_with_options(self, pattern: &str, options: &str) -> Filter {
        Filter::new(RegexFilter::new(
            self.field_name,
            pattern.to_string(),
            options.to_string(),
        ))
    }

    /// Matches arrays with at least one element satisfying `filter`. Scalar
    /// elements are addressed as `field("$")`.
    pub fn elem_match(self, filter: Filter) -> Filter {
        Filter::new(ElementMatchFilter::new(self.field_name, filter))
    }

    /// Full-text search on this field. The field needs a text index.
    pub fn text(self, search: &str) -> Filter {
        Filter::new(TextFilter::new(Some(self.field_name), search.to_string()))
    }

    fn compare(self, value: Value, mode: ComparisonMode) -> Filter {
        Filter::new(ComparisonFilter::new(self.field_name, value, mode))
    }
}
