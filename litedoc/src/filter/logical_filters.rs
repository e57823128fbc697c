use std::any::Any;
use std::fmt::Display;

use crate::collection::Document;
use crate::errors::LiteDocResult;

use super::{Filter, FilterProvider};

fn write_joined(
    f: &mut std::fmt::Formatter<'_>,
    filters: &[Filter],
    operator: &str,
) -> std::fmt::Result {
    write!(f, "(")?;
    for (i, filter) in filters.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", operator)?;
        }
        write!(f, "{}", filter)?;
    }
    write!(f, ")")
}

/// Matches documents satisfying every child filter. An empty `and`
/// matches everything.
pub(crate) struct AndFilter {
    filters: Vec<Filter>,
}

impl AndFilter {
    pub(crate) fn new(filters: Vec<Filter>) -> Self {
        AndFilter { filters }
    }

    pub(crate) fn filters(&self) -> &[Filter] {
        &self.filters
    }
}

impl Display for AndFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_joined(f, &self.filters, "&&")
    }
}

impl FilterProvider for AndFilter {
    fn apply(&self, document: &Document) -> LiteDocResult<bool> {
        for filter in &self.filters {
            if !filter.apply(document)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn logical_filters(&self) -> Option<&[Filter]> {
        Some(&self.filters)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Matches documents satisfying at least one child filter.
pub(crate) struct OrFilter {
    filters: Vec<Filter>,
}

impl OrFilter {
    pub(crate) fn new(filters: Vec<Filter>) -> Self {
        OrFilter { filters }
    }
}

impl Display for OrFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_joined(f, &self.filters, "||")
    }
}

impl FilterProvider for OrFilter {
    fn apply(&self, document: &Document) -> LiteDocResult<bool> {
        for filter in &self.filters {
            if filter.apply(document)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn logical_filters(&self) -> Option<&[Filter]> {
        Some(&self.filters)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Inverts a filter.
pub(crate) struct NotFilter {
    filter: [Filter; 1],
}

impl NotFilter {
    pub(crate) fn new(filter: Filter) -> Self {
        NotFilter { filter: [filter] }
    }
}

impl Display for NotFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "!({})", self.filter[0])
    }
}

impl FilterProvider for NotFilter {
    fn apply(&self, document: &Document) -> LiteDocResult<bool> {
        Ok(!self.filter[0].apply(document)?)
    }

    fn logical_filters(&self) -> Option<&[Filter]> {
        Some(&self.filter)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::filter::{all, field};

    #[test]
    fn test_and() {
        let document = doc! { a: 1, b: 2 };
        let filter = AndFilter::new(vec![field("a").eq(1), field("b").gt(1)]);
        assert!(filter.apply(&document).unwrap());
        let filter = AndFilter::new(vec![field("a").eq(1), field("b").gt(2)]);
        assert!(!filter.apply(&document).unwrap());
        assert!(AndFilter::new(vec![]).apply(&document).unwrap());
    }

    #[test]
    fn test_or() {
        let document = doc! { a: 1 };
        let filter = OrFilter::new(vec![field("a").eq(2), field("a").eq(1)]);
        assert!(filter.apply(&document).unwrap());
        assert!(!OrFilter::new(vec![]).apply(&document).unwrap());
    }

    #[test]
    fn test_not() {
        let document = doc! { a: 1 };
        assert!(!NotFilter::new(all()).apply(&document).unwrap());
        assert!(NotFilter::new(field("a").eq(2)).apply(&document).unwrap());
        assert_eq!(NotFilter::new(all()).logical_filters().map(|f| f.len()), Some(1));
    }

    #[test]
    fn test_display() {
        let filter = AndFilter::new(vec![field("a").eq(1), field("b").lt(2)]);
        assert_eq!(filter.to_string(), "((a == 1) && (b < 2))");
    }
}
