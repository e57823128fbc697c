use crate::collection::Document;
use crate::common::{SortOrder, SortableFields};
use crate::errors::LiteDocResult;

/// Options of a find command: projection, sort, skip and limit.
///
/// Options compose fluently and may start from one of the helper
/// functions:
///
/// ```rust
/// use litedoc::collection::order_by;
/// use litedoc::common::SortOrder;
///
/// let options = order_by("title", SortOrder::Ascending).skip(1).limit(1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct FindOptions {
    pub(crate) projection: Option<Document>,
    pub(crate) sort_by: Option<SortableFields>,
    pub(crate) skip: Option<usize>,
    pub(crate) limit: Option<usize>,
}

pub fn order_by(field_name: &str, sort_order: SortOrder) -> FindOptions {
    FindOptions::new().sort_by(field_name, sort_order)
}

pub fn skip_by(skip: usize) -> FindOptions {
    FindOptions::new().skip(skip)
}

pub fn limit_to(limit: usize) -> FindOptions {
    FindOptions::new().limit(limit)
}

pub fn projection(projection: Document) -> FindOptions {
    FindOptions::new().project(projection)
}

impl FindOptions {
    pub fn new() -> FindOptions {
        FindOptions::default()
    }

    /// Adds a sort field; later calls sort ties of earlier ones.
    pub fn sort_by(mut self, field_name: &str, sort_order: SortOrder) -> FindOptions {
        let fields = self.sort_by.take().unwrap_or_default();
        self.sort_by = Some(fields.add_sorted_field(field_name, sort_order));
        self
    }

    /// Replaces the sort with a sort document such as `{title: 1}`.
    pub fn sort_document(mut self, sort: &Document) -> LiteDocResult<FindOptions> {
        self.sort_by = Some(SortableFields::from_document(sort)?);
        Ok(self)
    }

    pub fn skip(mut self, skip: usize) -> FindOptions {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: usize) -> FindOptions {
        self.limit = Some(limit);
        self
    }

    /// Sets the projection mask. The mask is validated when the find runs.
    pub fn project(mut self, projection: Document) -> FindOptions {
        self.projection = Some(projection);
        self
    }

    pub fn sort_fields(&self) -> Option<&SortableFields> {
        self.sort_by.as_ref()
    }

    pub fn skip_count(&self) -> Option<usize> {
        self.skip
    }

    pub fn limit_count(&self) -> Option<usize> {
        self.limit
    }

    pub fn projection(&self) -> Option<&Document> {
        self.projection.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_order_by() {
        let options = order_by("title", SortOrder::Ascending).sort_by("date", SortOrder::Descending);
        let fields = options.sort_fields().unwrap();
        assert_eq!(fields.field_names(), vec!["title", "date"]);
        assert_eq!(fields.sorting_order()[1].1, SortOrder::Descending);
    }

    #[test]
    fn test_skip_and_limit() {
        let options = skip_by(2).limit(5);
        assert_eq!(options.skip_count(), Some(2));
        assert_eq!(options.limit_count(), Some(5));
        assert!(options.sort_fields().is_none());

        let options = limit_to(1);
        assert_eq!(options.skip_count(), None);
        assert_eq!(options.limit_count(), Some(1));
    }

    #[test]
    fn test_sort_document() {
        let options = FindOptions::new().sort_document(&doc! { title: -1 }).unwrap();
        assert_eq!(
            options.sort_fields().unwrap().sorting_order()[0].1,
            SortOrder::Descending
        );
    }

    #[test]
    fn test_projection() {
        let options = projection(doc! { title: 1 });
        assert_eq!(options.projection(), Some(&doc! { title: 1 }));
    }
}
