use std::cmp::Ordering;

use crate::collection::Document;
use crate::common::{SortOrder, SortableFields};
use crate::errors::LiteDocResult;

/// Compares two documents field by field. Missing fields sort as `null`.
pub(crate) fn compare_documents(a: &Document, b: &Document, fields: &SortableFields) -> Ordering {
    for (field, order) in fields.sorting_order() {
        let ordering = a.get_value(field).cmp(&b.get_value(field));
        let ordering = match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Drains `stream` and returns its documents in sort order. The sort is
/// stable, so documents with equal keys keep their scan order. The first
/// error of the stream is returned instead.
pub(crate) fn sort_stream<I>(stream: I, fields: &SortableFields) -> LiteDocResult<Vec<Document>>
where
    I: Iterator<Item = LiteDocResult<Document>>,
{
    let mut documents = stream.collect::<LiteDocResult<Vec<Document>>>()?;
    documents.sort_by(|a, b| compare_documents(a, b, fields));
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::errors::{ErrorKind, LiteDocError};

    fn titles(documents: &[Document]) -> Vec<String> {
        documents
            .iter()
            .map(|d| d.get_value("title").as_str().unwrap_or("<none>").to_string())
            .collect()
    }

    #[test]
    fn test_sort_ascending_with_missing_first() {
        let docs = vec![
            Ok(doc! { title: "Post Two" }),
            Ok(doc! { body: "untitled" }),
            Ok(doc! { title: "Post One" }),
        ];
        let fields = SortableFields::with_names(vec!["title"]).unwrap();
        let sorted = sort_stream(docs.into_iter(), &fields).unwrap();
        assert_eq!(titles(&sorted), vec!["<none>", "Post One", "Post Two"]);
    }

    #[test]
    fn test_sort_multiple_fields() {
        let docs = vec![
            Ok(doc! { title: "a", likes: 1 }),
            Ok(doc! { title: "b", likes: 2 }),
            Ok(doc! { title: "c", likes: 1 }),
        ];
        let fields = SortableFields::new()
            .add_sorted_field("likes", SortOrder::Descending)
            .add_sorted_field("title", SortOrder::Ascending);
        let sorted = sort_stream(docs.into_iter(), &fields).unwrap();
        assert_eq!(titles(&sorted), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_sort_propagates_error() {
        let docs = vec![
            Ok(doc! { title: "a" }),
            Err(LiteDocError::new("boom", ErrorKind::InternalError)),
        ];
        let fields = SortableFields::with_names(vec!["title"]).unwrap();
        let err = sort_stream(docs.into_iter(), &fields).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InternalError);
    }
}
