use std::collections::VecDeque;

use crate::collection::{Document, FindPlan};
use crate::common::SortableFields;
use crate::errors::{LiteDocError, LiteDocResult};

use super::{sort_stream, DocumentStream, Projection};

/// The result of a find command.
///
/// A cursor is configured with [DocumentCursor::sort],
/// [DocumentCursor::skip], [DocumentCursor::limit] and
/// [DocumentCursor::project] before it is iterated. Whatever the call
/// order, results are sorted first, then skipped, then limited, then
/// projected. Configuration calls made after iteration started are ignored.
///
/// Iteration is lazy unless a sort is requested, which materializes the
/// matching documents. Only results produced ahead of iteration are kept:
/// [DocumentCursor::size] buffers the remaining results and
/// [DocumentCursor::first] keeps the first one, so neither disturbs
/// iteration.
///
/// # Examples
///
/// ```ignore
/// let titles: Vec<Document> = collection
///     .find(all())?
///     .sort(SortableFields::with_names(vec!["title"])?)
///     .skip(1)
///     .limit(1)
///     .collect::<LiteDocResult<_>>()?;
/// ```
pub struct DocumentCursor {
    source: Option<DocumentStream>,
    pipeline: Option<DocumentStream>,
    sort_by: Option<SortableFields>,
    skip: usize,
    limit: Option<usize>,
    projection: Option<Projection>,
    buffer: VecDeque<LiteDocResult<Document>>,
    first: Option<LiteDocResult<Document>>,
    produced: usize,
    failure: Option<LiteDocError>,
    exhausted: bool,
    find_plan: Option<FindPlan>,
}

impl DocumentCursor {
    pub fn new(source: DocumentStream) -> Self {
        DocumentCursor {
            source: Some(source),
            pipeline: None,
            sort_by: None,
            skip: 0,
            limit: None,
            projection: None,
            buffer: VecDeque::new(),
            first: None,
            produced: 0,
            failure: None,
            exhausted: false,
            find_plan: None,
        }
    }

    pub fn sort(mut self, fields: SortableFields) -> Self {
        if self.check_configurable("sort") {
            self.sort_by = Some(fields);
        }
        self
    }

    /// Sorts by a sort document such as `{title: 1, date: -1}`.
    pub fn sort_by(self, sort: &Document) -> LiteDocResult<Self> {
        let fields = SortableFields::from_document(sort)?;
        Ok(self.sort(fields))
    }

    pub fn skip(mut self, skip: usize) -> Self {
        if self.check_configurable("skip") {
            self.skip = skip;
        }
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        if self.check_configurable("limit") {
            self.limit = Some(limit);
        }
        self
    }

    /// Applies a projection mask, failing with
    /// [crate::errors::ErrorKind::InvalidProjection] for a mixed mask.
    pub fn project(mut self, projection: &Document) -> LiteDocResult<Self> {
        let projection = Projection::parse(projection)?;
        if self.check_configurable("project") {
            self.projection = Some(projection);
        }
        Ok(self)
    }

    /// Number of results, counted without consuming them.
    pub fn size(&mut self) -> LiteDocResult<usize> {
        while self.produce() {}
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(self.produced),
        }
    }

    /// The first result of the cursor, even if iteration moved past it.
    pub fn first(&mut self) -> Option<LiteDocResult<Document>> {
        if self.produced == 0 {
            self.produce();
        }
        self.first.clone()
    }

    /// The plan chosen for the query, when the cursor comes from a find.
    pub fn find_plan(&self) -> Option<&FindPlan> {
        self.find_plan.as_ref()
    }

    pub(crate) fn with_find_plan(mut self, find_plan: FindPlan) -> Self {
        self.find_plan = Some(find_plan);
        self
    }

    fn check_configurable(&self, operation: &str) -> bool {
        if self.source.is_none() {
            log::warn!("Cursor is already being iterated, ignoring {}", operation);
            return false;
        }
        true
    }

    fn build_pipeline(&mut self) -> Option<&mut DocumentStream> {
        if self.pipeline.is_none() {
            let source = self.source.take()?;
            let sorted: DocumentStream = match &self.sort_by {
                Some(fields) => match sort_stream(source, fields) {
                    Ok(documents) => Box::new(documents.into_iter().map(Ok)),
                    Err(e) => Box::new(std::iter::once(Err(e))),
                },
                None => source,
            };

            let skipped = sorted.skip(self.skip);
            let limited: DocumentStream = match self.limit {
                Some(limit) => Box::new(skipped.take(limit)),
                None => Box::new(skipped),
            };

            let pipeline: DocumentStream = match self.projection.take() {
                Some(projection) => {
                    Box::new(limited.map(move |result| result.and_then(|d| projection.apply(d))))
                }
                None => limited,
            };
            self.pipeline = Some(pipeline);
        }
        self.pipeline.as_mut()
    }

    /// Pulls one result into the buffer, returning false once the pipeline
    /// is exhausted.
    fn produce(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        match self.build_pipeline().and_then(|pipeline| pipeline.next()) {
            Some(result) => {
                if self.produced == 0 {
                    self.first = Some(result.clone());
                }
                if let Err(e) = &result {
                    self.failure.get_or_insert_with(|| e.clone());
                }
                self.produced += 1;
                self.buffer.push_back(result);
                true
            }
            None => {
                self.exhausted = true;
                self.pipeline = None;
                false
            }
        }
    }
}

impl Iterator for DocumentCursor {
    type Item = LiteDocResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() {
            self.produce();
        }
        self.buffer.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::errors::{ErrorKind, LiteDocError};
    use crate::val;

    fn posts() -> DocumentStream {
        let docs = vec![
            Ok(doc! { title: "Post Two", likes: 2 }),
            Ok(doc! { title: "Post One", likes: 5 }),
            Ok(doc! { title: "Post Three", likes: 1 }),
        ];
        Box::new(docs.into_iter())
    }

    fn titles(cursor: DocumentCursor) -> Vec<String> {
        cursor
            .map(|d| d.unwrap().get_value("title").as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_plain_iteration() {
        let cursor = DocumentCursor::new(posts());
        assert_eq!(titles(cursor), vec!["Post Two", "Post One", "Post Three"]);
    }

    #[test]
    fn test_sort_skip_limit_in_any_order() {
        let by_title = SortableFields::with_names(vec!["title"]).unwrap();
        let cursor = DocumentCursor::new(posts())
            .limit(1)
            .skip(1)
            .sort(by_title);
        assert_eq!(titles(cursor), vec!["Post Three"]);
    }

    #[test]
    fn test_sort_by_document() {
        let cursor = DocumentCursor::new(posts())
            .sort_by(&doc! { likes: -1 })
            .unwrap();
        assert_eq!(titles(cursor), vec!["Post One", "Post Two", "Post Three"]);
    }

    #[test]
    fn test_projection() {
        let mut cursor = DocumentCursor::new(posts())
            .project(&doc! { likes: 0 })
            .unwrap();
        let first = cursor.next().unwrap().unwrap();
        assert_eq!(first, doc! { title: "Post Two" });
    }

    #[test]
    fn test_mixed_projection_fails() {
        let result = DocumentCursor::new(posts()).project(&doc! { title: 1, likes: 0 });
        assert_eq!(
            result.err().unwrap().kind(),
            &ErrorKind::InvalidProjection
        );
    }

    #[test]
    fn test_size_and_first_do_not_consume() {
        let mut cursor = DocumentCursor::new(posts()).skip(1);
        assert_eq!(cursor.size().unwrap(), 2);
        assert_eq!(
            cursor.first().unwrap().unwrap().get("title"),
            Some(val!("Post One"))
        );
        assert_eq!(titles(cursor), vec!["Post One", "Post Three"]);
    }

    #[test]
    fn test_iteration_releases_results() {
        let docs: Vec<LiteDocResult<Document>> =
            (0..1000).map(|i| Ok(doc! { likes: i })).collect();
        let mut cursor = DocumentCursor::new(Box::new(docs.into_iter()));

        let mut count = 0;
        while let Some(result) = cursor.next() {
            assert!(result.is_ok());
            assert!(cursor.buffer.is_empty());
            count += 1;
        }
        assert_eq!(count, 1000);

        // the first result survives iteration
        assert_eq!(
            cursor.first().unwrap().unwrap().get("likes"),
            Some(val!(0))
        );
        assert_eq!(cursor.size().unwrap(), 1000);
    }

    #[test]
    fn test_first_buffers_one_result() {
        let mut cursor = DocumentCursor::new(posts());
        assert_eq!(
            cursor.first().unwrap().unwrap().get("title"),
            Some(val!("Post Two"))
        );
        assert_eq!(cursor.buffer.len(), 1);
        assert_eq!(titles(cursor), vec!["Post Two", "Post One", "Post Three"]);
    }

    #[test]
    fn test_configuration_after_iteration_is_ignored() {
        let mut cursor = DocumentCursor::new(posts());
        cursor.next();
        let cursor = cursor.limit(0);
        assert_eq!(titles(cursor), vec!["Post One", "Post Three"]);
    }

    #[test]
    fn test_sort_error_is_reported() {
        let docs = vec![
            Ok(doc! { title: "a" }),
            Err(LiteDocError::new("boom", ErrorKind::InternalError)),
        ];
        let mut cursor = DocumentCursor::new(Box::new(docs.into_iter()))
            .sort(SortableFields::with_names(vec!["title"]).unwrap());
        assert!(cursor.size().is_err());
        assert!(cursor.next().unwrap().is_err());
        assert!(cursor.next().is_none());
    }
}
