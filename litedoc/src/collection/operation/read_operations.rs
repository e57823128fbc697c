use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::collection::{
    Document, ExplainResult, FindOptions, FindPlan, ObjectId, ScanStage,
};
use crate::common::stream::{DocumentCursor, DocumentStream, FilteredStream, IndexedStream};
use crate::common::Value;
use crate::errors::{ErrorKind, LiteDocError, LiteDocResult};
use crate::filter::{Filter, TextFilter};
use crate::index::KeyRange;
use crate::store::DocumentMap;

use super::{FindOptimizer, IndexManager};

/// Runs queries: plans them, streams their candidates and re-checks every
/// candidate against the full filter.
#[derive(Clone)]
pub(crate) struct ReadOperations {
    collection_name: String,
    document_map: DocumentMap,
    index_manager: IndexManager,
    find_optimizer: FindOptimizer,
}

impl ReadOperations {
    pub fn new(
        collection_name: &str,
        document_map: DocumentMap,
        index_manager: IndexManager,
        find_optimizer: FindOptimizer,
    ) -> Self {
        ReadOperations {
            collection_name: collection_name.to_string(),
            document_map,
            index_manager,
            find_optimizer,
        }
    }

    pub fn find(&self, filter: Filter, find_options: &FindOptions) -> LiteDocResult<DocumentCursor> {
        let plan = self.create_plan(&filter)?;
        let stream = self.execute(&plan, None)?;

        let mut cursor = DocumentCursor::new(stream).with_find_plan(plan);
        if let Some(sort_by) = &find_options.sort_by {
            cursor = cursor.sort(sort_by.clone());
        }
        if let Some(skip) = find_options.skip {
            cursor = cursor.skip(skip);
        }
        if let Some(limit) = find_options.limit {
            cursor = cursor.limit(limit);
        }
        if let Some(projection) = &find_options.projection {
            cursor = cursor.project(projection)?;
        }
        Ok(cursor)
    }

    pub fn get_by_id(&self, id: &ObjectId) -> LiteDocResult<Document> {
        self.document_map.get(id)
    }

    /// The ids of the documents `plan` matches, at most `limit` of them.
    pub fn plan_ids(&self, plan: &FindPlan, limit: Option<usize>) -> LiteDocResult<Vec<ObjectId>> {
        let stream = self.execute(plan, None)?;
        let ids = stream.filter_map(|result| match result {
            Ok(document) => document.id().map(Ok),
            Err(e) => Some(Err(e)),
        });
        match limit {
            Some(limit) => ids.take(limit).collect(),
            None => ids.collect(),
        }
    }

    pub fn count(&self, filter: &Filter) -> LiteDocResult<usize> {
        let plan = self.create_plan(filter)?;
        let mut count = 0;
        for result in self.execute(&plan, None)? {
            result?;
            count += 1;
        }
        Ok(count)
    }

    /// Runs the query to completion and reports how it went.
    pub fn explain(&self, filter: &Filter) -> LiteDocResult<ExplainResult> {
        let started = Instant::now();
        let plan = self.create_plan(filter)?;
        let scanned = Arc::new(AtomicUsize::new(0));

        let mut matched = 0;
        for result in self.execute(&plan, Some(scanned.clone()))? {
            result?;
            matched += 1;
        }

        let result = ExplainResult::new(
            plan.stage(),
            plan.used_index(),
            scanned.load(Ordering::Relaxed),
            matched,
            started.elapsed(),
        );
        log::debug!("Explained {} on {}: {:?}", filter, self.collection_name, result);
        Ok(result)
    }

    pub fn create_plan(&self, filter: &Filter) -> LiteDocResult<FindPlan> {
        let indexes = self.index_manager.descriptors();
        self.find_optimizer
            .create_find_plan(&self.collection_name, filter, &indexes)
    }

    fn execute(&self, plan: &FindPlan, scanned: Option<Arc<AtomicUsize>>) -> LiteDocResult<DocumentStream> {
        let candidates = self.candidates(plan)?;
        let stream = FilteredStream::new(candidates, plan.filter().clone());
        Ok(match scanned {
            Some(scanned) => Box::new(stream.counting(scanned)),
            None => Box::new(stream),
        })
    }

    fn candidates(&self, plan: &FindPlan) -> LiteDocResult<DocumentStream> {
        let map = self.document_map.clone();
        match plan.stage() {
            ScanStage::IdLookup => {
                let ids = plan.by_id().into_iter().collect();
                Ok(Box::new(IndexedStream::new(map, ids)))
            }
            ScanStage::IndexScan => {
                let (Some(descriptor), Some(range)) = (plan.index_descriptor(), plan.key_range())
                else {
                    return Err(self.malformed_plan(plan));
                };
                if descriptor.is_id_index() {
                    return self.id_range(range);
                }
                match self.index_manager.scan(descriptor, range) {
                    Ok(ids) => Ok(Box::new(IndexedStream::new(map, ids))),
                    Err(e) if e.kind() == &ErrorKind::IndexMissing => Ok(self.dropped_index_scan(plan)),
                    Err(e) => Err(e),
                }
            }
            ScanStage::TextScan => {
                let descriptor = plan.index_descriptor();
                let text = plan
                    .text_filter()
                    .and_then(|filter| filter.downcast_ref::<TextFilter>());
                let (Some(descriptor), Some(text)) = (descriptor, text) else {
                    return Err(self.malformed_plan(plan));
                };
                match self.index_manager.search(descriptor, text) {
                    Ok(Some(ids)) => Ok(Box::new(IndexedStream::new(map, ids))),
                    Ok(None) => Ok(Box::new(map.scan())),
                    Err(e) if e.kind() == &ErrorKind::IndexMissing => Ok(self.dropped_index_scan(plan)),
                    Err(e) => Err(e),
                }
            }
            ScanStage::CollectionScan => Ok(Box::new(map.scan())),
        }
    }

    /// Walks the document map from the lower end of an `_id` range to its
    /// upper end.
    fn id_range(&self, range: &KeyRange) -> LiteDocResult<DocumentStream> {
        let map = self.document_map.clone();
        let values = match range.lower() {
            Bound::Excluded(Value::Id(id)) => map.scan_after(*id),
            Bound::Included(Value::Id(id)) => match map.lower_key(id)? {
                Some(before) => map.scan_after(before),
                None => map.scan(),
            },
            _ => map.scan(),
        };

        let range = range.clone();
        Ok(Box::new(values.take_while(move |result| match result {
            Ok(document) => document
                .id()
                .is_some_and(|id| !range.is_past_upper(&Value::Id(id))),
            Err(_) => true,
        })))
    }

    /// Candidates of a plan whose index was dropped after planning. Every
    /// document is re-checked against the filter, so the results stay the
    /// same.
    fn dropped_index_scan(&self, plan: &FindPlan) -> DocumentStream {
        log::debug!("Index of {} was dropped, scanning {}", plan, self.collection_name);
        Box::new(self.document_map.scan())
    }

    fn malformed_plan(&self, plan: &FindPlan) -> LiteDocError {
        log::error!("Malformed find plan {} on {}", plan, self.collection_name);
        LiteDocError::new(
            &format!("Malformed find plan {} on collection {}", plan, self.collection_name),
            ErrorKind::InternalError,
        )
    }
}
