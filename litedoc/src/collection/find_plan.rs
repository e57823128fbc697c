use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use crate::collection::{Document, ObjectId};
use crate::filter::Filter;
use crate::index::{IndexDescriptor, KeyRange};

/// How a query reaches its candidate documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanStage {
    /// A single `_id` lookup in the document map.
    IdLookup,
    /// A key range scan over a unique or non-unique index.
    IndexScan,
    /// A posting list lookup in a text index.
    TextScan,
    /// A walk over every document of the collection.
    CollectionScan,
}

impl Display for ScanStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanStage::IdLookup => write!(f, "IDLOOKUP"),
            ScanStage::IndexScan => write!(f, "IXSCAN"),
            ScanStage::TextScan => write!(f, "TEXT"),
            ScanStage::CollectionScan => write!(f, "COLLSCAN"),
        }
    }
}

/// The execution plan of a query, chosen by the find optimizer.
///
/// Whatever the stage, every candidate is re-checked against
/// [FindPlan::filter], so a plan only decides how many documents are read.
#[derive(Clone)]
pub struct FindPlan {
    inner: Arc<FindPlanInner>,
}

struct FindPlanInner {
    stage: ScanStage,
    filter: Filter,
    by_id: Option<ObjectId>,
    index_descriptor: Option<IndexDescriptor>,
    key_range: Option<KeyRange>,
    text_filter: Option<Filter>,
}

impl FindPlan {
    pub(crate) fn collection_scan(filter: Filter) -> Self {
        FindPlan::build(ScanStage::CollectionScan, filter, None, None, None, None)
    }

    pub(crate) fn id_lookup(filter: Filter, id: ObjectId) -> Self {
        FindPlan::build(ScanStage::IdLookup, filter, Some(id), None, None, None)
    }

    pub(crate) fn index_scan(filter: Filter, descriptor: IndexDescriptor, range: KeyRange) -> Self {
        FindPlan::build(
            ScanStage::IndexScan,
            filter,
            None,
            Some(descriptor),
            Some(range),
            None,
        )
    }

    pub(crate) fn text_scan(filter: Filter, descriptor: IndexDescriptor, text_filter: Filter) -> Self {
        FindPlan::build(
            ScanStage::TextScan,
            filter,
            None,
            Some(descriptor),
            None,
            Some(text_filter),
        )
    }

    fn build(
        stage: ScanStage,
        filter: Filter,
        by_id: Option<ObjectId>,
        index_descriptor: Option<IndexDescriptor>,
        key_range: Option<KeyRange>,
        text_filter: Option<Filter>,
    ) -> Self {
        FindPlan {
            inner: Arc::new(FindPlanInner {
                stage,
                filter,
                by_id,
                index_descriptor,
                key_range,
                text_filter,
            }),
        }
    }

    pub fn stage(&self) -> ScanStage {
        self.inner.stage
    }

    /// The full filter every candidate is checked against.
    pub fn filter(&self) -> &Filter {
        &self.inner.filter
    }

    pub fn by_id(&self) -> Option<ObjectId> {
        self.inner.by_id
    }

    pub fn index_descriptor(&self) -> Option<&IndexDescriptor> {
        self.inner.index_descriptor.as_ref()
    }

    pub fn key_range(&self) -> Option<&KeyRange> {
        self.inner.key_range.as_ref()
    }

    pub fn text_filter(&self) -> Option<&Filter> {
        self.inner.text_filter.as_ref()
    }

    /// The name of the index the plan reads, `_id_` for an id lookup.
    pub fn used_index(&self) -> Option<String> {
        match self.inner.stage {
            ScanStage::IdLookup => Some(crate::common::ID_INDEX_NAME.to_string()),
            _ => self.inner.index_descriptor.as_ref().map(|d| d.name()),
        }
    }
}

impl Display for FindPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.used_index() {
            Some(index) => write!(f, "{} {} {}", self.stage(), index, self.filter()),
            None => write!(f, "{} {}", self.stage(), self.filter()),
        }
    }
}

impl std::fmt::Debug for FindPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FindPlan({})", self)
    }
}

/// Execution statistics of a query, as reported by `explain`.
#[derive(Clone, Debug, PartialEq)]
pub struct ExplainResult {
    stage: ScanStage,
    used_index: Option<String>,
    scanned_docs: usize,
    matched_docs: usize,
    execution_time: Duration,
}

impl ExplainResult {
    pub(crate) fn new(
        stage: ScanStage,
        used_index: Option<String>,
        scanned_docs: usize,
        matched_docs: usize,
        execution_time: Duration,
    ) -> Self {
        ExplainResult {
            stage,
            used_index,
            scanned_docs,
            matched_docs,
            execution_time,
        }
    }

    pub fn stage(&self) -> ScanStage {
        self.stage
    }

    pub fn used_index(&self) -> Option<&str> {
        self.used_index.as_deref()
    }

    /// Documents read from the store and checked against the filter.
    pub fn scanned_docs(&self) -> usize {
        self.scanned_docs
    }

    pub fn matched_docs(&self) -> usize {
        self.matched_docs
    }

    pub fn execution_time(&self) -> Duration {
        self.execution_time
    }

    /// The statistics as a document, in the shape of an execution stats
    /// report.
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        document.put_raw("stage", self.stage.to_string());
        if let Some(index) = &self.used_index {
            document.put_raw("indexName", index.as_str());
        }
        document.put_raw("totalDocsExamined", self.scanned_docs as i64);
        document.put_raw("nReturned", self.matched_docs as i64);
        document.put_raw(
            "executionTimeMillis",
            self.execution_time.as_millis() as i64,
        );
        document
    }
}
