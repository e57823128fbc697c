use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::collection::Document;
use crate::errors::LiteDocResult;
use crate::filter::Filter;

use super::DocumentStream;

/// Passes through the documents of a stream that satisfy a filter.
pub(crate) struct FilteredStream {
    raw_stream: DocumentStream,
    filter: Filter,
    scanned: Option<Arc<AtomicUsize>>,
}

impl FilteredStream {
    pub fn new(raw_stream: DocumentStream, filter: Filter) -> Self {
        FilteredStream {
            raw_stream,
            filter,
            scanned: None,
        }
    }

    /// Counts every document the filter examines into `scanned`.
    pub fn counting(mut self, scanned: Arc<AtomicUsize>) -> Self {
        self.scanned = Some(scanned);
        self
    }
}

impl Iterator for FilteredStream {
    type Item = LiteDocResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.raw_stream.next()? {
                Ok(document) => {
                    if let Some(scanned) = &self.scanned {
                        scanned.fetch_add(1, Ordering::Relaxed);
                    }
                    match self.filter.apply(&document) {
                        Ok(true) => return Some(Ok(document)),
                        Ok(false) => continue,
                        Err(e) => return Some(Err(e)),
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
