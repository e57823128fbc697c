use std::collections::HashSet;

use crate::collection::{Document, ObjectId};
use crate::errors::LiteDocResult;
use crate::store::DocumentMap;

/// Fetches the documents of a list of candidate ids, in list order.
///
/// Ids repeat when a multikey index holds several entries for one document;
/// each document is produced once. Ids whose document is gone by the time
/// the stream reaches them are skipped.
pub(crate) struct IndexedStream {
    map: DocumentMap,
    ids: std::vec::IntoIter<ObjectId>,
    seen: HashSet<ObjectId>,
}

impl IndexedStream {
    pub fn new(map: DocumentMap, ids: Vec<ObjectId>) -> Self {
        IndexedStream {
            map,
            ids: ids.into_iter(),
            seen: HashSet::new(),
        }
    }
}

impl Iterator for IndexedStream {
    type Item = LiteDocResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        for id in self.ids.by_ref() {
            if !self.seen.insert(id) {
                continue;
            }
            match self.map.find(&id) {
                Ok(Some(document)) => return Some(Ok(document)),
                Ok(None) => {
                    log::debug!("Indexed id {} no longer exists, skipping", id);
                    continue;
                }
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_indexed_stream_dedups_and_skips_missing() {
        let map = DocumentMap::new("posts");
        let a = map.insert(doc! { n: 1 }).unwrap();
        let b = map.insert(doc! { n: 2 }).unwrap();
        let gone = ObjectId::new();

        let stream = IndexedStream::new(map, vec![b, a, b, gone]);
        let values: Vec<i64> = stream
            .map(|d| d.unwrap().get("n").unwrap().as_i64().unwrap())
            .collect();
        assert_eq!(values, vec![2, 1]);
    }
}
