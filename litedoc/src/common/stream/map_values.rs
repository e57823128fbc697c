use crate::collection::{Document, ObjectId};
use crate::errors::LiteDocResult;
use crate::store::DocumentMap;

/// Lazily walks a [DocumentMap] in `_id` order.
///
/// Each step looks up the entry following the last visited id, so a document
/// is read at the moment the scan reaches it. Documents inserted behind the
/// scan position are not visited; documents removed ahead of it are skipped.
pub struct MapValues {
    map: DocumentMap,
    current: Option<ObjectId>,
    exhausted: bool,
}

impl MapValues {
    pub fn new(map: DocumentMap) -> Self {
        MapValues {
            map,
            current: None,
            exhausted: false,
        }
    }

    pub fn starting_after(map: DocumentMap, after: ObjectId) -> Self {
        MapValues {
            map,
            current: Some(after),
            exhausted: false,
        }
    }
}

impl Iterator for MapValues {
    type Item = LiteDocResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        match self.map.higher_entry(self.current.as_ref()) {
            Ok(Some((id, document))) => {
                self.current = Some(id);
                Some(Ok(document))
            }
            Ok(None) => {
                self.exhausted = true;
                None
            }
            Err(e) => {
                self.exhausted = true;
                Some(Err(e))
            }
        }
    }
}
