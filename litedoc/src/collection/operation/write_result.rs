use crate::collection::ObjectId;

/// The result of an insert: the ids of the inserted documents, in insert
/// order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteResult {
    inserted_ids: Vec<ObjectId>,
}

impl WriteResult {
    pub(crate) fn new(inserted_ids: Vec<ObjectId>) -> Self {
        Self { inserted_ids }
    }

    pub fn inserted_ids(&self) -> &[ObjectId] {
        &self.inserted_ids
    }

    pub fn inserted_count(&self) -> usize {
        self.inserted_ids.len()
    }
}

impl IntoIterator for WriteResult {
    type Item = ObjectId;
    type IntoIter = std::vec::IntoIter<ObjectId>;

    fn into_iter(self) -> Self::IntoIter {
        self.inserted_ids.into_iter()
    }
}

/// The result of an update.
///
/// A matched document whose new version equals the old one is counted in
/// `matched` only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateResult {
    matched: usize,
    modified: usize,
    upserted_id: Option<ObjectId>,
}

impl UpdateResult {
    pub(crate) fn new(matched: usize, modified: usize, upserted_id: Option<ObjectId>) -> Self {
        Self {
            matched,
            modified,
            upserted_id,
        }
    }

    pub fn matched(&self) -> usize {
        self.matched
    }

    pub fn modified(&self) -> usize {
        self.modified
    }

    pub fn upserted_id(&self) -> Option<ObjectId> {
        self.upserted_id
    }
}

/// The result of a remove.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoveResult {
    deleted: usize,
}

impl RemoveResult {
    pub(crate) fn new(deleted: usize) -> Self {
        Self { deleted }
    }

    pub fn deleted(&self) -> usize {
        self.deleted
    }
}
