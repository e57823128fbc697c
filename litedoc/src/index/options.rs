use crate::common::{NON_UNIQUE_INDEX, TEXT_INDEX, UNIQUE_INDEX};

/// Options for creating an index.
///
/// * `index_type` is one of `unique`, `non-unique` or `text`.
/// * `background` is recorded on the index descriptor; the initial build
///   always completes before `create_index` returns.
/// * `drop_dups` makes a unique index build remove later duplicates (in
///   `_id` order) instead of failing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexOptions {
    index_type: String,
    background: bool,
    drop_dups: bool,
}

impl IndexOptions {
    pub fn new(index_type: &str) -> IndexOptions {
        IndexOptions {
            index_type: index_type.to_string(),
            background: false,
            drop_dups: false,
        }
    }

    pub fn index_type(&self) -> &str {
        &self.index_type
    }

    pub fn background(&self) -> bool {
        self.background
    }

    pub fn drop_dups(&self) -> bool {
        self.drop_dups
    }

    pub fn with_background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }

    pub fn with_drop_dups(mut self, drop_dups: bool) -> Self {
        self.drop_dups = drop_dups;
        self
    }
}

impl Default for IndexOptions {
    fn default() -> Self {
        IndexOptions::new(NON_UNIQUE_INDEX)
    }
}

pub fn unique_index() -> IndexOptions {
    IndexOptions::new(UNIQUE_INDEX)
}

pub fn non_unique_index() -> IndexOptions {
    IndexOptions::new(NON_UNIQUE_INDEX)
}

pub fn text_index() -> IndexOptions {
    IndexOptions::new(TEXT_INDEX)
}
