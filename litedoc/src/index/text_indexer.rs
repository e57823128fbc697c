use std::collections::BTreeSet;

use itertools::Itertools;

use crate::collection::{Document, ObjectId};
use crate::common::Value;
use crate::errors::LiteDocResult;
use crate::filter::TextFilter;

use super::text::Tokenizer;
use super::{IndexDescriptor, IndexEntry, IndexKey, IndexerProvider};

/// Indexer for `text` indexes: maps every token of a string field (or of
/// the strings in an array field) to the ids containing it.
pub(crate) struct TextIndexer {
    descriptor: IndexDescriptor,
    entries: IndexEntry,
    tokenizer: Tokenizer,
}

impl TextIndexer {
    pub fn new(descriptor: IndexDescriptor) -> Self {
        TextIndexer {
            descriptor,
            entries: IndexEntry::new(),
            tokenizer: Tokenizer::default(),
        }
    }

    fn field_name(&self) -> Option<&str> {
        self.descriptor.index_fields().first_field()
    }

    fn token_ids(&self, token: &str) -> BTreeSet<ObjectId> {
        self.entries
            .get(&vec![Value::String(token.to_string())])
            .into_iter()
            .collect()
    }

    /// Posting lists a phrase can be narrowed by. Every token but the last
    /// is a whole word in any match; the last one may be cut short, so it
    /// contributes a prefix lookup unless a stop word could complete it.
    fn phrase_postings(&self, phrase: &str) -> Vec<BTreeSet<ObjectId>> {
        let tokens = self.tokenizer.tokenize(phrase);
        let last_is_partial = phrase.chars().last().is_some_and(|c| c.is_alphanumeric());

        let mut postings = Vec::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            if last_is_partial && i == tokens.len() - 1 {
                let stop_word_prefix = self
                    .tokenizer
                    .stop_words()
                    .iter()
                    .any(|stop| stop.starts_with(token.as_str()));
                if !stop_word_prefix {
                    postings.push(self.entries.scan_prefix(token).into_iter().collect());
                }
            } else {
                postings.push(self.token_ids(token));
            }
        }
        postings
    }
}

impl IndexerProvider for TextIndexer {
    fn descriptor(&self) -> &IndexDescriptor {
        &self.descriptor
    }

    fn entry_keys(&self, document: &Document) -> Vec<IndexKey> {
        let Some(field_name) = self.field_name() else {
            return Vec::new();
        };

        let texts: Vec<String> = match document.get(field_name) {
            Some(Value::String(s)) => vec![s],
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        texts
            .iter()
            .flat_map(|text| self.tokenizer.tokenize(text))
            .unique()
            .map(|token| vec![Value::String(token)])
            .collect()
    }

    fn add_entries(&self, id: &ObjectId, keys: &[IndexKey]) -> LiteDocResult<()> {
        for key in keys {
            self.entries.insert(key.clone(), *id);
        }
        Ok(())
    }

    fn remove_entries(&self, id: &ObjectId, keys: &[IndexKey]) {
        for key in keys {
            self.entries.remove(key, id);
        }
    }

    fn search(&self, filter: &TextFilter) -> LiteDocResult<Option<Vec<ObjectId>>> {
        let mut postings: Vec<BTreeSet<ObjectId>> = filter
            .terms()
            .iter()
            .map(|term| self.token_ids(term))
            .collect();
        for phrase in filter.phrases() {
            postings.extend(self.phrase_postings(phrase));
        }

        if postings.is_empty() {
            return Ok(None);
        }

        // intersect starting from the shortest list
        postings.sort_by_key(|ids| ids.len());
        let mut candidates = postings.remove(0);
        for ids in postings {
            candidates.retain(|id| ids.contains(id));
            if candidates.is_empty() {
                break;
            }
        }
        Ok(Some(candidates.into_iter().collect()))
    }

    fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn clear(&self) {
        self.entries.clear();
    }
}
