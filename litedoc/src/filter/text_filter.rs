use std::any::Any;
use std::collections::HashSet;
use std::fmt::Display;

use crate::collection::Document;
use crate::common::Value;
use crate::errors::{ErrorKind, LiteDocError, LiteDocResult};
use crate::index::text::Tokenizer;

use super::FilterProvider;

/// Full-text search over a field covered by a text index.
///
/// The search string is split into quoted phrases and bare terms. A
/// document matches when every term appears as a token of the field and
/// every phrase appears, ignoring case, starting at a word boundary.
///
/// A `$text` query does not name its field. Each plan of the query binds a
/// copy of it to the text index of the collection being searched, so one
/// filter can run against collections indexing different fields; a filter
/// built with `field("x").text(..)` starts bound.
#[derive(Clone)]
pub(crate) struct TextFilter {
    field_name: Option<String>,
    search: String,
    phrases: Vec<String>,
    terms: Vec<String>,
    tokenizer: Tokenizer,
}

impl TextFilter {
    pub(crate) fn new(field_name: Option<String>, search: String) -> Self {
        let tokenizer = Tokenizer::default();
        let (phrases, terms) = parse_search(&search, &tokenizer);

        TextFilter {
            field_name,
            search,
            phrases,
            terms,
            tokenizer,
        }
    }

    /// A copy of this search reading `field_name`.
    pub(crate) fn bound_to(&self, field_name: &str) -> TextFilter {
        TextFilter {
            field_name: Some(field_name.to_string()),
            ..self.clone()
        }
    }

    pub(crate) fn bound_field(&self) -> Option<&str> {
        self.field_name.as_deref()
    }

    pub(crate) fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub(crate) fn terms(&self) -> &[String] {
        &self.terms
    }

    fn matches_text(&self, text: &str) -> bool {
        if self.phrases.is_empty() && self.terms.is_empty() {
            return false;
        }

        let lower = text.to_lowercase();
        if !self.phrases.iter().all(|phrase| contains_phrase(&lower, phrase)) {
            return false;
        }

        if self.terms.is_empty() {
            return true;
        }
        let tokens: HashSet<String> = self.tokenizer.tokenize(text).into_iter().collect();
        self.terms.iter().all(|term| tokens.contains(term))
    }
}

impl Display for TextFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field_name {
            Some(name) => write!(f, "({} text {:?})", name, self.search),
            None => write!(f, "($text {:?})", self.search),
        }
    }
}

impl FilterProvider for TextFilter {
    fn apply(&self, document: &Document) -> LiteDocResult<bool> {
        let field_name = self.field_name.as_deref().ok_or_else(|| {
            log::error!("Text search {} is not bound to a text index", self);
            LiteDocError::new(
                "Text search requires a text index",
                ErrorKind::IndexMissing,
            )
        })?;

        let matched = match document.get(field_name) {
            Some(Value::String(s)) => self.matches_text(&s),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str())
                .any(|s| self.matches_text(s)),
            _ => false,
        };
        Ok(matched)
    }

    fn field_name(&self) -> Option<&str> {
        self.bound_field()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Splits a search string into lowercased quoted phrases and tokenized
/// bare terms. An unterminated quote runs to the end of the string.
fn parse_search(search: &str, tokenizer: &Tokenizer) -> (Vec<String>, Vec<String>) {
    let mut phrases = Vec::new();
    let mut bare = String::new();

    let mut rest = search;
    while let Some(open) = rest.find('"') {
        bare.push_str(&rest[..open]);
        bare.push(' ');
        let after = &rest[open + 1..];
        let (phrase, remaining) = match after.find('"') {
            Some(close) => (&after[..close], &after[close + 1..]),
            None => (after, ""),
        };
        let phrase = phrase.trim().to_lowercase();
        if !phrase.is_empty() {
            phrases.push(phrase);
        }
        rest = remaining;
    }
    bare.push_str(rest);

    let mut terms = tokenizer.tokenize(&bare);
    let mut seen = HashSet::new();
    terms.retain(|term| seen.insert(term.clone()));
    (phrases, terms)
}

/// Returns `true` if `phrase` occurs in `text` at a position preceded by a
/// non-alphanumeric character or the start of the text. Both inputs must
/// already be lowercased.
pub(crate) fn contains_phrase(text: &str, phrase: &str) -> bool {
    text.match_indices(phrase).any(|(idx, _)| {
        text[..idx]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn bound(search: &str) -> TextFilter {
        TextFilter::new(Some("body".to_string()), search.to_string())
    }

    #[test]
    fn test_parse_search() {
        let filter = bound("rust \"Post One\" the engine");
        assert_eq!(filter.phrases(), &["post one".to_string()]);
        assert_eq!(filter.terms(), &["rust".to_string(), "engine".to_string()]);

        let filter = bound("\"unterminated phrase");
        assert_eq!(filter.phrases(), &["unterminated phrase".to_string()]);
        assert!(filter.terms().is_empty());
    }

    #[test]
    fn test_terms_require_all_tokens() {
        let document = doc! { body: "The quick brown fox" };
        assert!(bound("quick fox").apply(&document).unwrap());
        assert!(bound("QUICK").apply(&document).unwrap());
        assert!(!bound("quick cat").apply(&document).unwrap());
        assert!(!bound("qui").apply(&document).unwrap());
    }

    #[test]
    fn test_phrase_matches_at_word_boundary() {
        let document = doc! { body: "This is the body of post two" };
        assert!(bound("\"Post T\"").apply(&document).unwrap());
        assert!(bound("\"body of post\"").apply(&document).unwrap());
        assert!(!bound("\"ost two\"").apply(&document).unwrap());
        assert!(!bound("\"post one\"").apply(&document).unwrap());
    }

    #[test]
    fn test_only_stop_words_never_matches() {
        let document = doc! { body: "the a an" };
        assert!(!bound("the").apply(&document).unwrap());
    }

    #[test]
    fn test_non_string_and_array_values() {
        assert!(!bound("one").apply(&doc! { body: 1 }).unwrap());
        assert!(bound("two").apply(&doc! { body: ["one", "two words"] }).unwrap());
    }

    #[test]
    fn test_unbound_filter_requires_index() {
        let filter = TextFilter::new(None, "post".to_string());
        let err = filter.apply(&doc! { body: "post" }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::IndexMissing);

        let body = filter.bound_to("body");
        assert!(body.apply(&doc! { body: "post" }).unwrap());
        let title = filter.bound_to("title");
        assert!(!title.apply(&doc! { body: "post" }).unwrap());
        assert!(filter.bound_field().is_none());
    }

    #[test]
    fn test_contains_phrase() {
        assert!(contains_phrase("post two", "post t"));
        assert!(contains_phrase("a-post", "post"));
        assert!(!contains_phrase("repost", "post"));
    }
}
