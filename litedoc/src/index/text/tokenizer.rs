use std::ops::Deref;
use std::sync::Arc;

/// Splits text into searchable tokens for text indexes and `$text`
/// queries.
///
/// The default [TokenizerProvider::tokenize] lowercases the text, splits it
/// on every character that is not alphanumeric and drops the
/// provider's stop words. The same provider must be used to index a field
/// and to search it.
pub trait TokenizerProvider: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let stop_words = self.stop_words();
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty() && !stop_words.contains(token))
            .map(|token| token.to_string())
            .collect()
    }

    /// Words too common to be worth indexing.
    fn stop_words(&self) -> &'static [&'static str];
}

/// A cloneable handle to a [TokenizerProvider].
#[derive(Clone)]
pub struct Tokenizer {
    inner: Arc<dyn TokenizerProvider>,
}

impl Tokenizer {
    pub fn new<T: TokenizerProvider + 'static>(inner: T) -> Self {
        Tokenizer {
            inner: Arc::new(inner),
        }
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Tokenizer::new(EnglishTokenizer)
    }
}

impl Deref for Tokenizer {
    type Target = Arc<dyn TokenizerProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Tokenizer with the English stop word list.
pub struct EnglishTokenizer;

impl TokenizerProvider for EnglishTokenizer {
    fn stop_words(&self) -> &'static [&'static str] {
        ENGLISH_STOP_WORDS
    }
}

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "me",
    "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once", "only",
    "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she", "should",
    "so", "some", "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why",
    "will", "with", "you", "your", "yours", "yourself", "yourselves",
];
