use lru::LruCache;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::any::Any;
use std::fmt::Display;
use std::num::NonZeroUsize;

use crate::collection::Document;
use crate::common::{Value, ELEMENT_FIELD};
use crate::errors::{ErrorKind, LiteDocError, LiteDocResult};

use super::{Filter, FilterProvider, TextFilter};

const REGEX_CACHE_SIZE: usize = 128;

static REGEX_CACHE: Lazy<Mutex<LruCache<String, Regex>>> = Lazy::new(|| {
    let capacity = NonZeroUsize::new(REGEX_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
    Mutex::new(LruCache::new(capacity))
});

/// Compiles `pattern` or returns the cached compilation.
pub(crate) fn compile_regex(pattern: &str) -> LiteDocResult<Regex> {
    let mut cache = REGEX_CACHE.lock();
    if let Some(regex) = cache.get(pattern) {
        return Ok(regex.clone());
    }

    match Regex::new(pattern) {
        Ok(regex) => {
            cache.put(pattern.to_string(), regex.clone());
            Ok(regex)
        }
        Err(e) => {
            log::error!("Invalid regex pattern '{}': {}", pattern, e);
            Err(LiteDocError::new(
                &format!("Invalid regex pattern '{}': {}", pattern, e),
                ErrorKind::InvalidFilter,
            ))
        }
    }
}

/// Turns `$options` letters into an inline flag group.
fn options_prefix(options: &str) -> LiteDocResult<String> {
    let mut flags = String::new();
    for option in options.chars() {
        match option {
            'i' | 'm' | 's' | 'x' => {
                if !flags.contains(option) {
                    flags.push(option)
                }
            }
            other => {
                log::error!("Unsupported regex option '{}'", other);
                return Err(LiteDocError::new(
                    &format!("Unsupported regex option '{}'", other),
                    ErrorKind::InvalidFilter,
                ));
            }
        }
    }

    if flags.is_empty() {
        Ok(flags)
    } else {
        Ok(format!("(?{})", flags))
    }
}

/// Matches string fields against a regular expression.
///
/// Non-string values never match. On arrays, any string element may match.
/// The pattern is compiled lazily through a shared LRU cache, and
/// [FilterProvider::validate] surfaces a malformed pattern as
/// [ErrorKind::InvalidFilter] before the query runs.
pub(crate) struct RegexFilter {
    field_name: String,
    pattern: String,
    options: String,
}

impl RegexFilter {
    pub(crate) fn new(field_name: String, pattern: String, options: String) -> Self {
        RegexFilter {
            field_name,
            pattern,
            options,
        }
    }

    fn full_pattern(&self) -> LiteDocResult<String> {
        Ok(format!("{}{}", options_prefix(&self.options)?, self.pattern))
    }

    fn regex(&self) -> LiteDocResult<Regex> {
        compile_regex(&self.full_pattern()?)
    }
}

impl Display for RegexFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.options.is_empty() {
            write!(f, "({} =~ /{}/)", self.field_name, self.pattern)
        } else {
            write!(f, "({} =~ /{}/{})", self.field_name, self.pattern, self.options)
        }
    }
}

impl FilterProvider for RegexFilter {
    fn apply(&self, document: &Document) -> LiteDocResult<bool> {
        let regex = self.regex()?;
        let matched = match document.get(&self.field_name) {
            Some(Value::String(s)) => regex.is_match(&s),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str())
                .any(|s| regex.is_match(s)),
            _ => false,
        };
        Ok(matched)
    }

    fn validate(&self) -> LiteDocResult<()> {
        self.regex().map(|_| ())
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field_name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Matches documents whose array field has at least one element satisfying
/// the inner filter.
///
/// Document elements are tested directly. Scalar elements are wrapped as
/// `{"$": element}`, so the inner filter addresses them through the `$`
/// pseudo field.
pub(crate) struct ElementMatchFilter {
    field_name: String,
    filter: Filter,
}

impl ElementMatchFilter {
    pub(crate) fn new(field_name: String, filter: Filter) -> Self {
        ElementMatchFilter { field_name, filter }
    }

    fn match_element(&self, value: &Value) -> LiteDocResult<bool> {
        match value {
            Value::Document(document) => self.filter.apply(document),
            _ => {
                let mut wrapper = Document::new();
                wrapper.put_raw(ELEMENT_FIELD, value.clone());
                self.filter.apply(&wrapper)
            }
        }
    }
}

impl Display for ElementMatchFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} elemMatch {})", self.field_name, self.filter)
    }
}

impl FilterProvider for ElementMatchFilter {
    fn apply(&self, document: &Document) -> LiteDocResult<bool> {
        match document.get(&self.field_name) {
            Some(Value::Array(items)) => {
                for item in items.iter() {
                    if self.match_element(item)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    fn validate(&self) -> LiteDocResult<()> {
        let mut nested_text = false;
        self.filter.walk(&mut |f| {
            if f.downcast_ref::<TextFilter>().is_some() {
                nested_text = true;
            }
        });
        if nested_text {
            log::error!("Text search is not supported inside elemMatch: {}", self);
            return Err(LiteDocError::new(
                "Text search is not supported inside elemMatch",
                ErrorKind::InvalidFilter,
            ));
        }
        self.filter.validate_tree()
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field_name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
