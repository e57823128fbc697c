use crate::collection::{Document, ObjectId};
use crate::common::{Value, DOC_ID};
use crate::errors::LiteDocResult;
use crate::index::KeyRange;
use std::any::Any;
use std::fmt::Display;
use std::ops::Deref;
use std::sync::Arc;

use super::{AllFilter, AndFilter, EqualsFilter, NotFilter, OrFilter, TextFilter};

/// A node of a filter tree.
///
/// Every predicate (equality, comparison, regex, element match, text search)
/// and every combinator (`and`, `or`, `not`) implements this trait. The query
/// planner inspects nodes through the optional accessors to decide whether an
/// index can narrow the candidate set; [FilterProvider::apply] is always the
/// final word on whether a document matches.
pub trait FilterProvider: Any + Send + Sync + Display {
    /// Evaluates the predicate against a document.
    fn apply(&self, document: &Document) -> LiteDocResult<bool>;

    /// Checks the predicate once before a query runs, e.g. compiles regular
    /// expressions so that malformed patterns fail fast.
    fn validate(&self) -> LiteDocResult<()> {
        Ok(())
    }

    /// The field this predicate reads, for single-field predicates.
    fn field_name(&self) -> Option<&str> {
        None
    }

    /// The range of keys an ordered index on [FilterProvider::field_name]
    /// must scan to find every match.
    fn index_range(&self) -> Option<KeyRange> {
        None
    }

    /// The value an upsert copies into the new document.
    fn equality_value(&self) -> Option<&Value> {
        None
    }

    /// Child filters of a combinator.
    fn logical_filters(&self) -> Option<&[Filter]> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// A cloneable handle to a filter tree.
///
/// # Examples
///
/// ```rust
/// use litedoc::filter::{field, and};
///
/// let news = field("category").eq("News");
/// let popular = field("views").gt(3);
/// let filter = news.and(popular);
/// let same = and(vec![field("category").eq("News"), field("views").gt(3)]);
/// ```
#[derive(Clone)]
pub struct Filter {
    inner: Arc<dyn FilterProvider>,
}

impl Filter {
    pub fn new<T: FilterProvider + 'static>(inner: T) -> Self {
        Filter {
            inner: Arc::new(inner),
        }
    }

    pub fn and(&self, filter: Filter) -> Self {
        Filter::new(AndFilter::new(vec![self.clone(), filter]))
    }

    pub fn or(&self, filter: Filter) -> Self {
        Filter::new(OrFilter::new(vec![self.clone(), filter]))
    }

    pub fn not(&self) -> Self {
        Filter::new(NotFilter::new(self.clone()))
    }

    /// Returns the node downcast to a concrete filter type.
    pub fn downcast_ref<T: FilterProvider>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }

    /// Runs [FilterProvider::validate] on this node and all of its
    /// descendants.
    pub fn validate_tree(&self) -> LiteDocResult<()> {
        self.inner.validate()?;
        if let Some(children) = self.inner.logical_filters() {
            for child in children {
                child.validate_tree()?;
            }
        }
        Ok(())
    }

    /// The conjuncts of this filter: the children of a top-level `and`, or
    /// the filter itself.
    pub fn conjuncts(&self) -> Vec<Filter> {
        match self.downcast_ref::<AndFilter>() {
            Some(and) => and.filters().iter().flat_map(|f| f.conjuncts()).collect(),
            None => vec![self.clone()],
        }
    }

    /// A copy of the tree whose unbound text searches read `field_name`.
    /// Subtrees without one are shared with this tree.
    pub(crate) fn bind_text(&self, field_name: &str) -> Filter {
        if let Some(text) = self.downcast_ref::<TextFilter>() {
            return match text.bound_field() {
                Some(_) => self.clone(),
                None => Filter::new(text.bound_to(field_name)),
            };
        }

        let Some(children) = self.inner.logical_filters() else {
            return self.clone();
        };
        let bound: Vec<Filter> = children.iter().map(|child| child.bind_text(field_name)).collect();
        if bound
            .iter()
            .zip(children)
            .all(|(new, old)| Arc::ptr_eq(&new.inner, &old.inner))
        {
            return self.clone();
        }

        if self.downcast_ref::<AndFilter>().is_some() {
            Filter::new(AndFilter::new(bound))
        } else if self.downcast_ref::<OrFilter>().is_some() {
            Filter::new(OrFilter::new(bound))
        } else if let (Some(_), [inner]) = (self.downcast_ref::<NotFilter>(), bound.as_slice()) {
            Filter::new(NotFilter::new(inner.clone()))
        } else {
            self.clone()
        }
    }

    /// Visits every node of the tree, depth first.
    pub fn walk(&self, visitor: &mut dyn FnMut(&Filter)) {
        visitor(self);
        if let Some(children) = self.inner.logical_filters() {
            for child in children {
                child.walk(visitor);
            }
        }
    }
}

impl Display for Filter {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl Deref for Filter {
    type Target = Arc<dyn FilterProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// A filter matching every document.
pub fn all() -> Filter {
    Filter::new(AllFilter)
}

/// A filter matching the document with the given `_id`.
pub fn by_id(id: ObjectId) -> Filter {
    Filter::new(EqualsFilter::new(DOC_ID.to_string(), Value::Id(id)))
}

pub fn is_all_filter(filter: &Filter) -> bool {
    filter.downcast_ref::<AllFilter>().is_some()
}

/// Applies `predicate` with implicit array semantics: when the document
/// value is an array, the predicate may match the array as a whole or any of
/// its elements.
pub(crate) fn match_value(value: &Value, predicate: &dyn Fn(&Value) -> bool) -> bool {
    match value {
        Value::Array(items) => predicate(value) || items.iter().any(predicate),
        _ => predicate(value),
    }
}
