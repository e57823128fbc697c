use std::fmt::Display;

use crate::collection::Document;
use crate::common::{Value, DOC_ID, OP_INC, OP_RENAME, OP_SET, OP_UNSET};
use crate::errors::{ErrorKind, LiteDocError, LiteDocResult};
use crate::filter::Filter;

/// One field update of an operator set.
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateOperator {
    /// Assigns a value, creating the field and missing parents.
    Set(String, Value),
    /// Adds a number to a numeric or absent field.
    Inc(String, Value),
    /// Moves a field's value to a new name.
    Rename(String, String),
    /// Removes a field.
    Unset(String),
}

impl UpdateOperator {
    fn field_name(&self) -> &str {
        match self {
            UpdateOperator::Set(field, _)
            | UpdateOperator::Inc(field, _)
            | UpdateOperator::Rename(field, _)
            | UpdateOperator::Unset(field) => field,
        }
    }

    fn touches_id(&self) -> bool {
        let is_id = |path: &str| path == DOC_ID || path.starts_with(&format!("{}.", DOC_ID));
        match self {
            UpdateOperator::Rename(from, to) => is_id(from) || is_id(to),
            other => is_id(other.field_name()),
        }
    }

    fn apply(&self, document: &mut Document) -> LiteDocResult<()> {
        match self {
            UpdateOperator::Set(field, value) => document.put(field.as_str(), value.clone()),
            UpdateOperator::Inc(field, delta) => {
                let current = document.get(field);
                let value = increment(field, current.as_ref(), delta)?;
                document.put(field.as_str(), value)
            }
            UpdateOperator::Rename(from, to) => match document.remove(from) {
                Some(value) => document.put(to.as_str(), value),
                None => Ok(()),
            },
            UpdateOperator::Unset(field) => {
                document.remove(field);
                Ok(())
            }
        }
    }
}

impl Display for UpdateOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateOperator::Set(field, value) => write!(f, "{} {{{}: {}}}", OP_SET, field, value),
            UpdateOperator::Inc(field, value) => write!(f, "{} {{{}: {}}}", OP_INC, field, value),
            UpdateOperator::Rename(from, to) => write!(f, "{} {{{}: {}}}", OP_RENAME, from, to),
            UpdateOperator::Unset(field) => write!(f, "{} {{{}}}", OP_UNSET, field),
        }
    }
}

/// Fluent builder of an operator set, see [UpdateSpec::operators].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateOperators {
    operators: Vec<UpdateOperator>,
}

impl UpdateOperators {
    pub fn set<T: Into<Value>>(mut self, field: &str, value: T) -> Self {
        self.operators
            .push(UpdateOperator::Set(field.to_string(), value.into()));
        self
    }

    pub fn inc<T: Into<Value>>(mut self, field: &str, value: T) -> Self {
        self.operators
            .push(UpdateOperator::Inc(field.to_string(), value.into()));
        self
    }

    pub fn rename(mut self, field: &str, new_name: &str) -> Self {
        self.operators
            .push(UpdateOperator::Rename(field.to_string(), new_name.to_string()));
        self
    }

    pub fn unset(mut self, field: &str) -> Self {
        self.operators.push(UpdateOperator::Unset(field.to_string()));
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
enum UpdateKind {
    Replace(Document),
    Operators(Vec<UpdateOperator>),
}

/// The change an update command makes to each matched document: either a
/// full replacement or an ordered list of operators.
///
/// # Examples
///
/// ```rust
/// use litedoc::collection::UpdateSpec;
/// use litedoc::doc;
///
/// let fluent: UpdateSpec = UpdateSpec::operators()
///     .set("body", "This is the updated post")
///     .inc("likes", 2)
///     .into();
///
/// let parsed = UpdateSpec::parse(&doc! {
///     "$set": { body: "This is the updated post" },
///     "$inc": { likes: 2 },
/// })
/// .unwrap();
/// assert_eq!(fluent, parsed);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateSpec {
    kind: UpdateKind,
}

impl UpdateSpec {
    pub fn operators() -> UpdateOperators {
        UpdateOperators::default()
    }

    /// A replacement of every field except `_id`.
    pub fn replace(document: Document) -> UpdateSpec {
        UpdateSpec {
            kind: UpdateKind::Replace(document),
        }
    }

    /// Parses an update document.
    ///
    /// A document whose keys are all operators (`$set`, `$inc`, `$rename`,
    /// `$unset`) is an operator set; a document without operator keys is a
    /// replacement. Operator operands are documents of field paths;
    /// embedded documents inside an operand are flattened into dotted
    /// paths, so `{$set: {user: {name: "x"}}}` sets `user.name` only.
    ///
    /// Fails with [ErrorKind::InvalidUpdate] when operator and plain keys
    /// are mixed, for an unknown operator or a malformed operand.
    pub fn parse(update: &Document) -> LiteDocResult<UpdateSpec> {
        let operator_keys = update.keys().filter(|k| k.starts_with('$')).count();
        if operator_keys == 0 {
            return Ok(UpdateSpec::replace(update.clone()));
        }
        if operator_keys != update.size() {
            return Err(invalid_update(&format!(
                "Update document {:?} mixes operators with replacement fields",
                update
            )));
        }

        let mut operators = Vec::new();
        for (op, operand) in update.iter() {
            let Value::Document(operand) = operand else {
                return Err(invalid_update(&format!(
                    "Operand of {} must be a document, found {}",
                    op, operand
                )));
            };

            for (field, value) in operand.leaf_entries() {
                let operator = match op.as_str() {
                    OP_SET => UpdateOperator::Set(field, value),
                    OP_INC => UpdateOperator::Inc(field, value),
                    OP_UNSET => UpdateOperator::Unset(field),
                    OP_RENAME => match value {
                        Value::String(new_name) => UpdateOperator::Rename(field, new_name),
                        other => {
                            return Err(invalid_update(&format!(
                                "{} target of field {} must be a string, found {}",
                                OP_RENAME, field, other
                            )))
                        }
                    },
                    unknown => {
                        return Err(invalid_update(&format!(
                            "Unknown update operator {}",
                            unknown
                        )))
                    }
                };
                operators.push(operator);
            }
        }

        Ok(UpdateSpec {
            kind: UpdateKind::Operators(operators),
        })
    }

    pub fn is_replacement(&self) -> bool {
        matches!(self.kind, UpdateKind::Replace(_))
    }

    /// Computes the new version of `document`. The input is left untouched
    /// whatever the outcome.
    ///
    /// Fails with [ErrorKind::InvalidOperation] when the update would change
    /// `_id` or overflow an integer, and with [ErrorKind::TypeMismatch] when
    /// `$inc` meets a non-numeric value.
    pub fn apply(&self, document: &Document) -> LiteDocResult<Document> {
        match &self.kind {
            UpdateKind::Replace(replacement) => {
                let mut updated = replacement.clone();
                match (updated.get(DOC_ID), document.id()) {
                    (Some(new_id), Some(id)) if new_id != Value::Id(id) => {
                        return Err(id_change(&format!(
                            "Replacement cannot change _id {} to {}",
                            id, new_id
                        )));
                    }
                    (_, Some(id)) => updated.set_id(id),
                    (_, None) => {}
                }
                Ok(updated)
            }
            UpdateKind::Operators(operators) => {
                let mut updated = document.clone();
                for operator in operators {
                    if operator.touches_id() {
                        return Err(id_change(&format!("Update {} cannot modify _id", operator)));
                    }
                    operator.apply(&mut updated)?;
                }
                Ok(updated)
            }
        }
    }

    /// Builds the document an upsert inserts when nothing matches `filter`.
    ///
    /// The equality predicates of the filter (top level or children of a
    /// top-level `and`, `_id` included) seed the document. A replacement is
    /// merged over the seed, keeping the seeded `_id`, and operators are
    /// applied on top of it.
    pub(crate) fn upsert_document(&self, filter: &Filter) -> LiteDocResult<Document> {
        let mut seed = Document::new();
        for conjunct in filter.conjuncts() {
            if let (Some(field), Some(value)) = (conjunct.field_name(), conjunct.equality_value()) {
                seed.put(field, value.clone())?;
            }
        }

        match &self.kind {
            UpdateKind::Replace(replacement) => {
                if let Some(id) = seed.id() {
                    if replacement.get(DOC_ID).is_some_and(|v| v != Value::Id(id)) {
                        return Err(id_change(&format!(
                            "Replacement cannot change _id {} of the upsert filter",
                            id
                        )));
                    }
                }
                let seeded_id = seed.id();
                seed.merge(replacement);
                if let Some(id) = seeded_id {
                    seed.set_id(id);
                }
                Ok(seed)
            }
            UpdateKind::Operators(_) => self.apply(&seed),
        }
    }
}

impl From<UpdateOperators> for UpdateSpec {
    fn from(operators: UpdateOperators) -> Self {
        UpdateSpec {
            kind: UpdateKind::Operators(operators.operators),
        }
    }
}

fn increment(field: &str, current: Option<&Value>, delta: &Value) -> LiteDocResult<Value> {
    if !delta.is_number() {
        log::error!("{} operand of field {} is not a number: {}", OP_INC, field, delta);
        return Err(LiteDocError::new(
            &format!(
                "Cannot increment field {} by non-numeric value {}",
                field, delta
            ),
            ErrorKind::TypeMismatch,
        ));
    }

    match (current, delta) {
        (None, delta) => Ok(delta.clone()),
        (Some(Value::I64(a)), Value::I64(b)) => match a.checked_add(*b) {
            Some(sum) => Ok(Value::I64(sum)),
            None => {
                log::error!("Incrementing field {} by {} overflows {}", field, b, a);
                Err(LiteDocError::new(
                    &format!("Incrementing field {} with value {} by {} overflows", field, a, b),
                    ErrorKind::InvalidOperation,
                ))
            }
        },
        (Some(current), delta) if current.is_number() => {
            let sum = current.as_f64().unwrap_or_default() + delta.as_f64().unwrap_or_default();
            Ok(Value::F64(sum))
        }
        (Some(current), _) => {
            log::error!(
                "Cannot apply {} to field {} holding {}",
                OP_INC,
                field,
                current.type_name()
            );
            Err(LiteDocError::new(
                &format!(
                    "Cannot apply {} to non-numeric field {} of type {}",
                    OP_INC,
                    field,
                    current.type_name()
                ),
                ErrorKind::TypeMismatch,
            ))
        }
    }
}

fn invalid_update(message: &str) -> LiteDocError {
    log::error!("{}", message);
    LiteDocError::new(message, ErrorKind::InvalidUpdate)
}

fn id_change(message: &str) -> LiteDocError {
    log::error!("{}", message);
    LiteDocError::new(message, ErrorKind::InvalidOperation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::ObjectId;
    use crate::doc;
    use crate::filter::{and, by_id, field};
    use crate::val;

    fn post() -> Document {
        let mut document = doc! {
            title: "Post One",
            likes: 4,
            user: { name: "John Doe", status: "author" },
        };
        document.set_id(ObjectId::new());
        document
    }

    #[test]
    fn test_parse_operators() {
        let spec = UpdateSpec::parse(&doc! {
            "$set": { body: "updated", user: { status: "editor" } },
            "$inc": { likes: 2 },
            "$rename": { title: "headline" },
            "$unset": { draft: 1 },
        })
        .unwrap();
        let expected: UpdateSpec = UpdateSpec::operators()
            .set("body", "updated")
            .set("user.status", "editor")
            .inc("likes", 2)
            .rename("title", "headline")
            .unset("draft")
            .into();
        assert_eq!(spec, expected);
        assert!(!spec.is_replacement());
    }

    #[test]
    fn test_parse_replacement() {
        let spec = UpdateSpec::parse(&doc! { title: "New" }).unwrap();
        assert!(spec.is_replacement());
    }

    #[test]
    fn test_parse_errors() {
        let mixed = UpdateSpec::parse(&doc! { "$set": { a: 1 }, title: "x" }).unwrap_err();
        assert_eq!(mixed.kind(), &ErrorKind::InvalidUpdate);

        let unknown = UpdateSpec::parse(&doc! { "$push": { a: 1 } }).unwrap_err();
        assert_eq!(unknown.kind(), &ErrorKind::InvalidUpdate);

        let operand = UpdateSpec::parse(&doc! { "$set": 5 }).unwrap_err();
        assert_eq!(operand.kind(), &ErrorKind::InvalidUpdate);

        let rename = UpdateSpec::parse(&doc! { "$rename": { a: 1 } }).unwrap_err();
        assert_eq!(rename.kind(), &ErrorKind::InvalidUpdate);
    }

    #[test]
    fn test_apply_operators() {
        let original = post();
        let spec: UpdateSpec = UpdateSpec::operators()
            .set("body", "This is the updated post")
            .set("meta.views", 1)
            .inc("likes", 2)
            .rename("user.status", "user.role")
            .unset("missing")
            .into();
        let updated = spec.apply(&original).unwrap();

        assert_eq!(updated.id(), original.id());
        assert_eq!(updated.get("body"), Some(val!("This is the updated post")));
        assert_eq!(updated.get("meta.views"), Some(val!(1)));
        assert_eq!(updated.get("likes"), Some(val!(6)));
        assert_eq!(updated.get("user.role"), Some(val!("author")));
        assert!(updated.get("user.status").is_none());
        assert_eq!(original.get("likes"), Some(val!(4)));
    }

    #[test]
    fn test_inc_semantics() {
        let original = post();
        let spec: UpdateSpec = UpdateSpec::operators().inc("comments", 1).inc("likes", 0.5).into();
        let updated = spec.apply(&original).unwrap();
        assert_eq!(updated.get("comments"), Some(val!(1)));
        assert_eq!(updated.get("likes"), Some(val!(4.5)));

        let spec: UpdateSpec = UpdateSpec::operators().inc("title", 1).into();
        assert_eq!(spec.apply(&original).unwrap_err().kind(), &ErrorKind::TypeMismatch);

        let spec: UpdateSpec = UpdateSpec::operators().inc("likes", "one").into();
        assert_eq!(spec.apply(&original).unwrap_err().kind(), &ErrorKind::TypeMismatch);

        let spec: UpdateSpec = UpdateSpec::operators().inc("likes", i64::MAX).into();
        assert_eq!(spec.apply(&original).unwrap_err().kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_id_cannot_change() {
        let original = post();
        let spec: UpdateSpec = UpdateSpec::operators().set("_id", ObjectId::new()).into();
        assert_eq!(spec.apply(&original).unwrap_err().kind(), &ErrorKind::InvalidOperation);

        let spec: UpdateSpec = UpdateSpec::operators().rename("title", "_id").into();
        assert_eq!(spec.apply(&original).unwrap_err().kind(), &ErrorKind::InvalidOperation);

        let mut replacement = doc! { title: "other" };
        replacement.set_id(ObjectId::new());
        let spec = UpdateSpec::replace(replacement);
        assert_eq!(spec.apply(&original).unwrap_err().kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_replacement_keeps_id() {
        let original = post();
        let updated = UpdateSpec::replace(doc! { title: "Replaced" })
            .apply(&original)
            .unwrap();
        assert_eq!(updated.id(), original.id());
        assert_eq!(updated.size(), 2);
        assert!(updated.get("likes").is_none());
    }

    #[test]
    fn test_upsert_document_from_filter() {
        let id = ObjectId::new();
        let filter = and(vec![by_id(id), field("category").eq("News"), field("likes").gt(3)]);
        let spec: UpdateSpec = UpdateSpec::operators().set("title", "Post Four").inc("likes", 1).into();

        let document = spec.upsert_document(&filter).unwrap();
        assert_eq!(document.id(), Some(id));
        assert_eq!(document.get("category"), Some(val!("News")));
        assert_eq!(document.get("title"), Some(val!("Post Four")));
        assert_eq!(document.get("likes"), Some(val!(1)));
    }

    #[test]
    fn test_upsert_replacement_takes_filter_id() {
        let id = ObjectId::new();
        let spec = UpdateSpec::replace(doc! { title: "Post Four" });
        let document = spec.upsert_document(&by_id(id)).unwrap();
        assert_eq!(document.id(), Some(id));
        assert_eq!(document.get("title"), Some(val!("Post Four")));
    }

    #[test]
    fn test_upsert_replacement_merges_filter_equalities() {
        let filter = and(vec![field("category").eq("News"), field("likes").gt(3)]);
        let spec = UpdateSpec::replace(doc! { title: "Post Five", likes: 5 });
        let document = spec.upsert_document(&filter).unwrap();
        assert_eq!(document.get("category"), Some(val!("News")));
        assert_eq!(document.get("title"), Some(val!("Post Five")));
        assert_eq!(document.get("likes"), Some(val!(5)));
        assert!(!document.has_id());

        // replacement fields win over seeded ones
        let spec = UpdateSpec::replace(doc! { category: "Sports" });
        let document = spec.upsert_document(&field("category").eq("News")).unwrap();
        assert_eq!(document.get("category"), Some(val!("Sports")));
    }

    #[test]
    fn test_upsert_replacement_cannot_change_filter_id() {
        let spec = UpdateSpec::replace({
            let mut replacement = doc! { title: "Post Four" };
            replacement.put("_id", ObjectId::new()).unwrap();
            replacement
        });
        let err = spec.upsert_document(&by_id(ObjectId::new())).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    }
}
