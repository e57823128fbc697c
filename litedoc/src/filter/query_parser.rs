use crate::collection::Document;
use crate::common::{
    Value, ELEMENT_FIELD, OP_AND, OP_ELEM_MATCH, OP_EQ, OP_EXISTS, OP_GT, OP_GTE, OP_IN, OP_LT,
    OP_LTE, OP_NE, OP_NIN, OP_NOR, OP_NOT, OP_OPTIONS, OP_OR, OP_REGEX, OP_SEARCH, OP_TEXT,
};
use crate::errors::{ErrorKind, LiteDocError, LiteDocResult};

use super::{all, and, field, nor, or, text, Filter};

/// Builds a [Filter] from a query document in the MongoDB query language.
///
/// Top-level entries are implicitly combined with `and`. A field mapped to a
/// plain value is an equality test; a field mapped to a document of `$`
/// operators applies each operator. Supported operators are `$eq`, `$ne`,
/// `$gt`, `$gte`, `$lt`, `$lte`, `$in`, `$nin`, `$exists`, `$regex` (with
/// `$options`), `$elemMatch` and `$not` on fields, plus `$and`, `$or`,
/// `$nor` and `$text` at the top level. Anything else fails with
/// [ErrorKind::InvalidFilter].
///
/// # Examples
///
/// ```rust
/// use litedoc::doc;
/// use litedoc::filter::parse_filter;
///
/// let filter = parse_filter(&doc! {
///     category: "News",
///     views: { "$gt": 2, "$lte": 10 },
///     "$or": [ { "user.status": "author" }, { likes: { "$gte": 5 } } ],
/// }).unwrap();
/// ```
pub fn parse_filter(query: &Document) -> LiteDocResult<Filter> {
    let mut filters = Vec::with_capacity(query.size());
    for (key, value) in query.iter() {
        filters.push(parse_entry(key, value)?);
    }
    Ok(combine(filters))
}

fn combine(mut filters: Vec<Filter>) -> Filter {
    match filters.len() {
        0 => all(),
        1 => filters.remove(0),
        _ => and(filters),
    }
}

fn parse_entry(key: &str, value: &Value) -> LiteDocResult<Filter> {
    match key {
        OP_AND => Ok(and(parse_clauses(key, value)?)),
        OP_OR => Ok(or(parse_clauses(key, value)?)),
        OP_NOR => Ok(nor(parse_clauses(key, value)?)),
        OP_TEXT => parse_text(value),
        _ if key.starts_with('$') => Err(invalid(&format!("Unknown top-level operator {}", key))),
        _ => match value {
            Value::Document(ops) if is_operator_document(ops) => parse_operators(key, ops),
            _ => Ok(field(key).eq(value.clone())),
        },
    }
}

fn parse_clauses(operator: &str, value: &Value) -> LiteDocResult<Vec<Filter>> {
    let clauses = match value {
        Value::Array(items) if !items.is_empty() => items,
        _ => {
            return Err(invalid(&format!(
                "{} expects a non-empty array of query documents",
                operator
            )))
        }
    };

    clauses
        .iter()
        .map(|clause| match clause {
            Value::Document(query) => parse_filter(query),
            other => Err(invalid(&format!(
                "{} expects query documents, found {}",
                operator, other
            ))),
        })
        .collect()
}

fn parse_text(value: &Value) -> LiteDocResult<Filter> {
    let spec = value
        .as_document()
        .ok_or_else(|| invalid("$text expects a document with $search"))?;

    let mut search = None;
    for (key, value) in spec.iter() {
        match (key.as_str(), value) {
            (OP_SEARCH, Value::String(s)) => search = Some(s.as_str()),
            (OP_SEARCH, other) => {
                return Err(invalid(&format!("$search expects a string, found {}", other)))
            }
            (other, _) => return Err(invalid(&format!("Unsupported $text option {}", other))),
        }
    }

    match search {
        Some(search) => Ok(text(search)),
        None => Err(invalid("$text requires $search")),
    }
}

/// A document is an operator document when its keys are `$` operators. Mixing
/// operators with plain fields is rejected.
fn is_operator_document(document: &Document) -> bool {
    document.keys().next().is_some_and(|k| k.starts_with('$'))
}

fn parse_operators(field_name: &str, ops: &Document) -> LiteDocResult<Filter> {
    let mut filters = Vec::with_capacity(ops.size());
    let options = match ops.get(OP_OPTIONS) {
        Some(Value::String(options)) => Some(options),
        Some(other) => {
            return Err(invalid(&format!("$options expects a string, found {}", other)))
        }
        None => None,
    };

    for (op, value) in ops.iter() {
        let filter = match op.as_str() {
            OP_EQ => field(field_name).eq(value.clone()),
            OP_NE => field(field_name).ne(value.clone()),
            OP_GT => field(field_name).gt(value.clone()),
            OP_GTE => field(field_name).gte(value.clone()),
            OP_LT => field(field_name).lt(value.clone()),
            OP_LTE => field(field_name).lte(value.clone()),
            OP_IN => field(field_name).in_array(expect_array(op, value)?),
            OP_NIN => field(field_name).not_in(expect_array(op, value)?),
            OP_EXISTS => field(field_name).exists(truthy(op, value)?),
            OP_REGEX => {
                let pattern = value
                    .as_str()
                    .ok_or_else(|| invalid(&format!("$regex expects a string, found {}", value)))?;
                let options = options.as_deref().unwrap_or("");
                field(field_name).regex_with_options(pattern, options)
            }
            OP_OPTIONS => {
                if ops.contains_key(OP_REGEX) {
                    continue;
                }
                return Err(invalid("$options requires $regex"));
            }
            OP_ELEM_MATCH => parse_elem_match(field_name, value)?,
            OP_NOT => match value {
                Value::Document(inner) if is_operator_document(inner) => {
                    parse_operators(field_name, inner)?.not()
                }
                other => {
                    return Err(invalid(&format!(
                        "$not expects an operator document, found {}",
                        other
                    )))
                }
            },
            other if other.starts_with('$') => {
                return Err(invalid(&format!("Unknown query operator {}", other)))
            }
            other => {
                return Err(invalid(&format!(
                    "Cannot mix operators with field {} in the condition on {}",
                    other, field_name
                )))
            }
        };
        filters.push(filter);
    }

    Ok(combine(filters))
}

fn parse_elem_match(field_name: &str, value: &Value) -> LiteDocResult<Filter> {
    let condition = match value {
        Value::Document(condition) if !condition.is_empty() => condition,
        other => {
            return Err(invalid(&format!(
                "$elemMatch expects a non-empty document, found {}",
                other
            )))
        }
    };

    // operators directly under $elemMatch apply to scalar elements
    let element_filter = if is_operator_document(condition)
        && !condition
            .keys()
            .any(|k| matches!(k.as_str(), OP_AND | OP_OR | OP_NOR | OP_TEXT))
    {
        parse_operators(ELEMENT_FIELD, condition)?
    } else {
        parse_filter(condition)?
    };
    Ok(field(field_name).elem_match(element_filter))
}

fn expect_array(op: &str, value: &Value) -> LiteDocResult<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items.clone()),
        other => Err(invalid(&format!("{} expects an array, found {}", op, other))),
    }
}

fn truthy(op: &str, value: &Value) -> LiteDocResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::I64(_) | Value::F64(_) => Ok(value.as_f64().is_some_and(|n| n != 0.0)),
        other => Err(invalid(&format!("{} expects a boolean, found {}", op, other))),
    }
}

fn invalid(message: &str) -> LiteDocError {
    log::error!("{}", message);
    LiteDocError::new(message, ErrorKind::InvalidFilter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::filter::is_all_filter;

    fn matches(query: Document, document: &Document) -> bool {
        parse_filter(&query).unwrap().apply(document).unwrap()
    }

    fn post() -> Document {
        doc! {
            title: "Post Two",
            category: "Technology",
            likes: 4,
            tags: ["news", "events"],
            user: { name: "John Doe", status: "author" },
            comments: [
                { user: "Mary Williams", body: "Comment One" },
                { user: "Harry White", body: "Comment Two" },
            ],
            scores: [70, 82, 95],
        }
    }

    #[test]
    fn test_empty_query_matches_all() {
        assert!(is_all_filter(&parse_filter(&doc! {}).unwrap()));
    }

    #[test]
    fn test_implicit_equality_and_conjunction() {
        let document = post();
        assert!(matches(doc! { category: "Technology", likes: 4 }, &document));
        assert!(!matches(doc! { category: "Technology", likes: 5 }, &document));
        assert!(matches(doc! { tags: "news" }, &document));
    }

    #[test]
    fn test_dotted_keys_and_embedded_equality() {
        let document = post();
        let mut query = Document::new();
        query.put_raw("user.status", "author");
        assert!(matches(query, &document));

        // an embedded document must match exactly
        assert!(!matches(doc! { user: { status: "author" } }, &document));
        assert!(matches(
            doc! { user: { name: "John Doe", status: "author" } },
            &document
        ));
    }

    #[test]
    fn test_comparison_operators() {
        let document = post();
        assert!(matches(doc! { likes: { "$gt": 3, "$lte": 4 } }, &document));
        assert!(!matches(doc! { likes: { "$lt": 4 } }, &document));
        assert!(matches(doc! { likes: { "$ne": 5 } }, &document));
        assert!(matches(doc! { likes: { "$eq": 4 } }, &document));
        assert!(matches(doc! { likes: { "$in": [1, 4] } }, &document));
        assert!(matches(doc! { likes: { "$nin": [1, 2] } }, &document));
    }

    #[test]
    fn test_exists_and_not() {
        let document = post();
        assert!(matches(doc! { title: { "$exists": true } }, &document));
        assert!(matches(doc! { body: { "$exists": false } }, &document));
        assert!(matches(doc! { likes: { "$exists": 1 } }, &document));
        assert!(matches(doc! { likes: { "$not": { "$gt": 10 } } }, &document));
        assert!(!matches(doc! { likes: { "$not": { "$gt": 1 } } }, &document));
    }

    #[test]
    fn test_logical_operators() {
        let document = post();
        assert!(matches(
            doc! { "$or": [ { likes: 100 }, { category: "Technology" } ] },
            &document
        ));
        assert!(matches(
            doc! { "$and": [ { likes: { "$gte": 4 } }, { tags: "events" } ] },
            &document
        ));
        assert!(!matches(
            doc! { "$nor": [ { likes: 4 }, { category: "News" } ] },
            &document
        ));
    }

    #[test]
    fn test_regex_with_options() {
        let document = post();
        assert!(matches(doc! { title: { "$regex": "^post", "$options": "i" } }, &document));
        assert!(!matches(doc! { title: { "$regex": "^post" } }, &document));
        assert!(matches(
            doc! { title: { "$regex": "Two$" }, likes: { "$gt": 1 } },
            &document
        ));
    }

    #[test]
    fn test_elem_match() {
        let document = post();
        assert!(matches(
            doc! { comments: { "$elemMatch": { user: "Mary Williams" } } },
            &document
        ));
        assert!(!matches(
            doc! { comments: { "$elemMatch": { user: "Mary Williams", body: "Comment Two" } } },
            &document
        ));
        assert!(matches(
            doc! { scores: { "$elemMatch": { "$gte": 80, "$lt": 85 } } },
            &document
        ));
    }

    #[test]
    fn test_text() {
        let filter = parse_filter(&doc! { "$text": { "$search": "\"Post O\"" } }).unwrap();
        assert!(filter.downcast_ref::<crate::filter::TextFilter>().is_some());
    }

    #[test]
    fn test_invalid_queries() {
        let cases = vec![
            doc! { "$where": "1" },
            doc! { likes: { "$foo": 1 } },
            doc! { likes: { "$gt": 1, plain: 2 } },
            doc! { likes: { "$in": 1 } },
            doc! { "$or": [] },
            doc! { "$or": [1] },
            doc! { "$text": { "$language": "en" } },
            doc! { title: { "$options": "i" } },
            doc! { title: { "$regex": 5 } },
            doc! { title: { "$not": 5 } },
            doc! { comments: { "$elemMatch": 5 } },
        ];
        for query in cases {
            let err = parse_filter(&query).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidFilter, "{:?}", query);
        }
    }
}
