use crate::collection::{FindPlan, ObjectId};
use crate::common::{Value, DOC_ID};
use crate::errors::{ErrorKind, LiteDocError, LiteDocResult};
use crate::filter::{Filter, TextFilter};
use crate::index::IndexDescriptor;

/// Chooses how a query reaches its candidate documents.
///
/// Only the conjuncts of the filter (the filter itself, or the children of
/// a top-level `and`) are considered, in order:
///
/// 1. an `_id` equality becomes an id lookup;
/// 2. a text search reads its text index;
/// 3. the first equality or range predicate on the leading field of an
///    index becomes an index scan (a range on `_id` scans the document map
///    itself);
/// 4. anything else scans the whole collection.
#[derive(Clone, Default)]
pub(crate) struct FindOptimizer;

impl FindOptimizer {
    pub fn new() -> Self {
        FindOptimizer
    }

    /// Validates `filter`, binds its text searches to the collection's text
    /// index and returns the plan. The plan carries the bound copy of the
    /// filter; `filter` itself is left as it was.
    ///
    /// `indexes` are the secondary indexes of the collection. Fails with
    /// [ErrorKind::IndexMissing] when a text search has no text index to
    /// read.
    pub fn create_find_plan(
        &self,
        collection_name: &str,
        filter: &Filter,
        indexes: &[IndexDescriptor],
    ) -> LiteDocResult<FindPlan> {
        filter.validate_tree()?;
        let filter = &bind_text_filters(collection_name, filter, indexes)?;

        let conjuncts = filter.conjuncts();

        for conjunct in &conjuncts {
            if conjunct.field_name() == Some(DOC_ID) {
                if let Some(Value::Id(id)) = conjunct.equality_value() {
                    log::debug!("Planning id lookup of {} in {}", id, collection_name);
                    return Ok(FindPlan::id_lookup(filter.clone(), *id));
                }
            }
        }

        for conjunct in &conjuncts {
            if let Some(text) = conjunct.downcast_ref::<TextFilter>() {
                if let Some(descriptor) = text_index_of(text, indexes) {
                    log::debug!("Planning text scan of {} for {}", descriptor, text);
                    return Ok(FindPlan::text_scan(
                        filter.clone(),
                        descriptor.clone(),
                        conjunct.clone(),
                    ));
                }
            }
        }

        for conjunct in &conjuncts {
            let (Some(field_name), Some(range)) = (conjunct.field_name(), conjunct.index_range())
            else {
                continue;
            };

            if field_name == DOC_ID {
                if range.type_rank() == Value::Id(ObjectId::MIN).type_rank() {
                    log::debug!("Planning _id range scan of {} for {}", collection_name, conjunct);
                    let descriptor = IndexDescriptor::id_index(collection_name);
                    return Ok(FindPlan::index_scan(filter.clone(), descriptor, range));
                }
                continue;
            }

            let leading = indexes.iter().find(|descriptor| {
                !descriptor.is_text() && descriptor.index_fields().first_field() == Some(field_name)
            });
            if let Some(descriptor) = leading {
                log::debug!("Planning index scan of {} for {}", descriptor, conjunct);
                return Ok(FindPlan::index_scan(
                    filter.clone(),
                    descriptor.clone(),
                    range,
                ));
            }
        }

        log::debug!("Planning collection scan of {} for {}", collection_name, filter);
        Ok(FindPlan::collection_scan(filter.clone()))
    }
}

fn text_index_of<'a>(text: &TextFilter, indexes: &'a [IndexDescriptor]) -> Option<&'a IndexDescriptor> {
    let field_name = text.bound_field()?;
    indexes.iter().find(|descriptor| {
        descriptor.is_text() && descriptor.index_fields().first_field() == Some(field_name)
    })
}

/// Binds every text search of the tree, wherever it sits, to the text
/// index of the collection and checks that its field carries one.
fn bind_text_filters(
    collection_name: &str,
    filter: &Filter,
    indexes: &[IndexDescriptor],
) -> LiteDocResult<Filter> {
    let text_field = indexes
        .iter()
        .find(|descriptor| descriptor.is_text())
        .and_then(|descriptor| descriptor.index_fields().first_field());
    let filter = match text_field {
        Some(field_name) => filter.bind_text(field_name),
        None => filter.clone(),
    };

    let mut result = Ok(());
    filter.walk(&mut |node| {
        let Some(text) = node.downcast_ref::<TextFilter>() else {
            return;
        };
        if result.is_err() {
            return;
        }

        if text_index_of(text, indexes).is_none() {
            let field = text.bound_field().unwrap_or("$text");
            log::error!(
                "Text search {} needs a text index on {} in collection {}",
                text,
                field,
                collection_name
            );
            result = Err(LiteDocError::new(
                &format!(
                    "Text search requires a text index on field {} of collection {}",
                    field, collection_name
                ),
                ErrorKind::IndexMissing,
            ));
        }
    });
    result.map(|_| filter)
}
