use crate::collection::Document;
use crate::common::{Value, DOC_ID};
use crate::errors::{ErrorKind, LiteDocError, LiteDocResult};

#[derive(Clone, Debug, PartialEq)]
enum ProjectionMode {
    Include(Vec<String>),
    Exclude(Vec<String>),
}

/// A field mask applied to query results.
///
/// `{title: 1, "user.name": 1}` keeps `_id` and the named fields;
/// `{body: 0}` drops the named fields. `_id: 0` may be combined with either
/// style; since `Document::put` only accepts ids under `_id`, build that
/// entry with `Document::put_raw`. Any other mix of `1` and `0` fails with
/// [ErrorKind::InvalidProjection].
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    mode: ProjectionMode,
    include_id: bool,
}

impl Projection {
    pub fn parse(projection: &Document) -> LiteDocResult<Projection> {
        let mut included = Vec::new();
        let mut excluded = Vec::new();
        let mut include_id = true;

        for (path, value) in projection.leaf_entries() {
            let include = match value {
                Value::Bool(b) => b,
                Value::I64(_) | Value::F64(_) => value.as_f64().is_some_and(|n| n != 0.0),
                other => {
                    log::error!("Invalid projection value {} for field {}", other, path);
                    return Err(LiteDocError::new(
                        &format!(
                            "Invalid projection value {} for field {}, expected 1 or 0",
                            other, path
                        ),
                        ErrorKind::InvalidProjection,
                    ));
                }
            };

            if path == DOC_ID {
                include_id = include;
            } else if include {
                included.push(path);
            } else {
                excluded.push(path);
            }
        }

        if !included.is_empty() && !excluded.is_empty() {
            log::error!(
                "Projection cannot mix inclusion of {:?} with exclusion of {:?}",
                included,
                excluded
            );
            return Err(LiteDocError::new(
                &format!(
                    "Projection cannot mix inclusion of {:?} with exclusion of {:?}",
                    included, excluded
                ),
                ErrorKind::InvalidProjection,
            ));
        }

        let mode = if included.is_empty() {
            ProjectionMode::Exclude(excluded)
        } else {
            ProjectionMode::Include(included)
        };
        Ok(Projection { mode, include_id })
    }

    pub fn apply(&self, document: Document) -> LiteDocResult<Document> {
        match &self.mode {
            ProjectionMode::Include(paths) => {
                let mut projected = Document::new();
                if self.include_id {
                    if let Some(id) = document.id() {
                        projected.put(DOC_ID, id)?;
                    }
                }
                for path in paths {
                    if let Some(value) = document.get(path) {
                        projected.put(path, value)?;
                    }
                }
                Ok(projected)
            }
            ProjectionMode::Exclude(paths) => {
                let mut projected = document;
                for path in paths {
                    projected.remove(path);
                }
                if !self.include_id {
                    projected.remove(DOC_ID);
                }
                Ok(projected)
            }
        }
    }
}
