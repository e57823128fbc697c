//! Fluent construction of a [Database].

use crate::database::Database;
use crate::database_config::DatabaseConfig;
use crate::errors::{LiteDocError, LiteDocResult};

/// Builds a [Database]. The first invalid setting is kept and reported by
/// [DatabaseBuilder::open].
///
/// ```rust
/// use litedoc::Database;
///
/// let db = Database::builder()
///     .auto_create_collections(false)
///     .open()
///     .unwrap();
/// assert!(db.collection("posts").is_err());
/// ```
#[derive(Default)]
pub struct DatabaseBuilder {
    error: Option<LiteDocError>,
    config: DatabaseConfig,
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        DatabaseBuilder {
            error: None,
            config: DatabaseConfig::new(),
        }
    }

    pub fn field_separator(mut self, field_separator: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_field_separator(field_separator) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn auto_create_collections(mut self, auto_create: bool) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_auto_create_collections(auto_create) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn open(self) -> LiteDocResult<Database> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let database = Database::new(self.config);
        database.initialize()?;
        Ok(database)
    }
}
