use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::collection::DocumentCollection;
use crate::common::LITEDOC_VERSION;
use crate::database_builder::DatabaseBuilder;
use crate::database_config::DatabaseConfig;
use crate::errors::{ErrorKind, LiteDocError, LiteDocResult};

/// An in-memory database: a named set of [DocumentCollection]s.
///
/// `Database` is a cheap handle; clones share the same collections.
///
/// ```rust
/// use litedoc::Database;
/// use litedoc::doc;
/// use litedoc::filter::field;
///
/// let db = Database::builder().open().unwrap();
/// let posts = db.create_collection("posts").unwrap();
/// posts.insert(doc! { title: "Post One", category: "News" }).unwrap();
///
/// let post = posts.find_one(field("category").eq("News")).unwrap();
/// assert_eq!(post.get("title").unwrap().as_str(), Some("Post One"));
/// db.close().unwrap();
/// ```
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    pub(crate) fn new(config: DatabaseConfig) -> Self {
        Database {
            inner: Arc::new(DatabaseInner::new(config)),
        }
    }

    /// Creates an empty collection. Fails with [ErrorKind::ValidationError]
    /// when `name` is taken.
    pub fn create_collection(&self, name: &str) -> LiteDocResult<DocumentCollection> {
        self.inner.create_collection(name)
    }

    /// The collection named `name`. A missing collection is created when
    /// the configuration allows it and is [ErrorKind::NotFound] otherwise.
    pub fn collection(&self, name: &str) -> LiteDocResult<DocumentCollection> {
        self.inner.collection(name)
    }

    pub fn has_collection(&self, name: &str) -> LiteDocResult<bool> {
        self.inner.check_opened()?;
        Ok(self.inner.collections.contains_key(name))
    }

    /// Collection names in ascending order.
    pub fn list_collection_names(&self) -> LiteDocResult<Vec<String>> {
        self.inner.list_collection_names()
    }

    /// Drops a collection with its documents and indexes. Handles still
    /// held on it fail with [ErrorKind::NotFound] afterwards.
    pub fn drop_collection(&self, name: &str) -> LiteDocResult<()> {
        self.inner.drop_collection(name)
    }

    /// Drops every collection and rejects further use of the database.
    pub fn close(&self) -> LiteDocResult<()> {
        self.inner.close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> DatabaseConfig {
        self.inner.config.clone()
    }

    pub(crate) fn initialize(&self) -> LiteDocResult<()> {
        self.inner.config.initialize()?;
        log::info!("Opened litedoc {} database", LITEDOC_VERSION);
        Ok(())
    }
}

#[cfg(test)]
impl Default for Database {
    fn default() -> Self {
        Database::builder().open().expect("Failed to open database")
    }
}

struct DatabaseInner {
    config: DatabaseConfig,
    collections: DashMap<String, DocumentCollection>,
    closed: AtomicBool,
}

impl DatabaseInner {
    fn new(config: DatabaseConfig) -> Self {
        DatabaseInner {
            config,
            collections: DashMap::new(),
            closed: AtomicBool::from(false),
        }
    }

    fn create_collection(&self, name: &str) -> LiteDocResult<DocumentCollection> {
        self.check_opened()?;
        validate_collection_name(name)?;

        match self.collections.entry(name.to_string()) {
            Entry::Occupied(_) => {
                log::error!("Collection {} already exists", name);
                Err(LiteDocError::new(
                    &format!("Collection {} already exists", name),
                    ErrorKind::ValidationError,
                ))
            }
            Entry::Vacant(entry) => {
                let collection = DocumentCollection::new(name);
                entry.insert(collection.clone());
                log::info!("Created collection {}", name);
                Ok(collection)
            }
        }
    }

    fn collection(&self, name: &str) -> LiteDocResult<DocumentCollection> {
        self.check_opened()?;
        if let Some(collection) = self.collections.get(name) {
            return Ok(collection.clone());
        }

        if !self.config.auto_create_collections() {
            log::error!("Collection {} does not exist", name);
            return Err(LiteDocError::new(
                &format!("Collection {} does not exist", name),
                ErrorKind::NotFound,
            ));
        }

        validate_collection_name(name)?;
        let collection = self
            .collections
            .entry(name.to_string())
            .or_insert_with(|| {
                log::info!("Created collection {}", name);
                DocumentCollection::new(name)
            })
            .clone();
        Ok(collection)
    }

    fn list_collection_names(&self) -> LiteDocResult<Vec<String>> {
        self.check_opened()?;
        let mut names: Vec<String> = self
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        Ok(names)
    }

    fn drop_collection(&self, name: &str) -> LiteDocResult<()> {
        self.check_opened()?;
        match self.collections.remove(name) {
            Some((_, collection)) => {
                collection.dispose();
                Ok(())
            }
            None => {
                log::error!("Cannot drop collection {}, it does not exist", name);
                Err(LiteDocError::new(
                    &format!("Cannot drop collection {}, it does not exist", name),
                    ErrorKind::NotFound,
                ))
            }
        }
    }

    fn close(&self) -> LiteDocResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            log::error!("Database is already closed");
            return Err(LiteDocError::new(
                "Database is already closed",
                ErrorKind::InvalidOperation,
            ));
        }

        let names: Vec<String> = self
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for name in names {
            if let Some((_, collection)) = self.collections.remove(&name) {
                collection.dispose();
            }
        }
        log::info!("Closed database");
        Ok(())
    }

    fn check_opened(&self) -> LiteDocResult<()> {
        if self.closed.load(Ordering::Relaxed) {
            log::error!("Database is closed");
            return Err(LiteDocError::new(
                "Database is closed",
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }
}

fn validate_collection_name(name: &str) -> LiteDocResult<()> {
    if name.is_empty() {
        log::error!("Collection name cannot be empty");
        return Err(LiteDocError::new(
            "Collection name cannot be empty",
            ErrorKind::ValidationError,
        ));
    }

    if name.chars().any(char::is_whitespace) {
        log::error!("Collection name {:?} cannot contain whitespace", name);
        return Err(LiteDocError::new(
            &format!("Collection name {:?} cannot contain whitespace", name),
            ErrorKind::ValidationError,
        ));
    }

    if name.starts_with('$') {
        log::error!("Collection name {} cannot start with $", name);
        return Err(LiteDocError::new(
            &format!("Collection name {} cannot start with $", name),
            ErrorKind::ValidationError,
        ));
    }
    Ok(())
}
