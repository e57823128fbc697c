//! Configuration of a [crate::database::Database].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::common::{atomic, Atomic, ReadExecutor, WriteExecutor, DEFAULT_FIELD_SEPARATOR};
use crate::errors::{ErrorKind, LiteDocError, LiteDocResult};
use crate::FIELD_SEPARATOR;

/// Settings of a database, fixed once the database is opened.
///
/// * `field_separator` splits dotted paths such as `user.name`. It is
///   process-wide: opening a database installs its separator for every
///   document of the process.
/// * `auto_create_collections` lets [crate::database::Database::collection]
///   create a missing collection instead of failing with
///   [ErrorKind::NotFound].
#[derive(Clone)]
pub struct DatabaseConfig {
    inner: Arc<DatabaseConfigInner>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseConfig {
    pub fn new() -> Self {
        DatabaseConfig {
            inner: Arc::new(DatabaseConfigInner::new()),
        }
    }

    pub fn field_separator(&self) -> String {
        self.inner.field_separator()
    }

    pub fn set_field_separator(&self, separator: &str) -> LiteDocResult<()> {
        self.inner.set_field_separator(separator)
    }

    pub fn auto_create_collections(&self) -> bool {
        self.inner.auto_create_collections()
    }

    pub fn set_auto_create_collections(&self, auto_create: bool) -> LiteDocResult<()> {
        self.inner.set_auto_create_collections(auto_create)
    }

    pub fn is_configured(&self) -> bool {
        self.inner.configured.load(Ordering::Relaxed)
    }

    pub(crate) fn initialize(&self) -> LiteDocResult<()> {
        self.inner.initialize()
    }
}

struct DatabaseConfigInner {
    configured: AtomicBool,
    field_separator: Atomic<String>,
    auto_create_collections: AtomicBool,
}

impl DatabaseConfigInner {
    fn new() -> Self {
        DatabaseConfigInner {
            configured: AtomicBool::from(false),
            field_separator: atomic(DEFAULT_FIELD_SEPARATOR.to_string()),
            auto_create_collections: AtomicBool::from(true),
        }
    }

    fn check_not_configured(&self, setting: &str) -> LiteDocResult<()> {
        if self.configured.load(Ordering::Relaxed) {
            log::error!("{} cannot be changed after initialization", setting);
            return Err(LiteDocError::new(
                &format!("{} cannot be changed after initialization", setting),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }

    fn field_separator(&self) -> String {
        self.field_separator.read_with(|it| it.clone())
    }

    fn set_field_separator(&self, separator: &str) -> LiteDocResult<()> {
        self.check_not_configured("Field separator")?;

        if separator.is_empty() {
            log::error!("Field separator cannot be empty");
            return Err(LiteDocError::new(
                "Field separator cannot be empty",
                ErrorKind::ValidationError,
            ));
        }

        self.field_separator
            .write_with(|it| *it = separator.to_string());
        Ok(())
    }

    fn auto_create_collections(&self) -> bool {
        self.auto_create_collections.load(Ordering::Relaxed)
    }

    fn set_auto_create_collections(&self, auto_create: bool) -> LiteDocResult<()> {
        self.check_not_configured("Collection auto creation")?;
        self.auto_create_collections
            .store(auto_create, Ordering::Relaxed);
        Ok(())
    }

    fn initialize(&self) -> LiteDocResult<()> {
        if self.configured.swap(true, Ordering::SeqCst) {
            log::error!("Database configuration is already initialized");
            return Err(LiteDocError::new(
                "Database configuration is already initialized",
                ErrorKind::InvalidOperation,
            ));
        }

        let separator = self.field_separator();
        FIELD_SEPARATOR.write_with(|it| {
            if *it != separator {
                log::info!("Field separator changed from {:?} to {:?}", it, separator);
                *it = separator;
            }
        });
        Ok(())
    }
}
