use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Categories of errors raised by the engine.
///
/// The first six kinds form the public error taxonomy of the command
/// surface. The remaining kinds cover argument validation and internal
/// failures.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// A document id or a collection is absent.
    NotFound,
    /// A unique constraint was violated on insert, update or index backfill.
    DuplicateKey,
    /// An operator was applied to a value of an incompatible type.
    TypeMismatch,
    /// A projection mixed inclusion and exclusion styles.
    InvalidProjection,
    /// An operator requires an index that does not exist.
    IndexMissing,
    /// A predicate tree is malformed.
    InvalidFilter,

    /// An update document is malformed.
    InvalidUpdate,
    /// The operation is not permitted, e.g. changing `_id`.
    InvalidOperation,
    /// A value used as an identifier is not a valid object id.
    InvalidId,
    /// An argument failed validation.
    ValidationError,
    /// Index registration or maintenance failed.
    IndexingError,
    /// Fallback for unexpected failures.
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::DuplicateKey => write!(f, "Duplicate key"),
            ErrorKind::TypeMismatch => write!(f, "Type mismatch"),
            ErrorKind::InvalidProjection => write!(f, "Invalid projection"),
            ErrorKind::IndexMissing => write!(f, "Index missing"),
            ErrorKind::InvalidFilter => write!(f, "Invalid filter"),
            ErrorKind::InvalidUpdate => write!(f, "Invalid update"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::IndexingError => write!(f, "Indexing error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// The error type returned by every fallible operation of the engine.
///
/// A `LiteDocError` carries a human readable message naming the collection
/// and field involved, an [ErrorKind] for programmatic matching, an optional
/// cause and the backtrace captured at creation time.
///
/// # Examples
///
/// ```ignore
/// match collection.find_one(field("title").eq("missing")) {
///     Err(e) if e.kind() == &ErrorKind::NotFound => { /* handle */ }
///     other => { /* ... */ }
/// }
/// ```
#[derive(Clone)]
pub struct LiteDocError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<LiteDocError>>,
    backtrace: Atomic<Backtrace>,
}

impl LiteDocError {
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        LiteDocError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: LiteDocError) -> Self {
        LiteDocError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&LiteDocError> {
        self.cause.as_deref()
    }
}

impl Display for LiteDocError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for LiteDocError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for LiteDocError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

pub type LiteDocResult<T> = Result<T, LiteDocError>;

impl From<std::fmt::Error> for LiteDocError {
    fn from(err: std::fmt::Error) -> Self {
        LiteDocError::new(
            &format!("Formatting error: {}", err),
            ErrorKind::InternalError,
        )
    }
}

impl From<std::num::ParseIntError> for LiteDocError {
    fn from(err: std::num::ParseIntError) -> Self {
        LiteDocError::new(
            &format!("Integer parsing error: {}", err),
            ErrorKind::InvalidId,
        )
    }
}

impl From<regex::Error> for LiteDocError {
    fn from(err: regex::Error) -> Self {
        LiteDocError::new(
            &format!("Invalid regular expression: {}", err),
            ErrorKind::InvalidFilter,
        )
    }
}

impl From<String> for LiteDocError {
    fn from(msg: String) -> Self {
        LiteDocError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for LiteDocError {
    fn from(msg: &str) -> Self {
        LiteDocError::new(msg, ErrorKind::InternalError)
    }
}
