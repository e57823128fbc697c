//! Collections and documents.
//!
//! A [Document] is an ordered map of field names to [crate::common::Value]s.
//! Nested fields are addressed with dotted paths such as `user.name`; the
//! separator is configurable on the database builder.
//!
//! ```rust
//! use litedoc::collection::Document;
//! use litedoc::doc;
//!
//! let mut post = doc! { title: "Post One", user: { name: "John Doe" } };
//! post.put("user.status", "author").unwrap();
//! assert_eq!(post.get("user.name").unwrap().as_str(), Some("John Doe"));
//! ```
//!
//! A [DocumentCollection] stores documents under a unique `_id`, generated
//! when absent, and keeps its indexes in step with every write.

mod document;
mod document_collection;
mod find_options;
mod find_plan;
pub(crate) mod id_generator;
mod object_id;
pub(crate) mod operation;
mod update_options;
mod update_spec;

pub use document::*;
pub use document_collection::*;
pub use find_options::*;
pub use find_plan::*;
pub use object_id::*;
pub use operation::{RemoveResult, UpdateResult, WriteResult};
pub use update_options::*;
pub use update_spec::*;
