#![allow(clippy::approx_constant)]
//! # litedoc - embedded document-query engine
//!
//! litedoc stores schemaless documents in named collections and answers
//! MongoDB-style queries over them, entirely in memory.
//!
//! ## Key Features
//!
//! - **Documents**: ordered field maps with nested documents and arrays,
//!   addressed through dotted paths (`user.name`)
//! - **Queries**: comparison, membership, regex, array and logical
//!   predicates, built fluently or parsed from query documents
//! - **Indexes**: unique, non-unique, compound and full-text indexes kept
//!   in step with every write
//! - **Cursors**: sort, skip, limit and projection over lazy result streams
//! - **Updates**: `$set`, `$inc`, `$rename`, `$unset`, replacement and upsert
//! - **Concurrency**: handles are `Send + Sync`; writers of the same
//!   document serialize, readers never block
//!
//! ## Quick Start
//!
//! ```rust
//! use litedoc::Database;
//! use litedoc::doc;
//! use litedoc::filter::field;
//! use litedoc::index::unique_index;
//!
//! let db = Database::builder().open().unwrap();
//! let posts = db.collection("posts").unwrap();
//! posts.create_index(vec!["title"], &unique_index()).unwrap();
//!
//! posts.insert(doc! { title: "Post One", category: "News", likes: 4 }).unwrap();
//! posts.insert(doc! { title: "Post Two", category: "Tech", likes: 2 }).unwrap();
//!
//! let news: Vec<_> = posts
//!     .find(field("category").eq("News"))
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(news.len(), 1);
//!
//! let plan = posts.explain(field("title").eq("Post Two")).unwrap();
//! assert_eq!(plan.used_index(), Some("title_1"));
//! ```
//!
//! ## Module Organization
//!
//! - [`collection`] - documents, collections, find/update options and plans
//! - [`common`] - values, sort fields, cursors and shared utilities
//! - [`errors`] - error kinds and result type
//! - [`filter`] - query predicates and the query-document parser
//! - [`index`] - index descriptors, options and indexers
//! - [`store`] - ordered in-memory document storage
//! - [`database`] - the database handle
//! - [`database_builder`] / [`database_config`] - configuration

use crate::collection::id_generator::ObjectIdGenerator;
use crate::common::{atomic, Atomic, DEFAULT_FIELD_SEPARATOR};
use std::sync::LazyLock;

pub mod collection;
pub mod common;
pub mod database;
pub mod database_builder;
pub mod database_config;
pub mod errors;
pub mod filter;
pub mod index;
pub mod store;

pub use database::Database;

pub(crate) static FIELD_SEPARATOR: LazyLock<Atomic<String>> =
    LazyLock::new(|| atomic(DEFAULT_FIELD_SEPARATOR.to_string()));
pub(crate) static ID_GENERATOR: LazyLock<ObjectIdGenerator> =
    LazyLock::new(ObjectIdGenerator::new);

