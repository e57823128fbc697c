//! Query filters.
//!
//! Filters are trees of [FilterProvider] nodes behind the cloneable
//! [Filter] handle. They can be built fluently or parsed from a query
//! document:
//!
//! ```rust
//! use litedoc::doc;
//! use litedoc::filter::{field, parse_filter};
//!
//! let fluent = field("views").gt(3).and(field("category").eq("News"));
//! let parsed = parse_filter(&doc! { views: { "$gt": 3 }, category: "News" }).unwrap();
//! ```
//!
//! Supported predicates: `eq`, `ne`, `gt`, `gte`, `lt`, `lte`, `in`, `nin`,
//! `exists`, `regex`, `elem_match`, `text`, combined with `and`, `or`,
//! `nor` and `not`.

mod basic_filters;
mod filter;
mod fluent;
mod logical_filters;
mod pattern_filters;
mod query_parser;
mod range_filters;
mod text_filter;

pub(crate) use basic_filters::*;
pub use filter::*;
pub use fluent::*;
pub(crate) use logical_filters::*;
pub(crate) use pattern_filters::*;
pub use query_parser::*;
pub(crate) use range_filters::*;
pub(crate) use text_filter::*;
