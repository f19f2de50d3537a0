//! # javadoc-parser
//!
//! Resolve human-typed queries like `String.indexOf` or `Map.Entry#getKey`
//! against a published Javadoc site.
//!
//! ## Overview
//!
//! A [`Javadoc`] session is opened against one documentation root (an "all
//! classes" index or tree page). The first query builds a session-lived
//! catalog of every class-like page; after that, class pages and member
//! fragments are fetched lazily and memoized by location, so repeating a
//! query never refetches.
//!
//! Queries are case-insensitive, accept `#` as a member separator, tolerate
//! hidden control characters and a trailing dot, and walk nested and
//! inherited declarations: `Outer.Inner.field` resolves whether `Inner` is
//! declared on `Outer` directly or inherited from an ancestor.
//!
//! ## Example
//!
//! ```ignore
//! use javadoc_parser::Javadoc;
//!
//! let docs = Javadoc::new("https://docs.oracle.com/javase/8/docs/api/allclasses-noframe.html")?;
//!
//! // Everything matching a dotted query, classes and members alike
//! for entry in docs.search("ArrayList.indexOf")? {
//!     println!("{} -> {}", entry.name(), entry.location());
//! }
//!
//! // Direct retrieval when the target kind is known
//! let class = docs.retrieve_class("ArrayList")?;
//! println!("{}", class.description);
//!
//! let method = docs.retrieve_method("ArrayList", "indexOf")?;
//! println!("{}", method.description);
//! ```
//!
//! ## Complexity
//!
//! | Operation | Cost |
//! |-----------|------|
//! | first query | catalog fetch + one fetch per touched page |
//! | repeated query | memoized, no fetches |
//! | `search(query)` | O(catalog) matching + fetches for new pages |

mod catalog;
mod entity;
mod error;
mod fetch;
mod query;
mod resolver;
mod store;

pub use catalog::{Catalog, CatalogEntry};
pub use entity::{ClassKind, ClassRecord, DetailTag, MemberKind, MemberRecord};
pub use error::Error;
pub use fetch::{DocFetcher, FetchConfig, HttpFetcher, RawClassPage, RawMemberFragment};
pub use resolver::{Entry, Javadoc};
