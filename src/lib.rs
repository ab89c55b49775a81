//! Framework-free widget engine cores.
//!
//! Three independent pieces, usable separately:
//!
//! - [`highlight`]: single-pass lexical highlighters ([`highlight::SimpleLexer`]
//!   for quote-delimited text, [`highlight::CssLexer`] for CSS-like syntax)
//!   emitting classified tokens to a caller-supplied sink.
//! - [`page`]: [`page::PagedView`] over an in-memory collection with named
//!   AND-composed filters, clamped paging, and in-place sorting.
//! - [`lazy`]: [`lazy::LazyLoader`], an async per-record load controller
//!   where the latest request per key wins, with preload and an LRU
//!   result cache.
//!
//! [`library`] and [`schema`] support data-driven callers: named JSON
//! datasets with flatten-by-depth indexing, and a small JSON schema
//! validator used for config files.

pub mod config;
pub mod error;
pub mod highlight;
pub mod lazy;
pub mod library;
pub mod page;
pub mod schema;
