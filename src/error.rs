//! Error taxonomies for the widget cores.
//!
//! Lexer and pager misuse are contract violations: fatal to the instance,
//! never recovered in place. Load failures are operational and recoverable
//! per record. Schema failures name the first mismatch and propagate.

use thiserror::Error;

/// Fatal internal-consistency failures of a lexer instance.
///
/// These indicate a bug in the transition logic, not bad input; the caller
/// should discard the lexer and create a new one.
#[derive(Debug, Error)]
pub enum LexError {
    /// Buffered text survived a flush. Should never occur when the
    /// transition table is total.
    #[error("lexer buffer not drained after flush: {leftover:?} left in {mode}")]
    BufferNotDrained { mode: &'static str, leftover: String },
}

/// Per-record failures of the lazy-load controller.
#[derive(Debug, Error, Clone)]
pub enum LoadError {
    #[error("request for {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("declared JSON but body failed to parse: {0}")]
    MalformedJson(String),

    #[error("definition contains no data or file")]
    EmptyDefinition,

    #[error("load was cancelled before completion")]
    Cancelled,
}

/// Failures building or querying a [`crate::library::Library`].
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("cannot add mapped index: {0}")]
    BadIndexDefinition(String),

    #[error("cannot add mapped index: dataset {0:?} doesn't exist")]
    NoSuchDataset(String),

    #[error("cannot add mapped index: dataset {0:?} is not indexable")]
    NotIndexable(String),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Schema definition and validation failures.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("schema validation failed: {0}")]
    Mismatch(String),
}
