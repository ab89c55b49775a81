//! Named JSON datasets with flatten-by-depth indexing.
//!
//! # Design
//! - **Explicit walk, not reflection**: flattening and key collection are
//!   recursive matches over `serde_json::Value` variants. Arrays pass
//!   through whole; objects descend; scalars contribute nothing.
//! - **Key-restricted flattening**: a target key collects only arrays
//!   stored under that key, but still descends through non-matching
//!   object values, so matches at any depth are found.
//! - **Typed index strategies**: a mapped index is built from an
//!   enumerated [`IndexStrategy`] rather than an open-ended definition
//!   object, so malformed definitions are unrepresentable and the
//!   remaining failure modes (missing dataset, non-indexable dataset)
//!   get their own error variants.

use std::collections::HashMap;

use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::error::{LibraryError, LoadError};
use crate::lazy::{ContentLoader, LoadedContent};

/// Collect the elements of every array reachable from `value`.
///
/// With `key` set, only arrays stored directly under that object key are
/// collected; other object entries are still descended through unless
/// they are arrays themselves. Scalars yield nothing.
pub fn flatten(value: &Value, key: Option<&str>) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Object(map) => {
            let mut out = Vec::new();
            for (k, child) in map {
                let selected = key.map_or(true, |wanted| k == wanted);
                match child {
                    Value::Array(items) if selected => out.extend(items.iter().cloned()),
                    Value::Array(_) => {}
                    other => out.extend(flatten(other, key)),
                }
            }
            out
        }
        _ => Vec::new(),
    }
}

/// Object keys reachable within `depth` levels, parents before their
/// children. Arrays are opaque; a depth of zero yields nothing.
pub fn collect_keys(value: &Value, depth: usize) -> Vec<String> {
    let Value::Object(map) = value else {
        return Vec::new();
    };
    if depth == 0 {
        return Vec::new();
    }
    let mut out = Vec::new();
    for (key, child) in map {
        out.push(key.clone());
        out.extend(collect_keys(child, depth - 1));
    }
    out
}

/// A JSON value with lazily computed flattened views.
#[derive(Debug)]
pub struct Shelf {
    data: Value,
    keys: Vec<String>,
    any: OnceCell<Vec<Value>>,
}

impl Shelf {
    pub fn new(data: Value) -> Self {
        Self::with_index_depth(data, 2)
    }

    /// Wrap `data`, pre-collecting the object keys usable with
    /// [`index`](Self::index) down to `depth` levels.
    pub fn with_index_depth(data: Value, depth: usize) -> Self {
        let keys = collect_keys(&data, depth);
        Shelf {
            data,
            keys,
            any: OnceCell::new(),
        }
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Keys collected at construction time.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Every array element reachable anywhere in the data, cached after
    /// the first call.
    pub fn any(&self) -> &[Value] {
        self.any.get_or_init(|| flatten(&self.data, None))
    }

    /// Array elements reachable under `key`. When the key names a
    /// top-level entry its subtree is flattened wholesale; otherwise the
    /// whole tree is walked with the key as a filter.
    pub fn index(&self, key: &str) -> Vec<Value> {
        match self.data.get(key) {
            Some(subtree) => flatten(subtree, None),
            None => flatten(&self.data, Some(key)),
        }
    }
}

/// How rows of a dataset are keyed for constant-time lookup.
pub enum IndexStrategy {
    /// Key each row by the string value stored under this field.
    ByKey(String),
    /// Key each row by a caller-supplied mapping. Rows mapping to `None`
    /// are skipped.
    ByFn(Box<dyn Fn(&Value) -> Option<String> + Send + Sync>),
}

impl std::fmt::Debug for IndexStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexStrategy::ByKey(key) => f.debug_tuple("ByKey").field(key).finish(),
            IndexStrategy::ByFn(_) => f.write_str("ByFn(..)"),
        }
    }
}

/// Rows keyed by an [`IndexStrategy`]. Later rows win key collisions.
#[derive(Debug, Default)]
pub struct MappedIndex {
    map: HashMap<String, Value>,
}

impl MappedIndex {
    pub fn build(rows: &[Value], strategy: &IndexStrategy) -> Self {
        let mut map = HashMap::new();
        for row in rows {
            let key = match strategy {
                IndexStrategy::ByKey(field) => row
                    .get(field)
                    .and_then(Value::as_str)
                    .map(str::to_owned),
                IndexStrategy::ByFn(mapper) => mapper(row),
            };
            match key {
                Some(key) => {
                    map.insert(key, row.clone());
                }
                None => tracing::warn!(?row, "row has no usable index key, skipping"),
            }
        }
        MappedIndex { map }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Where a dataset's JSON comes from.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// Fetch through a [`ContentLoader`], keyed by URL or path.
    Remote(String),
    /// Use the given value as-is.
    Inline(Value),
}

impl DataSource {
    /// Parse the original definition shape: an object carrying either a
    /// `"file"` or a `"data"` entry.
    pub fn from_definition(def: &Value) -> Result<Self, LoadError> {
        if let Some(file) = def.get("file").and_then(Value::as_str) {
            return Ok(DataSource::Remote(file.to_owned()));
        }
        if let Some(data) = def.get("data") {
            return Ok(DataSource::Inline(data.clone()));
        }
        Err(LoadError::EmptyDefinition)
    }
}

/// What to do with a dataset's value once resolved.
pub enum Transform {
    /// Index into a [`Shelf`] with the given key-collection depth.
    Shelve { depth: usize },
    /// Store the raw value untouched.
    Raw,
    /// Apply a caller-supplied mapping, storing the result raw.
    Map(Box<dyn Fn(Value) -> Value + Send + Sync>),
}

/// A resolved dataset.
#[derive(Debug)]
pub enum Dataset {
    Shelf(Shelf),
    Value(Value),
}

impl Dataset {
    fn rows(&self) -> Option<&[Value]> {
        match self {
            Dataset::Shelf(shelf) => Some(shelf.any()),
            Dataset::Value(Value::Array(items)) => Some(items),
            Dataset::Value(_) => None,
        }
    }
}

/// One dataset slot in a [`Library`] definition.
pub struct DatasetDef {
    pub source: DataSource,
    pub transform: Transform,
}

impl DatasetDef {
    pub fn shelved(source: DataSource) -> Self {
        DatasetDef {
            source,
            transform: Transform::Shelve { depth: 2 },
        }
    }

    pub fn raw(source: DataSource) -> Self {
        DatasetDef {
            source,
            transform: Transform::Raw,
        }
    }
}

/// Named datasets plus mapped indexes over them.
#[derive(Debug, Default)]
pub struct Library {
    datasets: HashMap<String, Dataset>,
    indexes: HashMap<String, MappedIndex>,
}

impl Library {
    /// Resolve every definition (inline or through `loader`) and build
    /// the library. Any single failed source fails the whole load.
    pub async fn load<L>(
        defs: impl IntoIterator<Item = (String, DatasetDef)>,
        loader: &L,
    ) -> Result<Self, LibraryError>
    where
        L: ContentLoader<String>,
    {
        let mut library = Library::default();
        for (name, def) in defs {
            let value = match def.source {
                DataSource::Inline(value) => value,
                DataSource::Remote(url) => {
                    tracing::debug!(dataset = %name, %url, "loading dataset");
                    let raw = loader.fetch(&url).await?;
                    match LoadedContent::classify(raw)? {
                        LoadedContent::Json(value) => value,
                        LoadedContent::Text(text) => serde_json::from_str(&text)
                            .map_err(|err| LoadError::MalformedJson(err.to_string()))?,
                        LoadedContent::Binary(_) => {
                            return Err(LoadError::MalformedJson(format!(
                                "dataset {url} resolved to binary content"
                            ))
                            .into());
                        }
                    }
                }
            };
            let dataset = match def.transform {
                Transform::Shelve { depth } => {
                    Dataset::Shelf(Shelf::with_index_depth(value, depth))
                }
                Transform::Raw => Dataset::Value(value),
                Transform::Map(mapper) => Dataset::Value(mapper(value)),
            };
            library.datasets.insert(name, dataset);
        }
        Ok(library)
    }

    pub fn dataset(&self, name: &str) -> Option<&Dataset> {
        self.datasets.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, dataset: Dataset) {
        self.datasets.insert(name.into(), dataset);
    }

    /// Build a named lookup over the rows of `dataset`. The dataset must
    /// exist and flatten to rows.
    pub fn add_index(
        &mut self,
        dataset: &str,
        name: impl Into<String>,
        strategy: IndexStrategy,
    ) -> Result<(), LibraryError> {
        let rows = self
            .datasets
            .get(dataset)
            .ok_or_else(|| LibraryError::NoSuchDataset(dataset.to_owned()))?
            .rows()
            .ok_or_else(|| LibraryError::NotIndexable(dataset.to_owned()))?;
        self.indexes
            .insert(name.into(), MappedIndex::build(rows, &strategy));
        Ok(())
    }

    /// Constant-time lookup through a previously added index.
    pub fn find(&self, index: &str, key: &str) -> Option<&Value> {
        self.indexes.get(index)?.get(key)
    }
}
