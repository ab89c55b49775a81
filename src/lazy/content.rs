//! Classification of raw load results by declared content type.

use crate::error::LoadError;

/// Raw bytes plus the declared content type, as produced by a
/// [`super::ContentLoader`].
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(content_type: impl Into<String>, body: Vec<u8>) -> Self {
        RawResponse {
            content_type: Some(content_type.into()),
            body,
        }
    }

    pub fn untyped(body: Vec<u8>) -> Self {
        RawResponse {
            content_type: None,
            body,
        }
    }
}

/// A resolved load result, classified by its declared content type.
#[derive(Debug)]
pub enum LoadedContent {
    /// Declared JSON and parsed successfully.
    Json(serde_json::Value),
    /// Declared `text/*`, or undeclared.
    Text(String),
    /// Anything else: held behind a revocable handle.
    Binary(Blob),
}

impl LoadedContent {
    /// Classify a raw response. A body declared as JSON that fails to
    /// parse is a load error, not a silent downgrade to text.
    pub fn classify(response: RawResponse) -> Result<Self, LoadError> {
        match response.content_type.as_deref() {
            Some(declared) if declared.contains("json") => {
                let value = serde_json::from_slice(&response.body)
                    .map_err(|e| LoadError::MalformedJson(e.to_string()))?;
                Ok(LoadedContent::Json(value))
            }
            Some(declared) if declared.starts_with("text/") => Ok(LoadedContent::Text(
                String::from_utf8_lossy(&response.body).into_owned(),
            )),
            None => Ok(LoadedContent::Text(
                String::from_utf8_lossy(&response.body).into_owned(),
            )),
            Some(declared) => Ok(LoadedContent::Binary(Blob::new(
                declared.to_string(),
                response.body,
            ))),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            LoadedContent::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            LoadedContent::Json(v) => Some(v),
            _ => None,
        }
    }
}

/// Owned binary payload behind a revocable handle.
///
/// Releasing frees the backing allocation; dropping releases implicitly,
/// so cache eviction and dataset replacement cannot leak the payload.
#[derive(Debug)]
pub struct Blob {
    content_type: String,
    bytes: Vec<u8>,
    /// Payload size as loaded. Survives release, so a released blob stays
    /// distinguishable from an empty one.
    len: usize,
    released: bool,
}

impl Blob {
    pub fn new(content_type: String, bytes: Vec<u8>) -> Self {
        let len = bytes.len();
        Blob {
            content_type,
            bytes,
            len,
            released: false,
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Payload bytes, or `None` once released.
    pub fn bytes(&self) -> Option<&[u8]> {
        if self.released {
            None
        } else {
            Some(&self.bytes)
        }
    }

    /// Size of the payload as loaded, even after release.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Free the backing allocation. Idempotent.
    pub fn release(&mut self) {
        if !self.released {
            tracing::trace!(
                content_type = %self.content_type,
                bytes = self.len,
                "releasing binary payload"
            );
            self.bytes = Vec::new();
            self.released = true;
        }
    }
}

impl Drop for Blob {
    fn drop(&mut self) {
        self.release();
    }
}
