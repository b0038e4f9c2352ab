use std::collections::HashMap;

use serde_json::Value;
use url::Url;

use super::DocumentLoader;
use crate::error::LoadError;

/// Serves documents from memory.
///
/// Useful to resolve generated trees or to test without touching the disk.
///
/// ```rust
/// use api1st_core::{DocumentLoader, MemoryLoader};
/// use serde_json::json;
/// use url::Url;
///
/// let locator = Url::parse("file:///schemas/point.yaml")?;
/// let loader = MemoryLoader::new().with_document(locator.clone(), json!({"type": "object"}));
///
/// assert!(loader.load(&locator).is_ok());
/// # Ok::<(), url::ParseError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    documents: HashMap<Url, Value>,
}

impl MemoryLoader {
    /// Creates an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tree under a locator. A fragment on the locator is ignored.
    #[must_use]
    pub fn with_document(mut self, locator: Url, tree: Value) -> Self {
        self.insert(locator, tree);
        self
    }

    /// Registers a tree under a locator, replacing any previous one.
    pub fn insert(&mut self, mut locator: Url, tree: Value) {
        locator.set_fragment(None);
        self.documents.insert(locator, tree);
    }
}

impl DocumentLoader for MemoryLoader {
    fn load(&self, locator: &Url) -> Result<Value, LoadError> {
        self.documents
            .get(locator)
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                locator: locator.clone(),
            })
    }
}
